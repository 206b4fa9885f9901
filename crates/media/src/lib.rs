//! Media registry: looping frame streams shared across panels. One handle
//! per media id; panels referencing the same id share the single decoded
//! stream. Loading happens on background threads that report back over a
//! channel; startup gates on `wait_ready` with a bounded deadline and the
//! show proceeds either way.

mod registry;
mod source;

pub use registry::{MediaRegistry, MediaStatus};
pub use source::{decode_sequence, test_pattern, DecodedStream, MediaFrame};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to read media directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode frame {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("media '{0}' contains no frames")]
    Empty(String),
    #[error("media stream is not ready")]
    NotReady,
    #[error("failed to spawn loader for '{id}': {source}")]
    Spawn {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Lifecycle of one media stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Unloaded,
    Loading,
    Ready,
    Error,
}
