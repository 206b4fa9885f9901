//! wgpu/winit front end for the monolith carousel: scene layout, camera
//! rig, the liquid-lens and panel pipelines, and the window event loop
//! that owns all mutable core state for the session.

mod gpu;
pub mod lens;
pub mod scene;
mod window;

pub use window::{run, ViewerParams};
