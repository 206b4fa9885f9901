use std::path::Path;

use crate::MediaError;

/// One decoded RGBA frame.
#[derive(Debug, Clone)]
pub struct MediaFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A fully decoded looping stream.
#[derive(Debug, Clone)]
pub struct DecodedStream {
    pub frames: Vec<MediaFrame>,
    pub fps: f32,
}

impl DecodedStream {
    pub fn duration_secs(&self) -> f32 {
        self.frames.len() as f32 / self.fps.max(f32::EPSILON)
    }

    /// Frame index for a playback position, wrapping at the loop point.
    pub fn frame_at(&self, position_secs: f32) -> usize {
        if self.frames.is_empty() {
            return 0;
        }
        let index = (position_secs.max(0.0) * self.fps) as usize;
        index % self.frames.len()
    }
}

/// Decodes a directory of still frames, sorted by file name, into a loop.
/// Every frame must share the dimensions of the first.
pub fn decode_sequence(id: &str, dir: &Path, fps: f32) -> Result<DecodedStream, MediaError> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| MediaError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    let mut expected: Option<(u32, u32)> = None;
    for path in paths {
        let decoded = image::open(&path).map_err(|err| MediaError::Decode {
            path: path.clone(),
            message: err.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let dims = rgba.dimensions();
        match expected {
            None => expected = Some(dims),
            Some(first) if first != dims => {
                return Err(MediaError::Decode {
                    path,
                    message: format!(
                        "frame size {}x{} differs from first frame {}x{}",
                        dims.0, dims.1, first.0, first.1
                    ),
                });
            }
            Some(_) => {}
        }
        frames.push(MediaFrame {
            width: dims.0,
            height: dims.1,
            rgba: rgba.into_raw(),
        });
    }

    if frames.is_empty() {
        return Err(MediaError::Empty(id.to_string()));
    }
    Ok(DecodedStream { frames, fps })
}

const PATTERN_WIDTH: u32 = 256;
const PATTERN_HEIGHT: u32 = 144;
const PATTERN_FRAMES: usize = 48;
const PATTERN_FPS: f32 = 24.0;

/// Procedural fallback stream so a show runs without assets on disk: a slow
/// plasma sweep, visibly animated and loop-safe.
pub fn test_pattern() -> DecodedStream {
    let mut frames = Vec::with_capacity(PATTERN_FRAMES);
    for frame_index in 0..PATTERN_FRAMES {
        let phase = frame_index as f32 / PATTERN_FRAMES as f32 * std::f32::consts::TAU;
        let mut rgba = Vec::with_capacity((PATTERN_WIDTH * PATTERN_HEIGHT * 4) as usize);
        for y in 0..PATTERN_HEIGHT {
            for x in 0..PATTERN_WIDTH {
                let u = x as f32 / PATTERN_WIDTH as f32;
                let v = y as f32 / PATTERN_HEIGHT as f32;
                let wave = ((u * 9.0 + phase).sin() + (v * 7.0 - phase).cos()) * 0.25 + 0.5;
                rgba.push((wave * 150.0 + 40.0) as u8);
                rgba.push((wave * 60.0 + 30.0) as u8);
                rgba.push(((1.0 - wave) * 140.0 + 60.0) as u8);
                rgba.push(255);
            }
        }
        frames.push(MediaFrame {
            width: PATTERN_WIDTH,
            height: PATTERN_HEIGHT,
            rgba,
        });
    }
    DecodedStream {
        frames,
        fps: PATTERN_FPS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_stream_loops_cleanly() {
        let stream = test_pattern();
        assert_eq!(stream.frames.len(), PATTERN_FRAMES);
        assert_eq!(stream.frame_at(0.0), 0);
        assert_eq!(stream.frame_at(stream.duration_secs()), 0);
        assert_eq!(stream.frame_at(stream.duration_secs() * 2.5), PATTERN_FRAMES / 2);
    }

    #[test]
    fn sequence_decoding_rejects_empty_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = decode_sequence("demo", dir.path(), 24.0).unwrap_err();
        assert!(matches!(err, crate::MediaError::Empty(_)));
    }

    #[test]
    fn sequence_decoding_reads_frames_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, shade) in [("b.png", 200u8), ("a.png", 10u8)] {
            let mut img = image::RgbaImage::new(4, 4);
            for pixel in img.pixels_mut() {
                *pixel = image::Rgba([shade, shade, shade, 255]);
            }
            img.save(dir.path().join(name)).expect("write frame");
        }
        let stream = decode_sequence("demo", dir.path(), 24.0).expect("decode");
        assert_eq!(stream.frames.len(), 2);
        assert_eq!(stream.frames[0].rgba[0], 10, "a.png sorts first");
        assert_eq!(stream.frames[1].rgba[0], 200);
    }

    #[test]
    fn sequence_decoding_rejects_mismatched_frame_sizes() {
        let dir = tempfile::tempdir().expect("tempdir");
        image::RgbaImage::new(4, 4)
            .save(dir.path().join("a.png"))
            .unwrap();
        image::RgbaImage::new(8, 8)
            .save(dir.path().join("b.png"))
            .unwrap();
        let err = decode_sequence("demo", dir.path(), 24.0).unwrap_err();
        assert!(matches!(err, crate::MediaError::Decode { .. }));
    }
}
