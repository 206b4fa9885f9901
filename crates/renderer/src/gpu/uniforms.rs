use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use showconfig::LensTuning;

/// std140 layout mirrored by `shaders/lens.wgsl`.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct LensUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub _pad0: f32,
    pub pointer: [f32; 2],
    pub ripple_radius: f32,
    pub ripple_strength: f32,
    pub noise_amplitude: f32,
    pub warp_amplitude: f32,
    pub aberration: f32,
    pub _pad1: f32,
}

unsafe impl Zeroable for LensUniforms {}
unsafe impl Pod for LensUniforms {}

impl LensUniforms {
    pub fn new(width: u32, height: u32, tuning: &LensTuning) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            time: 0.0,
            _pad0: 0.0,
            pointer: [0.5, 0.5],
            ripple_radius: tuning.ripple_radius,
            ripple_strength: tuning.ripple_strength,
            noise_amplitude: tuning.noise_amplitude,
            warp_amplitude: tuning.warp_amplitude,
            aberration: tuning.aberration,
            _pad1: 0.0,
        }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = [width as f32, height as f32];
    }

    /// Pointer arrives in [-1, 1]; the shader wants texture space.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = [x * 0.5 + 0.5, 0.5 - y * 0.5];
    }
}

/// std140 layout mirrored by `shaders/stars.wgsl`. View and projection
/// stay separate because the billboard expansion happens in view space.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct StarUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub time: f32,
    pub point_size: f32,
    pub _pad: [f32; 2],
}

unsafe impl Zeroable for StarUniforms {}
unsafe impl Pod for StarUniforms {}

impl StarUniforms {
    pub fn new(view: Mat4, proj: Mat4, time: f32, point_size: f32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            time,
            point_size,
            _pad: [0.0; 2],
        }
    }
}

/// std140 layout mirrored by `shaders/panel.wgsl`.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct PanelUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

unsafe impl Zeroable for PanelUniforms {}
unsafe impl Pod for PanelUniforms {}

impl PanelUniforms {
    pub fn new(view_proj: Mat4, model: Mat4, opacity: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            tint: [1.0, 1.0, 1.0, opacity],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lens_uniforms_match_the_wgsl_block_size() {
        assert_eq!(std::mem::size_of::<LensUniforms>(), 48);
    }

    #[test]
    fn star_uniforms_match_the_wgsl_block_size() {
        assert_eq!(std::mem::size_of::<StarUniforms>(), 144);
    }

    #[test]
    fn pointer_maps_into_texture_space() {
        let mut uniforms = LensUniforms::new(800, 600, &LensTuning::default());
        uniforms.set_pointer(-1.0, -1.0);
        assert_eq!(uniforms.pointer, [0.0, 1.0]);
        uniforms.set_pointer(1.0, 1.0);
        assert_eq!(uniforms.pointer, [1.0, 0.0]);
        uniforms.set_pointer(0.0, 0.0);
        assert_eq!(uniforms.pointer, [0.5, 0.5]);
    }
}
