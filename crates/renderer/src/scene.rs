//! Scene layout and camera rig. Panels are laid out once along the travel
//! axis; the camera rig smooths pointer-driven parallax and active-panel
//! tilt every frame.

use carousel::input::PointerState;
use carousel::PanelDescriptor;
use glam::{Mat4, Quat, Vec2, Vec3};
use rand::prelude::*;
use showconfig::Tuning;

const CAMERA_FOV_Y: f32 = 50.0 * std::f32::consts::PI / 180.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;

/// One monolith slab, alive for the whole session. Position along the
/// travel axis is fixed at layout time; only the tilt animates.
#[derive(Debug, Clone)]
pub struct PanelInstance {
    pub index: usize,
    pub media: String,
    pub z: f32,
    /// Slight static orientation so the slabs do not read as billboards.
    pub base_yaw: f32,
    pub base_roll: f32,
}

impl PanelInstance {
    /// Model matrix for this frame. `tilt` is the smoothed pointer tilt and
    /// applies only to the active panel.
    pub fn model_matrix(&self, tuning: &Tuning, tilt: Vec2) -> Mat4 {
        let rotation = Quat::from_euler(
            glam::EulerRot::YXZ,
            self.base_yaw + tilt.x,
            tilt.y,
            self.base_roll,
        );
        let translation = Vec3::new(
            0.0,
            tuning.panel_height * 0.5 + tuning.panel_lift,
            self.z,
        );
        let scale = Vec3::new(tuning.panel_width, tuning.panel_height, 1.0);
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

/// Builds the fixed panel layout: panel `i` sits at `z = -i * spacing`,
/// alternating a small static yaw so the row has depth.
pub fn layout_panels(descriptors: &[PanelDescriptor], tuning: &Tuning) -> Vec<PanelInstance> {
    descriptors
        .iter()
        .map(|descriptor| {
            let sign = if descriptor.index % 2 == 0 { 1.0 } else { -1.0 };
            PanelInstance {
                index: descriptor.index,
                media: descriptor.media.clone(),
                z: -(descriptor.index as f32) * tuning.spacing,
                base_yaw: 0.06 * sign,
                base_roll: 0.015 * sign,
            }
        })
        .collect()
}

/// Scatters the stardust backdrop: a cube of points centred on the origin,
/// each coordinate uniform in `±extent / 2`, spanning the whole corridor.
pub fn scatter_stars(count: usize, extent: f32) -> Vec<[f32; 3]> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            [
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
            ]
        })
        .collect()
}

/// Camera state between frames: the travel-axis position comes straight
/// from the navigation machine, the lateral offset and tilt are smoothed
/// here toward their pointer-driven targets.
pub struct CameraRig {
    offset: Vec2,
    tilt: Vec2,
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            offset: Vec2::ZERO,
            tilt: Vec2::ZERO,
        }
    }

    /// One smoothing step. The blend factor comes from tuning (`smoothing`,
    /// in (0, 1]) and is applied per frame, matching the fixed-step feel of
    /// the original.
    pub fn update(&mut self, pointer: PointerState, tuning: &Tuning) {
        let target_offset = Vec2::new(pointer.x, pointer.y) * tuning.parallax_scale;
        let target_tilt = Vec2::new(-pointer.x, -pointer.y) * tuning.tilt_scale;
        self.offset += (target_offset - self.offset) * tuning.smoothing;
        self.tilt += (target_tilt - self.tilt) * tuning.smoothing;
    }

    pub fn tilt(&self) -> Vec2 {
        self.tilt
    }

    /// View matrix for this frame: eye in front of the travel-axis position
    /// with the smoothed parallax offset, looking at the active panel.
    pub fn view_matrix(&self, camera_z: f32, tuning: &Tuning) -> Mat4 {
        let focus_height = tuning.panel_height * 0.5 + tuning.panel_lift;
        let eye = Vec3::new(
            self.offset.x,
            tuning.camera_height + self.offset.y,
            camera_z + tuning.camera_distance,
        );
        let target = Vec3::new(0.0, focus_height, camera_z);
        Mat4::look_at_rh(eye, target, Vec3::Y)
    }
}

pub fn projection_matrix(width: u32, height: u32) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    Mat4::perspective_rh(CAMERA_FOV_Y, aspect, CAMERA_NEAR, CAMERA_FAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(count: usize) -> Vec<PanelDescriptor> {
        (0..count)
            .map(|index| PanelDescriptor {
                index,
                title: format!("panel {index}"),
                caption: String::new(),
                media: "reel".into(),
            })
            .collect()
    }

    #[test]
    fn panels_sit_at_spacing_multiples() {
        let tuning = Tuning::default();
        let panels = layout_panels(&descriptors(4), &tuning);
        for (index, panel) in panels.iter().enumerate() {
            assert_eq!(panel.z, -(index as f32) * tuning.spacing);
        }
    }

    #[test]
    fn stardust_fills_the_corridor_extent() {
        let stars = scatter_stars(500, 100.0);
        assert_eq!(stars.len(), 500);
        for star in &stars {
            for coordinate in star {
                assert!(coordinate.abs() <= 50.0);
            }
        }
        // A cube this size should not collapse onto a plane.
        assert!(stars.iter().any(|s| s[2] > 10.0));
        assert!(stars.iter().any(|s| s[2] < -10.0));
    }

    #[test]
    fn smoothing_converges_toward_the_pointer_target() {
        let tuning = Tuning::default();
        let mut rig = CameraRig::new();
        let pointer = PointerState { x: 1.0, y: -1.0 };
        for _ in 0..600 {
            rig.update(pointer, &tuning);
        }
        let expected = Vec2::new(-1.0, 1.0) * tuning.tilt_scale;
        assert!((rig.tilt() - expected).length() < 1e-4);
    }

    #[test]
    fn smoothing_moves_a_bounded_fraction_per_frame() {
        let tuning = Tuning::default();
        let mut rig = CameraRig::new();
        rig.update(PointerState { x: 1.0, y: 0.0 }, &tuning);
        let expected_first_step = tuning.parallax_scale * tuning.smoothing;
        assert!((rig.offset.x - expected_first_step).abs() < 1e-6);
    }

    #[test]
    fn view_matrix_keeps_the_eye_in_front_of_the_active_panel() {
        let tuning = Tuning::default();
        let rig = CameraRig::new();
        let view = rig.view_matrix(-50.0, &tuning);
        let eye = view.inverse().transform_point3(Vec3::ZERO);
        assert!((eye.z - (-50.0 + tuning.camera_distance)).abs() < 1e-3);
    }
}
