//! CPU mirror of the ripple math in `shaders/lens.wgsl`, used to derive
//! tuning parameters and to pin the falloff contract: the displacement is
//! identically zero at and beyond the ripple radius.

use showconfig::LensTuning;

/// Radial ripple displacement at `dist` shader-space units from the pointer.
pub fn ripple_displacement(tuning: &LensTuning, dist: f32, time: f32) -> f32 {
    if dist >= tuning.ripple_radius {
        return 0.0;
    }
    let falloff = 1.0 - dist / tuning.ripple_radius;
    (dist * 60.0 - time * 4.0).sin() * falloff * falloff * tuning.ripple_strength
}

/// Peak displacement magnitude the current tuning can produce, for sanity
/// logs at startup.
pub fn peak_displacement(tuning: &LensTuning) -> f32 {
    tuning.ripple_strength
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displacement_is_zero_at_and_beyond_the_radius() {
        let tuning = LensTuning::default();
        assert_eq!(ripple_displacement(&tuning, tuning.ripple_radius, 1.0), 0.0);
        assert_eq!(
            ripple_displacement(&tuning, tuning.ripple_radius * 4.0, 1.0),
            0.0
        );
        assert_eq!(ripple_displacement(&tuning, f32::MAX, 0.0), 0.0);
    }

    #[test]
    fn displacement_inside_the_radius_is_bounded_by_strength() {
        let tuning = LensTuning::default();
        for step in 0..100 {
            let dist = tuning.ripple_radius * step as f32 / 100.0;
            let value = ripple_displacement(&tuning, dist, 0.7);
            assert!(value.abs() <= tuning.ripple_strength + f32::EPSILON);
        }
    }

    #[test]
    fn falloff_is_continuous_at_the_boundary() {
        let tuning = LensTuning::default();
        let just_inside = ripple_displacement(&tuning, tuning.ripple_radius - 1e-4, 0.0);
        assert!(just_inside.abs() < 1e-4, "no jump at the cutoff");
    }
}
