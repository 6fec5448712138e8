use macroquad::prelude::*;

use crate::config;

/// Clamps frame deltas for physics math and repairs velocity after a hitch.
///
/// A frame whose raw elapsed time exceeds the ceiling is a hitch: the physics
/// engine's velocity read right after one is not trustworthy, so the last
/// horizontal velocity captured on a stable frame is restored instead. The
/// vertical component is left to gravity.
pub struct HitchGuard {
    last_good: Option<Vec3>,
}

impl HitchGuard {
    pub fn new() -> Self {
        Self { last_good: None }
    }

    /// Returns the clamped dt and, on a hitch frame, the velocity to restore.
    pub fn filter(&mut self, raw_dt: f32, velocity: Vec3) -> (f32, Option<Vec3>) {
        if raw_dt > config::FRAME_DT_CEILING {
            let restored = self.last_good.map(|good| vec3(good.x, velocity.y, good.z));
            (config::FRAME_DT_CEILING, restored)
        } else {
            self.last_good = Some(velocity);
            (raw_dt, None)
        }
    }
}

/// Rotate `v` around the world Y axis.
pub fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    vec3(v.x * c + v.z * s, v.y, -v.x * s + v.z * c)
}

/// Drop the vertical component and normalize, or `None` when degenerate.
pub fn horizontal_dir(v: Vec3) -> Option<Vec3> {
    let flat = vec3(v.x, 0.0, v.z);
    if flat.length_squared() < 1e-6 {
        None
    } else {
        Some(flat.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_frames_pass_dt_through_and_record_velocity() {
        let mut guard = HitchGuard::new();
        let (dt, restore) = guard.filter(0.016, vec3(3.0, -1.0, 2.0));
        assert_eq!(dt, 0.016);
        assert!(restore.is_none());
    }

    #[test]
    fn hitch_frame_clamps_dt_and_restores_horizontal_velocity() {
        let mut guard = HitchGuard::new();
        guard.filter(0.016, vec3(3.0, -1.0, 2.0));

        let (dt, restore) = guard.filter(0.2, vec3(40.0, -5.0, -40.0));
        assert_eq!(dt, config::FRAME_DT_CEILING);
        let restored = restore.expect("hitch should restore velocity");
        assert_eq!(restored.x, 3.0);
        assert_eq!(restored.z, 2.0);
        // Vertical stays whatever gravity made it.
        assert_eq!(restored.y, -5.0);
    }

    #[test]
    fn hitch_with_no_prior_stable_frame_restores_nothing() {
        let mut guard = HitchGuard::new();
        let (dt, restore) = guard.filter(0.5, vec3(1.0, 1.0, 1.0));
        assert_eq!(dt, config::FRAME_DT_CEILING);
        assert!(restore.is_none());
    }

    #[test]
    fn rotate_y_turns_a_quarter_circle() {
        let rotated = rotate_y(vec3(1.0, 0.5, 0.0), std::f32::consts::FRAC_PI_2);
        assert!((rotated - vec3(0.0, 0.5, -1.0)).length() < 1e-5);
    }

    #[test]
    fn horizontal_dir_rejects_pure_vertical_motion() {
        assert!(horizontal_dir(vec3(0.0, 9.0, 0.0)).is_none());
        let dir = horizontal_dir(vec3(3.0, 9.0, 4.0)).unwrap();
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert_eq!(dir.y, 0.0);
    }
}
