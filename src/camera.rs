use macroquad::prelude::*;

use crate::config;

/// Exponential smoothing factor, frame-rate independent, scaled up with
/// speed so a fast ball does not leave the camera visibly behind.
fn smoothing_alpha(stiffness: f32, dt: f32, speed: f32) -> f32 {
    let base = 1.0 - (-stiffness * dt).exp();
    let boost = 1.0 + config::ALPHA_SPEED_BOOST * (speed / config::ALPHA_SPEED_REF).min(1.0);
    (base * boost).min(1.0)
}

/// Shift the raw physics position half a frame along the velocity, so the
/// render (which happens between physics steps) does not trail the body.
fn predicted_position(position: Vec3, velocity: Vec3, dt: f32) -> Vec3 {
    if velocity.length() > config::PREDICT_MIN_SPEED {
        position + velocity * (dt * 0.5)
    } else {
        position
    }
}

/// Third-person chase camera, decoupled from the physics transform.
pub struct ChaseCamera {
    pub smooth_target: Vec3,
    pub position: Vec3,
}

impl ChaseCamera {
    fn offset() -> Vec3 {
        vec3(0.0, config::CAMERA_OFFSET_UP, config::CAMERA_OFFSET_BACK)
    }

    pub fn new(target: Vec3) -> Self {
        Self {
            smooth_target: target,
            position: target + Self::offset(),
        }
    }

    pub fn update(&mut self, raw_pos: Vec3, raw_vel: Vec3, dt: f32, stiffness: f32) {
        // Tighter ceiling than the physics hitch clamp, for camera stability.
        let dt = dt.min(config::CAMERA_DT_CEILING);
        let speed = raw_vel.length();
        let predicted = predicted_position(raw_pos, raw_vel, dt);
        let alpha = smoothing_alpha(stiffness, dt, speed);

        // The look-target chases at double rate, the camera body at single.
        self.smooth_target = self.smooth_target.lerp(predicted, (alpha * 2.0).min(1.0));
        let desired = self.smooth_target + Self::offset();
        self.position = self.position.lerp(desired, alpha);
    }

    /// Jump the rig to a respawn point so the lerp does not sweep the
    /// camera across the whole map.
    pub fn snap_to(&mut self, target: Vec3) {
        self.smooth_target = target;
        self.position = target + Self::offset();
    }

    pub fn to_macroquad_camera(&self) -> Camera3D {
        Camera3D {
            position: self.position,
            target: self.smooth_target,
            up: vec3(0.0, 1.0, 0.0),
            ..Default::default()
        }
    }
}

/// Rendered transform for a body, smoothed independently of the camera and
/// tighter than it (triple rate) so the ball itself never feels floaty.
pub struct SmoothedVisual {
    pub position: Vec3,
    pub rotation: Quat,
}

impl SmoothedVisual {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn update(&mut self, raw_pos: Vec3, raw_vel: Vec3, raw_rot: Quat, dt: f32, stiffness: f32) {
        let dt = dt.min(config::CAMERA_DT_CEILING);
        let predicted = predicted_position(raw_pos, raw_vel, dt);
        let alpha = smoothing_alpha(stiffness, dt, raw_vel.length());
        self.position = self.position.lerp(predicted, (alpha * 3.0).min(1.0));
        self.rotation = self.rotation.slerp(raw_rot, alpha);
    }

    pub fn snap_to(&mut self, position: Vec3) {
        self.position = position;
    }
}
