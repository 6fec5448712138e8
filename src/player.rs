use macroquad::prelude::*;
use rapier3d::prelude::RigidBodyHandle;

use crate::config;
use crate::motion::HitchGuard;
use crate::particles::ParticleSystem;
use crate::perception;
use crate::physics::PhysicsWorld;
use crate::settings::Settings;

/// Held-key snapshot for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl KeyState {
    /// Sample the live keyboard.
    pub fn poll() -> Self {
        Self {
            forward: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            back: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            jump: is_key_down(KeyCode::Space),
        }
    }

    pub fn any_direction(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}

/// Torque the ball should receive this frame for the held keys.
///
/// Reversing against an existing spin gets a boost so the ball brakes and
/// turns instead of plowing through; with nothing held on the ground, a
/// counter-torque stops it faster than damping alone would.
pub fn drive_torque(keys: KeyState, angular: Vec3, grounded: bool, settings: &Settings) -> Vec3 {
    let mut torque = vec3(
        (keys.back as i8 - keys.forward as i8) as f32,
        0.0,
        (keys.left as i8 - keys.right as i8) as f32,
    ) * settings.move_torque;

    if keys.any_direction() {
        let spin = angular.length();
        if spin > config::REVERSAL_MIN_SPIN && torque.length_squared() > 1e-6 {
            let alignment = torque.normalize().dot(angular / spin);
            if alignment < config::REVERSAL_DOT_THRESHOLD {
                let t = (config::REVERSAL_DOT_THRESHOLD - alignment)
                    / (config::REVERSAL_DOT_THRESHOLD + 1.0);
                let boost = config::REVERSAL_BOOST_MIN
                    + (config::REVERSAL_BOOST_MAX - config::REVERSAL_BOOST_MIN) * t;
                torque *= boost;
            }
        }
    } else if grounded {
        torque = -angular * settings.brake_factor;
    }

    if !grounded {
        torque *= settings.air_control;
    }

    torque
}

pub struct PlayerController {
    pub body: RigidBodyHandle,
    spawn: Vec3,
    hitch: HitchGuard,
    jump_cooldown: f32,
    pub grounded: bool,
}

impl PlayerController {
    pub fn new(body: RigidBodyHandle, spawn: Vec3) -> Self {
        Self {
            body,
            spawn,
            hitch: HitchGuard::new(),
            jump_cooldown: 0.0,
            grounded: false,
        }
    }

    pub fn update(
        &mut self,
        keys: KeyState,
        physics: &mut PhysicsWorld,
        particles: &mut ParticleSystem,
        settings: &Settings,
        raw_dt: f32,
    ) {
        let Some(position) = physics.position(self.body) else {
            return;
        };
        let Some(velocity) = physics.velocity(self.body) else {
            return;
        };
        let Some(angular) = physics.angular_velocity(self.body) else {
            return;
        };

        let (dt, restore) = self.hitch.filter(raw_dt, velocity);
        if let Some(v) = restore {
            physics.set_velocity(self.body, v);
        }

        if position.y < config::WORLD_FLOOR_Y {
            physics.teleport(self.body, self.spawn);
            self.jump_cooldown = 0.0;
            return;
        }

        self.grounded = perception::grounded(physics, self.body, position);
        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);

        let torque = drive_torque(keys, angular, self.grounded, settings);
        physics.set_torque(self.body, torque);

        if keys.jump && self.grounded && self.jump_cooldown <= 0.0 {
            physics.apply_impulse(self.body, vec3(0.0, settings.jump_impulse, 0.0));
            particles.emit_jump(position);
            self.jump_cooldown = config::JUMP_COOLDOWN;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::na::DMatrix;

    fn keys(forward: bool, back: bool, left: bool, right: bool) -> KeyState {
        KeyState {
            forward,
            back,
            left,
            right,
            jump: false,
        }
    }

    #[test]
    fn idle_grounded_spin_gets_an_opposing_brake_torque() {
        let settings = Settings::default();
        let angular = vec3(4.0, 0.0, 1.5);
        let torque = drive_torque(KeyState::default(), angular, true, &settings);
        assert!(torque.length() > 0.0);
        assert!(torque.dot(angular) < 0.0);
    }

    #[test]
    fn idle_airborne_applies_no_brake() {
        let settings = Settings::default();
        let torque = drive_torque(KeyState::default(), vec3(4.0, 0.0, 0.0), false, &settings);
        assert_eq!(torque, Vec3::ZERO);
    }

    #[test]
    fn reversal_against_spin_boosts_torque() {
        let settings = Settings::default();
        // Rolling hard one way, commanding the opposite.
        let angular = vec3(5.0, 0.0, 0.0);
        let plain = drive_torque(keys(true, false, false, false), Vec3::ZERO, true, &settings);
        let boosted = drive_torque(keys(true, false, false, false), angular, true, &settings);
        let ratio = boosted.length() / plain.length();
        assert!(ratio >= config::REVERSAL_BOOST_MIN - 1e-3);
        assert!(ratio <= config::REVERSAL_BOOST_MAX + 1e-3);
    }

    #[test]
    fn aligned_spin_gets_no_boost() {
        let settings = Settings::default();
        let angular = vec3(-5.0, 0.0, 0.0);
        let plain = drive_torque(keys(true, false, false, false), Vec3::ZERO, true, &settings);
        let same = drive_torque(keys(true, false, false, false), angular, true, &settings);
        assert!((plain.length() - same.length()).abs() < 1e-4);
    }

    #[test]
    fn airborne_torque_is_scaled_by_air_control() {
        let settings = Settings::default();
        let grounded = drive_torque(keys(true, false, false, false), Vec3::ZERO, true, &settings);
        let airborne = drive_torque(keys(true, false, false, false), Vec3::ZERO, false, &settings);
        assert!((airborne.length() - grounded.length() * settings.air_control).abs() < 1e-4);
    }

    #[test]
    fn jump_requires_ground_and_respects_cooldown() {
        let mut physics = PhysicsWorld::new();
        let heights = DMatrix::from_element(2, 2, 0.0);
        physics.add_heightfield(heights, vec3(40.0, 1.0, 40.0));
        let body = physics.spawn_ball(vec3(0.0, config::BALL_RADIUS, 0.0));
        let mut player = PlayerController::new(body, vec3(0.0, 1.0, 0.0));
        let mut particles = ParticleSystem::new();
        let settings = Settings::default();

        // Settle onto the ground.
        for _ in 0..30 {
            physics.step(1.0 / 60.0);
        }

        let jump = KeyState {
            jump: true,
            ..KeyState::default()
        };
        player.update(jump, &mut physics, &mut particles, &settings, 1.0 / 60.0);
        assert!(player.grounded);
        let vy = physics.velocity(body).unwrap().y;
        assert!(vy > 0.0);

        // Immediately holding jump again must not add a second impulse.
        player.update(jump, &mut physics, &mut particles, &settings, 1.0 / 60.0);
        let vy_after = physics.velocity(body).unwrap().y;
        assert!(vy_after <= vy + 1e-3);
    }

    #[test]
    fn falling_through_the_floor_respawns_at_the_spawn_point() {
        let mut physics = PhysicsWorld::new();
        let body = physics.spawn_ball(vec3(0.0, config::WORLD_FLOOR_Y - 5.0, 0.0));
        let spawn = vec3(2.0, 3.0, 4.0);
        let mut player = PlayerController::new(body, spawn);
        let mut particles = ParticleSystem::new();
        let settings = Settings::default();

        player.update(
            KeyState::default(),
            &mut physics,
            &mut particles,
            &settings,
            1.0 / 60.0,
        );
        assert!(physics.position(body).unwrap().distance(spawn) < 1e-4);
        assert!(physics.velocity(body).unwrap().length() < 1e-5);
    }
}
