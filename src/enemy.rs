use macroquad::prelude::*;
use ::rand::Rng;
use rapier3d::prelude::RigidBodyHandle;

use crate::config;
use crate::motion::{self, HitchGuard};
use crate::perception::{self, Capability, PerceptionRegistry};
use crate::physics::PhysicsWorld;
use crate::pursuit::{PursuerAi, PursuitState};
use crate::settings::Settings;

/// Combine steering inputs into the force handed to the physics engine.
pub fn steering_force(
    desired: Vec3,
    avoidance: Vec3,
    velocity: Vec3,
    speed_multiplier: f32,
    air_multiplier: f32,
    base_speed: f32,
) -> Vec3 {
    let mut steering = desired + avoidance;

    // Overshoot braking: moving fast while badly misaligned with the
    // desired direction gets a counter-force so the ball can come about.
    let speed = velocity.length();
    if speed > config::OVERSHOOT_MIN_SPEED {
        if let Some(desired_dir) = motion::horizontal_dir(desired) {
            let alignment = (velocity / speed).dot(desired_dir);
            if alignment < config::OVERSHOOT_DOT_THRESHOLD {
                let misalignment = config::OVERSHOOT_DOT_THRESHOLD - alignment;
                steering -=
                    (velocity / speed) * misalignment * speed * config::OVERSHOOT_BRAKE_FACTOR;
            }
        }
    }

    steering * base_speed * speed_multiplier * air_multiplier
}

/// The pursuer: owns the AI state machine and translates its movement
/// target into physics forces every frame. Expensive queries (line of
/// sight, FSM update, avoidance ray) run on a throttled cadence.
pub struct EnemyController {
    pub body: RigidBodyHandle,
    pub ai: PursuerAi,
    spawn: Vec3,
    hitch: HitchGuard,
    ai_accumulator: f32,
    pub visible: bool,
    cached_target: Vec3,
    cached_avoidance: Vec3,
    pub grounded: bool,
}

impl EnemyController {
    pub fn new(body: RigidBodyHandle, spawn: Vec3) -> Self {
        Self {
            body,
            ai: PursuerAi::new(),
            spawn,
            hitch: HitchGuard::new(),
            // First tick fires immediately.
            ai_accumulator: f32::MAX,
            visible: false,
            cached_target: spawn,
            cached_avoidance: Vec3::ZERO,
            grounded: false,
        }
    }

    pub fn update(
        &mut self,
        physics: &mut PhysicsWorld,
        player_pos: Vec3,
        player_vel: Vec3,
        settings: &Settings,
        raw_dt: f32,
        rng: &mut impl Rng,
    ) {
        let Some(position) = physics.position(self.body) else {
            return;
        };
        let Some(velocity) = physics.velocity(self.body) else {
            return;
        };

        let (dt, restore) = self.hitch.filter(raw_dt, velocity);
        if let Some(v) = restore {
            physics.set_velocity(self.body, v);
        }

        if position.y < config::WORLD_FLOOR_Y {
            physics.teleport(self.body, self.spawn);
            return;
        }

        self.grounded = perception::grounded(physics, self.body, position);

        // Throttled AI tick: raycasts and the state machine.
        self.ai_accumulator = if self.ai_accumulator == f32::MAX {
            settings.ai_tick_interval
        } else {
            self.ai_accumulator + dt
        };
        if self.ai_accumulator >= settings.ai_tick_interval {
            let elapsed = self.ai_accumulator.min(1.0);
            self.ai_accumulator = 0.0;

            self.visible = perception::line_of_sight(
                physics,
                position,
                player_pos,
                settings.vision_range,
                Some(self.body),
            );
            self.ai
                .update(self.visible, player_pos, player_vel, position, elapsed, rng);
            self.cached_target = self.ai.movement_target(position, player_pos, player_vel);
            self.cached_avoidance = self.avoidance(physics, position, velocity);
        }

        // Chase and alert re-aim at the live player every frame; search and
        // idle steer at the cached waypoint from the last tick.
        let target = match self.ai.state {
            PursuitState::Chase | PursuitState::Alert => {
                self.ai.movement_target(position, player_pos, player_vel)
            }
            PursuitState::Idle | PursuitState::Search => self.cached_target,
        };

        let desired = motion::horizontal_dir(target - position).unwrap_or(Vec3::ZERO);
        let air_multiplier = if self.grounded {
            1.0
        } else {
            settings.air_control
        };
        let force = steering_force(
            desired,
            self.cached_avoidance,
            velocity,
            self.ai.state.speed_multiplier(),
            air_multiplier,
            settings.enemy_base_speed,
        );
        physics.set_force(self.body, force);

        // Soft cap: bleed horizontal speed rather than clamping hard.
        if velocity.length_squared() > config::ENEMY_SOFT_CAP_SQ {
            physics.set_velocity(
                self.body,
                vec3(
                    velocity.x * config::ENEMY_SOFT_CAP_DAMP,
                    velocity.y,
                    velocity.z * config::ENEMY_SOFT_CAP_DAMP,
                ),
            );
        }
    }

    /// Short-range look-ahead ray; a hit deflects travel by a fixed angle,
    /// weighted by how close the obstruction is.
    fn avoidance(&self, physics: &PhysicsWorld, position: Vec3, velocity: Vec3) -> Vec3 {
        let travel = motion::horizontal_dir(velocity)
            .or_else(|| motion::horizontal_dir(self.cached_target - position));
        let Some(dir) = travel else {
            return Vec3::ZERO;
        };
        match physics.cast_ray(
            position,
            dir,
            config::AVOIDANCE_RANGE,
            Some(self.body),
            PerceptionRegistry::mask(Capability::Obstacle),
        ) {
            Some(hit) => {
                let proximity = 1.0 - hit.distance / config::AVOIDANCE_RANGE;
                motion::rotate_y(dir, config::AVOIDANCE_ANGLE)
                    * config::AVOIDANCE_WEIGHT
                    * proximity
            }
            None => Vec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rapier3d::na::DMatrix;

    fn flat_world() -> PhysicsWorld {
        let mut physics = PhysicsWorld::new();
        let heights = DMatrix::from_element(2, 2, 0.0);
        physics.add_heightfield(heights, vec3(200.0, 1.0, 200.0));
        physics
    }

    fn settle(physics: &mut PhysicsWorld, frames: usize) {
        for _ in 0..frames {
            physics.step(1.0 / 60.0);
        }
    }

    #[test]
    fn distant_player_leaves_the_pursuer_idle_with_no_drive() {
        let mut physics = flat_world();
        let body = physics.spawn_ball(vec3(0.0, config::BALL_RADIUS, 0.0));
        settle(&mut physics, 30);
        let mut enemy = EnemyController::new(body, vec3(0.0, 1.0, 0.0));
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let player_pos = vec3(45.0, config::BALL_RADIUS, 0.0);
        for _ in 0..60 {
            enemy.update(
                &mut physics,
                player_pos,
                Vec3::ZERO,
                &settings,
                1.0 / 60.0,
                &mut rng,
            );
            physics.step(1.0 / 60.0);
        }

        assert_eq!(enemy.ai.state, PursuitState::Idle);
        assert!(!enemy.visible);
        let horizontal = physics.velocity(body).unwrap();
        assert!(vec3(horizontal.x, 0.0, horizontal.z).length() < 0.1);
    }

    #[test]
    fn visible_player_triggers_alert_within_one_ai_tick_then_chase() {
        let mut physics = flat_world();
        let body = physics.spawn_ball(vec3(0.0, config::BALL_RADIUS, 0.0));
        settle(&mut physics, 30);
        let mut enemy = EnemyController::new(body, vec3(0.0, 1.0, 0.0));
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let player_pos = vec3(15.0, config::BALL_RADIUS, 0.0);
        enemy.update(
            &mut physics,
            player_pos,
            Vec3::ZERO,
            &settings,
            1.0 / 60.0,
            &mut rng,
        );
        assert!(enemy.visible);
        assert_eq!(enemy.ai.state, PursuitState::Alert);

        // Hold visibility for the alert dwell.
        let mut elapsed = 0.0;
        while elapsed < config::ALERT_DWELL + 2.0 * settings.ai_tick_interval {
            enemy.update(
                &mut physics,
                player_pos,
                Vec3::ZERO,
                &settings,
                1.0 / 60.0,
                &mut rng,
            );
            physics.step(1.0 / 60.0);
            elapsed += 1.0 / 60.0;
        }
        assert_eq!(enemy.ai.state, PursuitState::Chase);
    }

    #[test]
    fn obstacle_between_blocks_the_sighting() {
        let mut physics = flat_world();
        physics.add_obstacle(vec3(7.0, 2.0, 0.0), vec3(0.5, 2.0, 4.0));
        let body = physics.spawn_ball(vec3(0.0, config::BALL_RADIUS, 0.0));
        settle(&mut physics, 30);
        let mut enemy = EnemyController::new(body, vec3(0.0, 1.0, 0.0));
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        enemy.update(
            &mut physics,
            vec3(15.0, config::BALL_RADIUS, 0.0),
            Vec3::ZERO,
            &settings,
            1.0 / 60.0,
            &mut rng,
        );
        assert!(!enemy.visible);
        assert_eq!(enemy.ai.state, PursuitState::Idle);
    }

    #[test]
    fn excess_speed_is_bled_softly_not_clamped() {
        let mut physics = flat_world();
        let body = physics.spawn_ball(vec3(0.0, config::BALL_RADIUS, 0.0));
        settle(&mut physics, 30);
        let mut enemy = EnemyController::new(body, vec3(0.0, 1.0, 0.0));
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        physics.set_velocity(body, vec3(6.0, 0.0, 0.0));
        enemy.update(
            &mut physics,
            vec3(45.0, config::BALL_RADIUS, 0.0),
            Vec3::ZERO,
            &settings,
            1.0 / 60.0,
            &mut rng,
        );
        let v = physics.velocity(body).unwrap();
        assert!((v.x - 6.0 * config::ENEMY_SOFT_CAP_DAMP).abs() < 1e-3);
    }

    #[test]
    fn misaligned_fast_motion_gets_a_braking_component() {
        // Desired east, moving west, fast.
        let force = steering_force(
            vec3(1.0, 0.0, 0.0),
            Vec3::ZERO,
            vec3(-5.0, 0.0, 0.0),
            1.0,
            1.0,
            1.0,
        );
        // Steering plus brake both point east here.
        let plain = steering_force(
            vec3(1.0, 0.0, 0.0),
            Vec3::ZERO,
            vec3(1.0, 0.0, 0.0),
            1.0,
            1.0,
            1.0,
        );
        assert!(force.x > plain.x);
    }

    #[test]
    fn idle_state_produces_zero_force() {
        let force = steering_force(
            vec3(1.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            PursuitState::Idle.speed_multiplier(),
            1.0,
            10.0,
        );
        assert_eq!(force, Vec3::ZERO);
    }
}
