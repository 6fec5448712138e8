use macroquad::prelude::*;
use ::rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::audio::{self, AudioEngine};
use crate::camera::{ChaseCamera, SmoothedVisual};
use crate::config;
use crate::enemy::EnemyController;
use crate::particles::ParticleSystem;
use crate::perception::PerceptionRegistry;
use crate::physics::PhysicsWorld;
use crate::player::{KeyState, PlayerController};
use crate::pursuit::PursuitState;
use crate::settings::Settings;
use crate::sonar::Sonar;
use crate::terrain::Terrain;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Countdown,
    Playing,
    Paused,
    GameOver,
}

/// Published per-frame state of one tracked body. Written exactly once per
/// frame by the game loop; everything else reads it.
#[derive(Clone, Copy, Debug, Default)]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Low-rate snapshot for UI consumers (~5 Hz).
pub struct Telemetry {
    pub ai_state: &'static str,
    pub player_position: Vec3,
    pub enemy_position: Vec3,
    pub closing_speed: f32,
    accumulator: f32,
}

impl Telemetry {
    fn new() -> Self {
        Self {
            ai_state: PursuitState::Idle.label(),
            player_position: Vec3::ZERO,
            enemy_position: Vec3::ZERO,
            closing_speed: 0.0,
            accumulator: f32::MAX,
        }
    }
}

pub struct Game {
    pub physics: PhysicsWorld,
    pub registry: PerceptionRegistry,
    pub terrain: Terrain,
    pub player: PlayerController,
    pub enemy: EnemyController,
    pub player_state: BodyState,
    pub enemy_state: BodyState,
    pub camera: ChaseCamera,
    pub player_visual: SmoothedVisual,
    pub enemy_visual: SmoothedVisual,
    pub sonar: Sonar,
    pub audio: AudioEngine,
    pub particles: ParticleSystem,
    pub settings: Settings,
    pub telemetry: Telemetry,
    pub phase: GamePhase,
    pub closing_speed: f32,
    countdown: f32,
    next_beep_at: f32,
    prev_distance: f32,
    prev_ai_state: PursuitState,
    rng: ChaCha8Rng,
    player_spawn: Vec3,
    enemy_spawn: Vec3,
}

impl Game {
    pub fn new(seed: u64, settings: Settings, audio: AudioEngine) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let terrain = Terrain::generate(seed as u32, &mut rng);
        let mut physics = PhysicsWorld::new();
        let mut registry = PerceptionRegistry::new();
        terrain.install(&mut physics, &mut registry);

        let player_spawn = terrain.player_spawn();
        let enemy_spawn = terrain.enemy_spawn();
        let player_body = physics.spawn_ball(player_spawn);
        let enemy_body = physics.spawn_ball(enemy_spawn);

        Self {
            physics,
            registry,
            terrain,
            player: PlayerController::new(player_body, player_spawn),
            enemy: EnemyController::new(enemy_body, enemy_spawn),
            player_state: BodyState {
                position: player_spawn,
                velocity: Vec3::ZERO,
            },
            enemy_state: BodyState {
                position: enemy_spawn,
                velocity: Vec3::ZERO,
            },
            camera: ChaseCamera::new(player_spawn),
            player_visual: SmoothedVisual::new(player_spawn),
            enemy_visual: SmoothedVisual::new(enemy_spawn),
            sonar: Sonar::new(),
            audio,
            particles: ParticleSystem::new(),
            settings,
            telemetry: Telemetry::new(),
            phase: GamePhase::Countdown,
            closing_speed: 0.0,
            countdown: config::COUNTDOWN_SECONDS,
            next_beep_at: config::COUNTDOWN_SECONDS,
            prev_distance: player_spawn.distance(enemy_spawn),
            prev_ai_state: PursuitState::Idle,
            rng,
            player_spawn,
            enemy_spawn,
        }
    }

    /// One iteration of the frame loop. Fixed order: state ingestion, AI,
    /// motion, physics step, smoothing, audio, telemetry.
    pub fn update(&mut self, keys: KeyState, raw_dt: f32) {
        match self.phase {
            GamePhase::Countdown => self.update_countdown(raw_dt),
            GamePhase::Playing => self.update_playing(keys, raw_dt),
            // Paused and game-over frames leave all state untouched so a
            // resume needs no re-initialization.
            GamePhase::Paused | GamePhase::GameOver => {}
        }
    }

    fn update_countdown(&mut self, raw_dt: f32) {
        self.countdown -= raw_dt;
        if self.countdown <= self.next_beep_at && self.next_beep_at > 0.0 {
            self.audio.play(audio::countdown_beep());
            self.next_beep_at -= 1.0;
        }
        // Let the rig settle on the spawn point while the count runs.
        self.camera.update(
            self.player_state.position,
            Vec3::ZERO,
            raw_dt,
            self.settings.camera_stiffness,
        );
        if self.countdown <= 0.0 {
            self.phase = GamePhase::Playing;
            self.audio.play(audio::go_signal());
            self.sonar.start(&self.audio);
            eprintln!("[QUARRY] run started");
        }
    }

    fn update_playing(&mut self, keys: KeyState, raw_dt: f32) {
        // Ingest streamed physics state into the published slots.
        let (Some(player_pos), Some(player_vel)) = (
            self.physics.position(self.player.body),
            self.physics.velocity(self.player.body),
        ) else {
            return;
        };
        let (Some(enemy_pos), Some(enemy_vel)) = (
            self.physics.position(self.enemy.body),
            self.physics.velocity(self.enemy.body),
        ) else {
            return;
        };
        self.player_state = BodyState {
            position: player_pos,
            velocity: player_vel,
        };
        self.enemy_state = BodyState {
            position: enemy_pos,
            velocity: enemy_vel,
        };

        // A fall below the floor will teleport this frame; snap the camera
        // with it so the lerp does not sweep across the whole map.
        if player_pos.y < config::WORLD_FLOOR_Y {
            self.camera.snap_to(self.player_spawn);
            self.player_visual.snap_to(self.player_spawn);
        }

        self.player.update(
            keys,
            &mut self.physics,
            &mut self.particles,
            &self.settings,
            raw_dt,
        );
        self.enemy.update(
            &mut self.physics,
            self.player_state.position,
            self.player_state.velocity,
            &self.settings,
            raw_dt,
            &mut self.rng,
        );

        // Transition cues layered over the continuous tone.
        if self.enemy.ai.state != self.prev_ai_state {
            match self.enemy.ai.state {
                PursuitState::Alert => self.audio.play(audio::alert_chirp()),
                PursuitState::Search => self.audio.play(audio::lost_contact()),
                _ => {}
            }
            self.prev_ai_state = self.enemy.ai.state;
        }

        let dt = raw_dt.min(config::FRAME_DT_CEILING);
        self.physics.step(dt);

        // Camera and rendered transforms, decoupled from the physics tick.
        let rotation = self
            .physics
            .rotation(self.player.body)
            .unwrap_or(Quat::IDENTITY);
        self.camera.update(
            self.player_state.position,
            self.player_state.velocity,
            raw_dt,
            self.settings.camera_stiffness,
        );
        self.player_visual.update(
            self.player_state.position,
            self.player_state.velocity,
            rotation,
            raw_dt,
            self.settings.camera_stiffness,
        );
        let enemy_rotation = self
            .physics
            .rotation(self.enemy.body)
            .unwrap_or(Quat::IDENTITY);
        self.enemy_visual.update(
            self.enemy_state.position,
            self.enemy_state.velocity,
            enemy_rotation,
            raw_dt,
            self.settings.camera_stiffness,
        );

        // Distance and closing speed feed the sonar. Positive = approaching.
        let distance = match (
            self.physics.position(self.player.body),
            self.physics.position(self.enemy.body),
        ) {
            (Some(p), Some(e)) => p.distance(e),
            _ => self.prev_distance,
        };
        self.closing_speed = (self.prev_distance - distance) / dt.max(1e-6);
        self.prev_distance = distance;
        self.sonar
            .update(distance, self.closing_speed, &self.settings.sonar, &self.audio);

        self.particles.update(dt);

        if distance < config::CONTACT_DISTANCE {
            self.phase = GamePhase::GameOver;
            self.sonar.stop(&self.audio);
            self.audio.play(audio::contact_bonk());
            self.particles
                .emit_contact((self.player_state.position + self.enemy_state.position) * 0.5);
            eprintln!("[QUARRY] caught at distance {distance:.2}");
        }

        // Throttled UI snapshot.
        self.telemetry.accumulator = if self.telemetry.accumulator == f32::MAX {
            config::UI_REPORT_INTERVAL
        } else {
            self.telemetry.accumulator + dt
        };
        if self.telemetry.accumulator >= config::UI_REPORT_INTERVAL {
            self.telemetry.accumulator = 0.0;
            self.telemetry.ai_state = self.enemy.ai.state.label();
            self.telemetry.player_position = self.player_state.position;
            self.telemetry.enemy_position = self.enemy_state.position;
            self.telemetry.closing_speed = self.closing_speed;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Playing => {
                self.phase = GamePhase::Paused;
                self.sonar.stop(&self.audio);
            }
            GamePhase::Paused => {
                self.phase = GamePhase::Playing;
                self.sonar.start(&self.audio);
            }
            GamePhase::Countdown | GamePhase::GameOver => {}
        }
    }

    /// Reset both bodies and the pursuer's mind; terrain stays.
    pub fn restart(&mut self) {
        self.physics.teleport(self.player.body, self.player_spawn);
        self.physics.teleport(self.enemy.body, self.enemy_spawn);
        self.player = PlayerController::new(self.player.body, self.player_spawn);
        self.enemy = EnemyController::new(self.enemy.body, self.enemy_spawn);
        self.camera.snap_to(self.player_spawn);
        self.player_visual.snap_to(self.player_spawn);
        self.enemy_visual.snap_to(self.enemy_spawn);
        self.sonar.stop(&self.audio);
        self.phase = GamePhase::Countdown;
        self.countdown = config::COUNTDOWN_SECONDS;
        self.next_beep_at = config::COUNTDOWN_SECONDS;
        self.prev_distance = self.player_spawn.distance(self.enemy_spawn);
        self.closing_speed = 0.0;
        self.prev_ai_state = PursuitState::Idle;
        self.telemetry = Telemetry::new();
        eprintln!("[QUARRY] restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_game() -> Game {
        let mut game = Game::new(11, Settings::default(), AudioEngine::disabled());
        let mut guard = 0;
        while game.phase == GamePhase::Countdown {
            game.update(KeyState::default(), 0.1);
            guard += 1;
            assert!(guard < 100, "countdown never finished");
        }
        game
    }

    #[test]
    fn countdown_ends_in_playing_with_the_sonar_running() {
        let game = playing_game();
        assert_eq!(game.phase, GamePhase::Playing);
        assert!(game.sonar.is_active());
    }

    #[test]
    fn pausing_freezes_bodies_and_silences_the_sonar() {
        let mut game = playing_game();
        game.physics.set_velocity(game.player.body, vec3(5.0, 0.0, 0.0));
        game.toggle_pause();
        assert_eq!(game.phase, GamePhase::Paused);
        assert!(!game.sonar.is_active());

        let before = game.physics.position(game.player.body).unwrap();
        for _ in 0..30 {
            game.update(KeyState::default(), 1.0 / 60.0);
        }
        let after = game.physics.position(game.player.body).unwrap();
        assert_eq!(before, after);

        game.toggle_pause();
        assert_eq!(game.phase, GamePhase::Playing);
        assert!(game.sonar.is_active());
    }

    #[test]
    fn contact_distance_ends_the_run() {
        let mut game = playing_game();
        let player_pos = game.physics.position(game.player.body).unwrap();
        game.physics
            .teleport(game.enemy.body, player_pos + vec3(0.9, 0.0, 0.0));
        game.update(KeyState::default(), 1.0 / 60.0);
        assert_eq!(game.phase, GamePhase::GameOver);
        assert!(!game.sonar.is_active());
    }

    #[test]
    fn closing_speed_is_positive_while_the_gap_shrinks() {
        let mut game = playing_game();
        game.update(KeyState::default(), 1.0 / 60.0);
        let player_pos = game.physics.position(game.player.body).unwrap();
        let enemy_pos = game.physics.position(game.enemy.body).unwrap();
        let toward = (player_pos - enemy_pos).normalize();
        game.physics
            .teleport(game.enemy.body, enemy_pos + toward * 3.0);
        game.update(KeyState::default(), 1.0 / 60.0);
        assert!(game.closing_speed > 0.0);
    }

    #[test]
    fn restart_returns_to_countdown_at_full_separation() {
        let mut game = playing_game();
        game.physics
            .teleport(game.enemy.body, game.physics.position(game.player.body).unwrap());
        game.update(KeyState::default(), 1.0 / 60.0);
        assert_eq!(game.phase, GamePhase::GameOver);

        game.restart();
        assert_eq!(game.phase, GamePhase::Countdown);
        let player = game.physics.position(game.player.body).unwrap();
        let enemy = game.physics.position(game.enemy.body).unwrap();
        assert!(player.distance(enemy) > config::CONTACT_DISTANCE * 10.0);
        assert_eq!(game.enemy.ai.state, PursuitState::Idle);
    }

    #[test]
    fn telemetry_refreshes_on_its_own_cadence() {
        let mut game = playing_game();
        game.update(KeyState::default(), 1.0 / 60.0);
        let first = game.telemetry.player_position;
        // Within one report interval nothing changes.
        game.update(KeyState::default(), 0.01);
        assert_eq!(game.telemetry.player_position, first);
        // After the interval has elapsed, the snapshot moves.
        for _ in 0..30 {
            game.update(KeyState::default(), 0.016);
        }
        assert!(game.telemetry.ai_state == "idle" || game.telemetry.ai_state == "search");
    }
}
