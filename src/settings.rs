use serde::{Deserialize, Serialize};

use crate::config;

/// One branch of the sonar tone mapping (closing vs opening).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ToneBranch {
    pub max_distance: f32,
    pub volume: f32,
    pub base_pitch: f32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SonarSettings {
    pub closing: ToneBranch,
    pub opening: ToneBranch,
    pub solid_distance: f32,
    pub solid_base_pitch: f32,
    pub solid_pitch_range: f32,
    pub pitch_mod_enabled: bool,
    pub pitch_mod_range: f32,
    pub master_volume: f32,
    pub smoothing_tau: f32,
}

impl Default for SonarSettings {
    fn default() -> Self {
        Self {
            closing: ToneBranch {
                max_distance: config::SONAR_CLOSING_MAX_DISTANCE,
                volume: config::SONAR_CLOSING_VOLUME,
                base_pitch: config::SONAR_CLOSING_PITCH,
            },
            opening: ToneBranch {
                max_distance: config::SONAR_OPENING_MAX_DISTANCE,
                volume: config::SONAR_OPENING_VOLUME,
                base_pitch: config::SONAR_OPENING_PITCH,
            },
            solid_distance: config::SONAR_SOLID_DISTANCE,
            solid_base_pitch: config::SONAR_SOLID_PITCH,
            solid_pitch_range: config::SONAR_SOLID_PITCH_RANGE,
            pitch_mod_enabled: true,
            pitch_mod_range: config::SONAR_PITCH_MOD_RANGE,
            master_volume: config::SONAR_MASTER_VOLUME,
            smoothing_tau: config::SONAR_SMOOTHING_TAU,
        }
    }
}

/// Runtime-tunable parameters, adjustable from the settings panel.
/// The core systems only ever read these.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub move_torque: f32,
    pub jump_impulse: f32,
    pub air_control: f32,
    pub brake_factor: f32,
    pub enemy_base_speed: f32,
    pub ai_tick_interval: f32,
    pub vision_range: f32,
    pub camera_stiffness: f32,
    pub sonar: SonarSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            move_torque: config::MOVE_TORQUE,
            jump_impulse: config::JUMP_IMPULSE,
            air_control: config::AIR_CONTROL,
            brake_factor: config::BRAKE_FACTOR,
            enemy_base_speed: config::ENEMY_BASE_SPEED,
            ai_tick_interval: config::AI_TICK_INTERVAL,
            vision_range: config::VISION_RANGE,
            camera_stiffness: config::CAMERA_STIFFNESS,
            sonar: SonarSettings::default(),
        }
    }
}
