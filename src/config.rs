// All tunable game constants in one place.

// Terrain
pub const TERRAIN_SIZE: f32 = 120.0;
pub const TERRAIN_CELLS: usize = 32;
pub const TERRAIN_HEIGHT: f32 = 5.0;
pub const TERRAIN_NOISE_SCALE: f64 = 0.035;
pub const OBSTACLE_COUNT: usize = 22;
pub const OBSTACLE_MIN_HALF: f32 = 0.8;
pub const OBSTACLE_MAX_HALF: f32 = 2.2;
pub const OBSTACLE_HEIGHT: f32 = 4.0;

// Bodies
pub const BALL_RADIUS: f32 = 0.5;
pub const BALL_DENSITY: f32 = 1.0;
pub const LINEAR_DAMPING: f32 = 0.2;
pub const ANGULAR_DAMPING: f32 = 0.5;
pub const WORLD_FLOOR_Y: f32 = -20.0;
pub const SPAWN_CLEARANCE: f32 = 1.5;
pub const START_SEPARATION: f32 = 45.0;

// Frame timing
pub const FRAME_DT_CEILING: f32 = 0.05; // 20 FPS floor for physics math
pub const CAMERA_DT_CEILING: f32 = 1.0 / 30.0;

// Player movement
pub const MOVE_TORQUE: f32 = 14.0;
pub const JUMP_IMPULSE: f32 = 6.5;
pub const JUMP_COOLDOWN: f32 = 0.5;
pub const AIR_CONTROL: f32 = 0.3;
pub const BRAKE_FACTOR: f32 = 2.0;
pub const GROUND_PROBE_RANGE: f32 = 1.2;
pub const REVERSAL_DOT_THRESHOLD: f32 = -0.3;
pub const REVERSAL_MIN_SPIN: f32 = 2.0;
pub const REVERSAL_BOOST_MIN: f32 = 2.0;
pub const REVERSAL_BOOST_MAX: f32 = 5.0;

// Enemy movement
pub const ENEMY_BASE_SPEED: f32 = 11.0;
pub const ENEMY_SOFT_CAP_SQ: f32 = 25.0;
pub const ENEMY_SOFT_CAP_DAMP: f32 = 0.95;
pub const AVOIDANCE_RANGE: f32 = 3.0;
pub const AVOIDANCE_ANGLE: f32 = std::f32::consts::PI / 3.0; // 60 degrees
pub const AVOIDANCE_WEIGHT: f32 = 1.5;
pub const OVERSHOOT_DOT_THRESHOLD: f32 = 0.3;
pub const OVERSHOOT_MIN_SPEED: f32 = 2.0;
pub const OVERSHOOT_BRAKE_FACTOR: f32 = 0.6;
pub const CONTACT_DISTANCE: f32 = 1.1;

// Pursuit AI
pub const VISION_RANGE: f32 = 25.0;
pub const AI_TICK_INTERVAL: f32 = 0.15;
pub const ALERT_DWELL: f32 = 0.5;
pub const SEARCH_DURATION: f32 = 5.0;
pub const WAYPOINT_REACH: f32 = 2.0;
pub const SEARCH_RADIUS: f32 = 15.0;
pub const LEAD_DISTANCE_MAX: f32 = 15.0;
pub const CHASE_LEAD_RATE: f32 = 10.0;
pub const CHASE_LEAD_CAP: f32 = 1.2;

// Camera
pub const CAMERA_STIFFNESS: f32 = 6.0;
pub const CAMERA_OFFSET_BACK: f32 = 9.0;
pub const CAMERA_OFFSET_UP: f32 = 5.5;
pub const PREDICT_MIN_SPEED: f32 = 0.5;
pub const ALPHA_SPEED_REF: f32 = 10.0;
pub const ALPHA_SPEED_BOOST: f32 = 0.5;

// Sonar defaults
pub const SONAR_CLOSING_MAX_DISTANCE: f32 = 40.0;
pub const SONAR_CLOSING_VOLUME: f32 = 0.8;
pub const SONAR_CLOSING_PITCH: f32 = 220.0;
pub const SONAR_OPENING_MAX_DISTANCE: f32 = 28.0;
pub const SONAR_OPENING_VOLUME: f32 = 0.45;
pub const SONAR_OPENING_PITCH: f32 = 150.0;
pub const SONAR_SOLID_DISTANCE: f32 = 4.0;
pub const SONAR_SOLID_PITCH: f32 = 520.0;
pub const SONAR_SOLID_PITCH_RANGE: f32 = 380.0;
pub const SONAR_PITCH_MOD_RANGE: f32 = 160.0;
pub const SONAR_MASTER_VOLUME: f32 = 0.6;
pub const SONAR_SMOOTHING_TAU: f32 = 0.02;

// Telemetry
pub const UI_REPORT_INTERVAL: f32 = 0.2; // ~5 Hz

// Game flow
pub const COUNTDOWN_SECONDS: f32 = 3.0;
