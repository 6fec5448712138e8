use macroquad::prelude::*;
use ::rand::Rng;

use crate::config;

/// Behavior mode of the pursuer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PursuitState {
    Idle,
    Alert,
    Chase,
    Search,
}

impl PursuitState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Alert => "alert",
            Self::Chase => "chase",
            Self::Search => "search",
        }
    }

    /// Movement speed scale consumed by the enemy controller.
    pub fn speed_multiplier(self) -> f32 {
        match self {
            Self::Idle => 0.0,
            Self::Alert => 0.1,
            Self::Chase => 1.5,
            Self::Search => 1.2,
        }
    }
}

/// Pursuit state machine. Visibility is decided by the caller (raycast
/// against registered geometry) and passed in, so transitions depend only
/// on the inputs and the internal timers.
#[derive(Clone, Debug, PartialEq)]
pub struct PursuerAi {
    pub state: PursuitState,
    pub state_timer: f32,
    pub last_known_player_pos: Vec3,
    pub search_waypoints: Vec<Vec3>,
    pub waypoint_index: usize,
}

impl PursuerAi {
    pub fn new() -> Self {
        Self {
            state: PursuitState::Idle,
            state_timer: 0.0,
            last_known_player_pos: Vec3::ZERO,
            search_waypoints: Vec::new(),
            waypoint_index: 0,
        }
    }

    fn transition(&mut self, next: PursuitState) {
        self.state = next;
        self.state_timer = 0.0;
    }

    /// Advance the state machine by `dt`. All transitions happen here and
    /// nowhere else.
    pub fn update(
        &mut self,
        visible: bool,
        player_pos: Vec3,
        player_vel: Vec3,
        self_pos: Vec3,
        dt: f32,
        rng: &mut impl Rng,
    ) {
        self.state_timer += dt;

        match self.state {
            PursuitState::Idle => {
                if visible {
                    self.last_known_player_pos = player_pos;
                    self.transition(PursuitState::Alert);
                }
            }
            PursuitState::Alert => {
                if visible {
                    self.last_known_player_pos = player_pos;
                    if self.state_timer >= config::ALERT_DWELL {
                        self.transition(PursuitState::Chase);
                    }
                } else {
                    self.generate_waypoints(player_vel, rng);
                    self.transition(PursuitState::Search);
                }
            }
            PursuitState::Chase => {
                if visible {
                    self.last_known_player_pos = player_pos;
                } else {
                    self.generate_waypoints(player_vel, rng);
                    self.transition(PursuitState::Search);
                }
            }
            PursuitState::Search => {
                if visible {
                    self.last_known_player_pos = player_pos;
                    self.transition(PursuitState::Chase);
                } else {
                    self.advance_waypoint(self_pos);
                    if self.state_timer >= config::SEARCH_DURATION {
                        // Never disengages back to idle: sweep again around the
                        // last sighting with a fresh randomized heading.
                        self.generate_waypoints(player_vel, rng);
                        self.state_timer = 0.0;
                    }
                }
            }
        }
    }

    /// Where the enemy controller should steer, given live player state.
    pub fn movement_target(&self, self_pos: Vec3, player_pos: Vec3, player_vel: Vec3) -> Vec3 {
        match self.state {
            PursuitState::Idle => self_pos,
            PursuitState::Alert => player_pos,
            PursuitState::Chase => {
                let distance = player_pos.distance(self_pos);
                let lead = (distance / config::CHASE_LEAD_RATE).min(config::CHASE_LEAD_CAP);
                player_pos + player_vel * lead
            }
            PursuitState::Search => self
                .search_waypoints
                .get(self.waypoint_index)
                .copied()
                .unwrap_or(self.last_known_player_pos),
        }
    }

    fn advance_waypoint(&mut self, self_pos: Vec3) {
        if self.search_waypoints.is_empty() {
            return;
        }
        let current = self.search_waypoints[self.waypoint_index];
        if self_pos.distance(current) < config::WAYPOINT_REACH {
            self.waypoint_index = (self.waypoint_index + 1) % self.search_waypoints.len();
        }
    }

    /// Build the search sweep: one waypoint projected along the player's
    /// escape direction, then three more circling the last sighting.
    fn generate_waypoints(&mut self, player_vel: Vec3, rng: &mut impl Rng) {
        let speed = player_vel.length();
        let (dir, lead) = if speed < 1.0 {
            // Degenerate escape vector: pick a jittered heading instead.
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            (
                vec3(angle.cos(), 0.0, angle.sin()),
                rng.gen_range(2.0..6.0),
            )
        } else {
            (
                player_vel / speed,
                (speed * 2.0).min(config::LEAD_DISTANCE_MAX),
            )
        };

        let mut waypoints = Vec::with_capacity(4);
        waypoints.push(self.last_known_player_pos + dir * lead);

        let mut angle = rng.gen_range(0.0..std::f32::consts::TAU);
        for _ in 0..3 {
            angle += 2.0 * std::f32::consts::PI / 3.0 + rng.gen_range(-0.35..0.35);
            waypoints.push(
                self.last_known_player_pos
                    + vec3(angle.cos(), 0.0, angle.sin()) * config::SEARCH_RADIUS,
            );
        }

        self.search_waypoints = waypoints;
        self.waypoint_index = 0;
    }
}
