use macroquad::prelude::*;
use rapier3d::prelude::{ColliderHandle, Group, RigidBodyHandle};

use crate::config;
use crate::physics::{PhysicsWorld, GROUP_GROUND, GROUP_OBSTACLE};

/// Capability tag a static collider registers under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Ground,
    Obstacle,
}

/// Push-based registry of queryable world geometry, populated at collider
/// creation. Raycasts filter candidates through the capability's group mask,
/// so no periodic scene traversal is needed.
#[derive(Default)]
pub struct PerceptionRegistry {
    ground: Vec<ColliderHandle>,
    obstacles: Vec<ColliderHandle>,
}

impl PerceptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Capability, handle: ColliderHandle) {
        match capability {
            Capability::Ground => self.ground.push(handle),
            Capability::Obstacle => self.obstacles.push(handle),
        }
    }

    pub fn handles(&self, capability: Capability) -> &[ColliderHandle] {
        match capability {
            Capability::Ground => &self.ground,
            Capability::Obstacle => &self.obstacles,
        }
    }

    pub const fn mask(capability: Capability) -> Group {
        match capability {
            Capability::Ground => GROUP_GROUND,
            Capability::Obstacle => GROUP_OBSTACLE,
        }
    }
}

/// True when `to` is within `max_range` of `from` and no ground or obstacle
/// geometry occludes the straight path between them.
pub fn line_of_sight(
    physics: &PhysicsWorld,
    from: Vec3,
    to: Vec3,
    max_range: f32,
    exclude: Option<RigidBodyHandle>,
) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance > max_range {
        return false;
    }
    if distance < 1e-4 {
        return true;
    }
    let mask =
        PerceptionRegistry::mask(Capability::Ground) | PerceptionRegistry::mask(Capability::Obstacle);
    let occluder = physics.cast_ray(from, delta / distance, distance, exclude, mask);
    occluder.is_none()
}

/// Downward probe for ground contact, with a sticky buffer beyond the ball
/// radius so brief bounces still count as grounded.
pub fn grounded(physics: &PhysicsWorld, body: RigidBodyHandle, position: Vec3) -> bool {
    physics
        .cast_ray(
            position,
            vec3(0.0, -1.0, 0.0),
            config::GROUND_PROBE_RANGE,
            Some(body),
            PerceptionRegistry::mask(Capability::Ground),
        )
        .is_some()
}
