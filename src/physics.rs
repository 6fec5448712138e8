use macroquad::prelude::*;
use rapier3d::na::DMatrix;
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase, Group,
    ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, QueryFilter, QueryPipeline, Ray, Real, RigidBodyBuilder,
    RigidBodyHandle, RigidBodySet,
};

use crate::config;

/// Collision-group membership for static ground geometry (terrain).
pub const GROUP_GROUND: Group = Group::GROUP_1;
/// Collision-group membership for static obstacles (pillars).
pub const GROUP_OBSTACLE: Group = Group::GROUP_2;
/// Collision-group membership for dynamic balls (player, pursuer).
pub const GROUP_BALL: Group = Group::GROUP_3;

/// Result of a raycast against world geometry.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub distance: f32,
    pub collider: ColliderHandle,
    pub normal: Vec3,
}

fn to_na(v: Vec3) -> rapier3d::na::Vector3<Real> {
    rapier3d::na::Vector3::new(v.x, v.y, v.z)
}

fn to_glam(v: &rapier3d::na::Vector3<Real>) -> Vec3 {
    vec3(v.x, v.y, v.z)
}

/// Rigid-body world. The rest of the game only issues commands
/// (forces, torques, impulses, teleports) and reads streamed state.
pub struct PhysicsWorld {
    gravity: rapier3d::na::Vector3<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: rapier3d::na::Vector3::new(0.0, -9.81, 0.0),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Spawn a dynamic ball body at `pos`.
    pub fn spawn_ball(&mut self, pos: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_na(pos))
            .linear_damping(config::LINEAR_DAMPING)
            .angular_damping(config::ANGULAR_DAMPING)
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(config::BALL_RADIUS)
            .density(config::BALL_DENSITY)
            .friction(0.8)
            .restitution(0.2)
            .collision_groups(InteractionGroups::new(GROUP_BALL, Group::ALL))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Insert a static heightfield collider spanning `scale.x` by `scale.z`, centered at the origin.
    pub fn add_heightfield(&mut self, heights: DMatrix<Real>, scale: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::heightfield(heights, to_na(scale))
            .friction(0.9)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, Group::ALL))
            .build();
        self.colliders.insert(collider)
    }

    /// Insert a static box obstacle.
    pub fn add_obstacle(&mut self, pos: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_na(pos))
            .friction(0.7)
            .collision_groups(InteractionGroups::new(GROUP_OBSTACLE, Group::ALL))
            .build();
        self.colliders.insert(collider)
    }

    /// Cast a ray against colliders whose membership intersects `mask`.
    /// `exclude` removes one rigid body (typically the caster) from candidates.
    pub fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<RigidBodyHandle>,
        mask: Group,
    ) -> Option<RayHit> {
        if direction.length_squared() < 1e-12 {
            return None;
        }
        let dir = direction.normalize();
        let ray = Ray::new(
            rapier3d::na::Point3::new(origin.x, origin.y, origin.z),
            to_na(dir),
        );
        let mut filter = QueryFilter::default().groups(InteractionGroups::new(Group::ALL, mask));
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body);
        }
        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.bodies,
                &self.colliders,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(collider, hit)| RayHit {
                distance: hit.time_of_impact,
                collider,
                normal: to_glam(&hit.normal),
            })
    }

    pub fn position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| to_glam(b.translation()))
    }

    pub fn velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| to_glam(b.linvel()))
    }

    pub fn angular_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| to_glam(b.angvel()))
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.bodies.get(handle).map(|b| {
            let c = b.rotation().coords;
            Quat::from_xyzw(c.x, c.y, c.z, c.w)
        })
    }

    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(to_na(velocity), true);
        }
    }

    pub fn set_angular_velocity(&mut self, handle: RigidBodyHandle, angular: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_angvel(to_na(angular), true);
        }
    }

    /// Move a body to `pos`, zeroing its velocities. Used for respawns.
    pub fn teleport(&mut self, handle: RigidBodyHandle, pos: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(to_na(pos), true);
            body.set_linvel(to_na(Vec3::ZERO), true);
            body.set_angvel(to_na(Vec3::ZERO), true);
        }
    }

    /// Replace the persistent force on a body for this frame.
    pub fn set_force(&mut self, handle: RigidBodyHandle, force: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.reset_forces(true);
            body.add_force(to_na(force), true);
        }
    }

    /// Replace the persistent torque on a body for this frame.
    pub fn set_torque(&mut self, handle: RigidBodyHandle, torque: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.reset_torques(true);
            body.add_torque(to_na(torque), true);
        }
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(to_na(impulse), true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_pulls_a_spawned_ball_down() {
        let mut world = PhysicsWorld::new();
        let ball = world.spawn_ball(vec3(0.0, 10.0, 0.0));
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        let pos = world.position(ball).unwrap();
        assert!(pos.y < 10.0);
        assert!(world.velocity(ball).unwrap().y < 0.0);
    }

    #[test]
    fn raycast_hits_an_obstacle_and_reports_distance() {
        let mut world = PhysicsWorld::new();
        world.add_obstacle(vec3(0.0, 0.0, -5.0), vec3(1.0, 1.0, 1.0));
        world.step(1.0 / 60.0);
        let hit = world
            .cast_ray(Vec3::ZERO, vec3(0.0, 0.0, -1.0), 10.0, None, GROUP_OBSTACLE)
            .expect("ray should hit the box");
        assert!((hit.distance - 4.0).abs() < 0.1);
    }

    #[test]
    fn raycast_group_mask_filters_out_other_geometry() {
        let mut world = PhysicsWorld::new();
        world.add_obstacle(vec3(0.0, 0.0, -5.0), vec3(1.0, 1.0, 1.0));
        world.step(1.0 / 60.0);
        let hit = world.cast_ray(Vec3::ZERO, vec3(0.0, 0.0, -1.0), 10.0, None, GROUP_GROUND);
        assert!(hit.is_none());
    }

    #[test]
    fn teleport_zeroes_velocities() {
        let mut world = PhysicsWorld::new();
        let ball = world.spawn_ball(vec3(0.0, 10.0, 0.0));
        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }
        world.teleport(ball, vec3(1.0, 2.0, 3.0));
        assert!(world.position(ball).unwrap().distance(vec3(1.0, 2.0, 3.0)) < 1e-5);
        assert!(world.velocity(ball).unwrap().length() < 1e-5);
    }
}
