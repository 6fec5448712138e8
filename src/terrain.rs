use macroquad::prelude::*;
use ::rand::Rng;
use noise::{Fbm, NoiseFn, Perlin};
use rapier3d::na::DMatrix;

use crate::config;
use crate::perception::{Capability, PerceptionRegistry};
use crate::physics::PhysicsWorld;

/// Static pillar obstacle; occludes line of sight and deflects the pursuer.
#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    pub pos: Vec3,
    pub half_extents: Vec3,
}

/// Procedurally generated heightfield plus scattered pillars.
pub struct Terrain {
    heights: Vec<f32>, // (cells+1)^2 vertex heights, row-major, rows along z
    pub cells: usize,
    pub size: f32,
    pub obstacles: Vec<Obstacle>,
}

impl Terrain {
    pub fn generate(seed: u32, rng: &mut impl Rng) -> Self {
        let fbm: Fbm<Perlin> = Fbm::new(seed);
        let n = config::TERRAIN_CELLS + 1;
        let size = config::TERRAIN_SIZE;
        let mut heights = Vec::with_capacity(n * n);

        for iz in 0..n {
            for ix in 0..n {
                let x = (ix as f32 / config::TERRAIN_CELLS as f32 - 0.5) * size;
                let z = (iz as f32 / config::TERRAIN_CELLS as f32 - 0.5) * size;
                let value = fbm.get([
                    x as f64 * config::TERRAIN_NOISE_SCALE,
                    z as f64 * config::TERRAIN_NOISE_SCALE,
                ]) as f32;
                heights.push(value * config::TERRAIN_HEIGHT);
            }
        }

        let mut terrain = Self {
            heights,
            cells: config::TERRAIN_CELLS,
            size,
            obstacles: Vec::new(),
        };
        terrain.flatten_spawn_pads();
        terrain.scatter_obstacles(rng);
        terrain
    }

    /// Level the ground around both spawn points so an undriven ball rests
    /// instead of rolling downhill off its pad.
    fn flatten_spawn_pads(&mut self) {
        let pad_radius = 8.0;
        let n = self.cells + 1;
        let pads = [
            (-config::START_SEPARATION * 0.5, 0.0),
            (config::START_SEPARATION * 0.5, 0.0),
        ];
        for (px, pz) in pads {
            let pad_height = self.height_at(px, pz);
            for iz in 0..n {
                for ix in 0..n {
                    let x = (ix as f32 / self.cells as f32 - 0.5) * self.size;
                    let z = (iz as f32 / self.cells as f32 - 0.5) * self.size;
                    let dist = vec3(x - px, 0.0, z - pz).length();
                    if dist < pad_radius {
                        let t = (dist / pad_radius).powi(2);
                        let h = &mut self.heights[iz * n + ix];
                        *h = pad_height * (1.0 - t) + *h * t;
                    }
                }
            }
        }
    }

    /// Random pillars, kept clear of both spawn points.
    fn scatter_obstacles(&mut self, rng: &mut impl Rng) {
        let spawns = [self.player_spawn(), self.enemy_spawn()];
        let margin = self.size * 0.45;
        while self.obstacles.len() < config::OBSTACLE_COUNT {
            let x = rng.gen_range(-margin..margin);
            let z = rng.gen_range(-margin..margin);
            if spawns
                .iter()
                .any(|s| vec3(x - s.x, 0.0, z - s.z).length() < 6.0)
            {
                continue;
            }
            let half = vec3(
                rng.gen_range(config::OBSTACLE_MIN_HALF..config::OBSTACLE_MAX_HALF),
                config::OBSTACLE_HEIGHT * 0.5,
                rng.gen_range(config::OBSTACLE_MIN_HALF..config::OBSTACLE_MAX_HALF),
            );
            let y = self.height_at(x, z) + half.y - 0.2;
            self.obstacles.push(Obstacle {
                pos: vec3(x, y, z),
                half_extents: half,
            });
        }
    }

    /// Ground height at a world-space point (nearest vertex).
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let n = self.cells + 1;
        let fx = ((x / self.size + 0.5) * self.cells as f32).round();
        let fz = ((z / self.size + 0.5) * self.cells as f32).round();
        let ix = (fx.max(0.0) as usize).min(self.cells);
        let iz = (fz.max(0.0) as usize).min(self.cells);
        self.heights[iz * n + ix]
    }

    pub fn vertex_height(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz * (self.cells + 1) + ix]
    }

    pub fn player_spawn(&self) -> Vec3 {
        let x = -config::START_SEPARATION * 0.5;
        vec3(x, self.height_at(x, 0.0) + config::SPAWN_CLEARANCE, 0.0)
    }

    pub fn enemy_spawn(&self) -> Vec3 {
        let x = config::START_SEPARATION * 0.5;
        vec3(x, self.height_at(x, 0.0) + config::SPAWN_CLEARANCE, 0.0)
    }

    /// Insert colliders for the heightfield and every pillar, registering
    /// each under its capability tag.
    pub fn install(&self, physics: &mut PhysicsWorld, registry: &mut PerceptionRegistry) {
        let n = self.cells + 1;
        let matrix = DMatrix::from_fn(n, n, |iz, ix| self.vertex_height(ix, iz));
        let ground = physics.add_heightfield(matrix, vec3(self.size, 1.0, self.size));
        registry.register(Capability::Ground, ground);

        for obstacle in &self.obstacles {
            let handle = physics.add_obstacle(obstacle.pos, obstacle.half_extents);
            registry.register(Capability::Obstacle, handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(9);
        let mut rng_b = ChaCha8Rng::seed_from_u64(9);
        let a = Terrain::generate(3, &mut rng_a);
        let b = Terrain::generate(3, &mut rng_b);
        assert_eq!(a.heights, b.heights);
        assert_eq!(a.obstacles.len(), b.obstacles.len());
    }

    #[test]
    fn heights_stay_within_the_configured_amplitude() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let terrain = Terrain::generate(7, &mut rng);
        for &h in &terrain.heights {
            assert!(h.abs() <= config::TERRAIN_HEIGHT * 1.5);
        }
    }

    #[test]
    fn spawns_sit_above_the_ground_and_apart() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let terrain = Terrain::generate(5, &mut rng);
        let player = terrain.player_spawn();
        let enemy = terrain.enemy_spawn();
        assert!((player.distance(enemy) - config::START_SEPARATION).abs() < 2.0 * config::TERRAIN_HEIGHT);
        assert!(player.y > terrain.height_at(player.x, player.z));
    }

    #[test]
    fn obstacles_avoid_the_spawn_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let terrain = Terrain::generate(11, &mut rng);
        assert_eq!(terrain.obstacles.len(), config::OBSTACLE_COUNT);
        for obstacle in &terrain.obstacles {
            for spawn in [terrain.player_spawn(), terrain.enemy_spawn()] {
                let flat = vec3(obstacle.pos.x - spawn.x, 0.0, obstacle.pos.z - spawn.z);
                assert!(flat.length() >= 6.0);
            }
        }
    }

    #[test]
    fn installing_registers_ground_and_obstacles() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let terrain = Terrain::generate(8, &mut rng);
        let mut physics = PhysicsWorld::new();
        let mut registry = PerceptionRegistry::new();
        terrain.install(&mut physics, &mut registry);
        assert_eq!(registry.handles(Capability::Ground).len(), 1);
        assert_eq!(
            registry.handles(Capability::Obstacle).len(),
            config::OBSTACLE_COUNT
        );
    }
}
