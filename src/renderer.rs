use macroquad::models::Vertex;
use macroquad::prelude::*;

use crate::config;
use crate::game::Game;
use crate::pursuit::PursuitState;
use crate::terrain::Terrain;

/// Tint communicating the pursuer's mood at a glance.
fn state_color(state: PursuitState) -> Color {
    match state {
        PursuitState::Idle => Color::new(0.55, 0.55, 0.6, 1.0),
        PursuitState::Alert => Color::new(0.95, 0.85, 0.2, 1.0),
        PursuitState::Chase => Color::new(0.95, 0.2, 0.15, 1.0),
        PursuitState::Search => Color::new(0.95, 0.55, 0.15, 1.0),
    }
}

fn height_color(height: f32) -> Color {
    // Valleys dark green, ridges dusty brown.
    let t = ((height / config::TERRAIN_HEIGHT) * 0.5 + 0.5).clamp(0.0, 1.0);
    Color::new(0.18 + 0.35 * t, 0.38 + 0.12 * t, 0.16 + 0.08 * t, 1.0)
}

fn build_terrain_mesh(terrain: &Terrain) -> Mesh {
    let n = terrain.cells + 1;
    let mut vertices = Vec::with_capacity(n * n);
    for iz in 0..n {
        for ix in 0..n {
            let x = (ix as f32 / terrain.cells as f32 - 0.5) * terrain.size;
            let z = (iz as f32 / terrain.cells as f32 - 0.5) * terrain.size;
            let y = terrain.vertex_height(ix, iz);
            vertices.push(Vertex::new(
                x,
                y,
                z,
                ix as f32 / terrain.cells as f32,
                iz as f32 / terrain.cells as f32,
                height_color(y),
            ));
        }
    }

    let mut indices = Vec::with_capacity(terrain.cells * terrain.cells * 6);
    for iz in 0..terrain.cells {
        for ix in 0..terrain.cells {
            let a = (iz * n + ix) as u16;
            let b = (iz * n + ix + 1) as u16;
            let c = ((iz + 1) * n + ix) as u16;
            let d = ((iz + 1) * n + ix + 1) as u16;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    Mesh {
        vertices,
        indices,
        texture: None,
    }
}

pub struct SceneRenderer {
    terrain_mesh: Mesh,
}

impl SceneRenderer {
    pub fn new(terrain: &Terrain) -> Self {
        Self {
            terrain_mesh: build_terrain_mesh(terrain),
        }
    }

    pub fn draw(&self, game: &Game) {
        clear_background(Color::new(0.06, 0.07, 0.1, 1.0));

        set_camera(&game.camera.to_macroquad_camera());

        draw_mesh(&self.terrain_mesh);

        for obstacle in &game.terrain.obstacles {
            let size = obstacle.half_extents * 2.0;
            draw_cube(obstacle.pos, size, None, Color::new(0.35, 0.33, 0.4, 1.0));
            draw_cube_wires(obstacle.pos, size, Color::new(0.2, 0.18, 0.25, 1.0));
        }

        draw_sphere(
            game.player_visual.position,
            config::BALL_RADIUS,
            None,
            Color::new(0.3, 0.65, 0.95, 1.0),
        );
        draw_sphere(
            game.enemy_visual.position,
            config::BALL_RADIUS,
            None,
            state_color(game.enemy.ai.state),
        );

        game.particles.draw();

        set_default_camera();
    }
}
