use macroquad::prelude::*;

const MAX_PARTICLES: usize = 400;

#[derive(Clone, Copy)]
struct Particle {
    pos: Vec3,
    velocity: Vec3,
    color: Color,
    life: f32,
    max_life: f32,
    size: f32,
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self {
            particles: Vec::with_capacity(MAX_PARTICLES),
        }
    }

    /// Dust ring kicked up by a jump.
    pub fn emit_jump(&mut self, pos: Vec3) {
        self.emit_burst(pos, 10, Color::new(0.85, 0.82, 0.7, 0.9), 4.0, 0.5, 0.3);
    }

    /// Burst on the pursuer catching the player.
    pub fn emit_contact(&mut self, pos: Vec3) {
        self.emit_burst(pos, 18, Color::new(1.0, 0.25, 0.1, 1.0), 7.0, 0.8, 1.0);
    }

    fn emit_burst(
        &mut self,
        pos: Vec3,
        count: usize,
        color: Color,
        speed: f32,
        lifetime: f32,
        upward: f32,
    ) {
        for i in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                // Remove oldest particle
                self.particles.remove(0);
            }

            let angle =
                (i as f32 / count as f32) * std::f32::consts::TAU + rand::gen_range(-0.3, 0.3);
            let spd = speed * rand::gen_range(0.4, 1.0);
            let vel = vec3(
                angle.cos() * spd,
                upward * speed * rand::gen_range(0.2, 0.8),
                angle.sin() * spd,
            );

            self.particles.push(Particle {
                pos,
                velocity: vel,
                color,
                life: lifetime * rand::gen_range(0.7, 1.0),
                max_life: lifetime,
                size: rand::gen_range(0.06, 0.16),
            });
        }
    }

    /// Update all particles, removing expired ones.
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.pos += p.velocity * dt;
            p.velocity.y -= 6.0 * dt; // light gravity
            p.velocity *= 1.0 - 2.0 * dt; // drag
            p.life -= dt;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Draw all particles.
    pub fn draw(&self) {
        for p in &self.particles {
            let t = (p.life / p.max_life).clamp(0.0, 1.0);
            let alpha = t * p.color.a;
            let size = p.size * (0.4 + 0.6 * t);
            let color = Color::new(p.color.r, p.color.g, p.color.b, alpha);
            draw_sphere(p.pos, size, None, color);
        }
    }

    pub fn count(&self) -> usize {
        self.particles.len()
    }
}
