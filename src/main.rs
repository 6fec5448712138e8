use macroquad::prelude::*;

mod audio;
mod camera;
mod config;
mod enemy;
mod game;
mod motion;
mod particles;
mod perception;
mod physics;
mod player;
mod pursuit;
mod qa;
mod renderer;
mod settings;
mod sonar;
mod terrain;
mod ui;

use audio::AudioEngine;
use game::Game;
use player::KeyState;
use renderer::SceneRenderer;
use settings::Settings;
use ui::UiState;

fn window_conf() -> Conf {
    Conf {
        window_title: "QUARRY — Sonar Chase".to_string(),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Headless QA dispatch: `quarry --qa baseline|pursuit [output_dir]`.
    let args: Vec<String> = std::env::args().collect();
    if let Some(idx) = args.iter().position(|a| a == "--qa") {
        let scenario = args
            .get(idx + 1)
            .and_then(|s| qa::QaScenario::parse_cli(s))
            .unwrap_or(qa::QaScenario::Baseline);
        let out_dir = args
            .get(idx + 2)
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| std::path::PathBuf::from("qa_out"));
        match qa::run(scenario, out_dir) {
            Ok(report) => eprintln!(
                "[QUARRY] QA {}: {} ({} checks, {} ticks)",
                report.scenario,
                report.overall_status,
                report.checks.len(),
                report.ticks
            ),
            Err(e) => eprintln!("[QUARRY] QA failed: {e}"),
        }
        return;
    }

    let mut game = Game::new(42, Settings::default(), AudioEngine::new());
    let scene = SceneRenderer::new(&game.terrain);
    let mut ui_state = UiState::default();

    loop {
        let frame_time = get_frame_time();

        if is_key_pressed(KeyCode::P) || is_key_pressed(KeyCode::Escape) {
            game.toggle_pause();
        }
        if is_key_pressed(KeyCode::R) {
            game.restart();
        }
        if is_key_pressed(KeyCode::Tab) {
            ui_state.show_settings = !ui_state.show_settings;
        }

        let keys = KeyState::poll();
        game.update(keys, frame_time);

        scene.draw(&game);
        ui::draw_ui(&mut game, &mut ui_state);

        next_frame().await
    }
}
