use egui;

use crate::game::{Game, GamePhase};
use crate::perception::Capability;
use crate::ui::UiState;

/// Status readout: phase, pursuer mood, range, and the sonar's view of it.
/// Position data comes from the throttled telemetry snapshot, not the live
/// physics state.
pub fn draw_hud(ctx: &egui::Context, game: &Game, ui_state: &mut UiState) {
    egui::Window::new("Status")
        .default_pos(egui::pos2(10.0, 10.0))
        .resizable(false)
        .show(ctx, |ui| {
            let phase = match game.phase {
                GamePhase::Countdown => "get ready",
                GamePhase::Playing => "run",
                GamePhase::Paused => "paused",
                GamePhase::GameOver => "caught",
            };
            ui.label(format!("Phase: {phase}"));
            ui.label(format!("Pursuer: {}", game.telemetry.ai_state));

            let gap = game
                .telemetry
                .player_position
                .distance(game.telemetry.enemy_position);
            ui.label(format!("Range: {gap:.1}"));
            ui.label(format!("Closing: {:+.1}", game.telemetry.closing_speed));
            ui.label(format!(
                "Cover: {} obstacles",
                game.registry.handles(Capability::Obstacle).len()
            ));

            if !game.audio.is_enabled() {
                ui.label("(audio unavailable)");
            }

            ui.separator();
            ui.label("WASD roll, Space jump, P pause, R restart");

            if ui.button("Settings").clicked() {
                ui_state.show_settings = !ui_state.show_settings;
            }
        });
}
