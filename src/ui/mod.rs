pub mod hud;
pub mod settings;

use crate::game::Game;

/// Tracks which UI panels are open.
pub struct UiState {
    pub show_hud: bool,
    pub show_settings: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_hud: true,
            show_settings: false,
        }
    }
}

/// Draw all egui UI panels.
pub fn draw_ui(game: &mut Game, ui_state: &mut UiState) {
    egui_macroquad::ui(|ctx| {
        if ui_state.show_hud {
            hud::draw_hud(ctx, game, ui_state);
        }

        if ui_state.show_settings {
            settings::draw_settings(ctx, &mut game.settings);
        }
    });

    egui_macroquad::draw();
}
