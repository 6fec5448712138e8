use egui;

use crate::settings::Settings;

/// Runtime settings panel for tuning movement, AI and sonar parameters.
pub fn draw_settings(ctx: &egui::Context, settings: &mut Settings) {
    egui::Window::new("Settings")
        .default_pos(egui::pos2(300.0, 60.0))
        .default_size(egui::vec2(280.0, 380.0))
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading("Movement");
            ui.add(egui::Slider::new(&mut settings.move_torque, 4.0..=30.0).text("Torque"));
            ui.add(egui::Slider::new(&mut settings.jump_impulse, 2.0..=12.0).text("Jump"));
            ui.add(egui::Slider::new(&mut settings.air_control, 0.0..=1.0).text("Air control"));
            ui.add(egui::Slider::new(&mut settings.brake_factor, 0.0..=5.0).text("Braking"));

            ui.separator();
            ui.heading("Pursuer");
            ui.add(egui::Slider::new(&mut settings.enemy_base_speed, 2.0..=25.0).text("Speed"));
            ui.add(
                egui::Slider::new(&mut settings.ai_tick_interval, 0.05..=0.5).text("Think rate"),
            );
            ui.add(egui::Slider::new(&mut settings.vision_range, 5.0..=60.0).text("Vision"));

            ui.separator();
            ui.heading("Camera");
            ui.add(
                egui::Slider::new(&mut settings.camera_stiffness, 1.0..=20.0).text("Stiffness"),
            );

            ui.separator();
            ui.heading("Sonar");
            ui.add(
                egui::Slider::new(&mut settings.sonar.master_volume, 0.0..=1.0).text("Volume"),
            );
            ui.checkbox(&mut settings.sonar.pitch_mod_enabled, "Pitch tracks distance");
            ui.add(
                egui::Slider::new(&mut settings.sonar.solid_distance, 0.0..=10.0)
                    .text("Alarm range"),
            );
            ui.collapsing("Closing tone", |ui| {
                ui.add(
                    egui::Slider::new(&mut settings.sonar.closing.max_distance, 10.0..=80.0)
                        .text("Max distance"),
                );
                ui.add(
                    egui::Slider::new(&mut settings.sonar.closing.volume, 0.0..=1.0)
                        .text("Volume"),
                );
                ui.add(
                    egui::Slider::new(&mut settings.sonar.closing.base_pitch, 60.0..=600.0)
                        .text("Pitch"),
                );
            });
            ui.collapsing("Opening tone", |ui| {
                ui.add(
                    egui::Slider::new(&mut settings.sonar.opening.max_distance, 10.0..=80.0)
                        .text("Max distance"),
                );
                ui.add(
                    egui::Slider::new(&mut settings.sonar.opening.volume, 0.0..=1.0)
                        .text("Volume"),
                );
                ui.add(
                    egui::Slider::new(&mut settings.sonar.opening.base_pitch, 60.0..=600.0)
                        .text("Pitch"),
                );
            });

            ui.separator();
            if ui.button("Reset to defaults").clicked() {
                *settings = Settings::default();
            }
        });
}
