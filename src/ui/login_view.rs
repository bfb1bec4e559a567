use dockwatch::controller::Command;
use egui::{Button, RichText, TextEdit};

use super::{DockConsoleApp, PALETTE_MUTED, PALETTE_YELLOW, card_frame};

impl DockConsoleApp {
    pub(crate) fn login_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 6.);
                card_frame().show(ui, |ui| {
                    ui.set_max_width(360.);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("Operator Login").size(22.).strong());
                        ui.label(RichText::new("Secure Logistics Access").color(PALETTE_MUTED));
                    });
                    ui.add_space(16.);

                    ui.label("Username");
                    ui.add(
                        TextEdit::singleline(&mut self.login_form.username)
                            .hint_text("Enter ID")
                            .desired_width(f32::INFINITY),
                    );
                    ui.add_space(8.);
                    ui.label("Password");
                    let password = ui.add(
                        TextEdit::singleline(&mut self.login_form.password)
                            .password(true)
                            .desired_width(f32::INFINITY),
                    );
                    let submitted_with_enter =
                        password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                    if let Some(message) = &self.snapshot.error {
                        ui.add_space(8.);
                        Self::error_label(ui, message);
                    }

                    ui.add_space(16.);
                    let pending = self.login_form.pending;
                    let label = if pending { "Signing in..." } else { "Sign In" };
                    let clicked = ui
                        .add_enabled(
                            !pending,
                            Button::new(RichText::new(label).strong().color(egui::Color32::BLACK))
                                .fill(PALETTE_YELLOW)
                                .min_size(egui::vec2(ui.available_width(), 36.)),
                        )
                        .clicked();

                    if (clicked || submitted_with_enter) && !pending {
                        self.login_form.pending = true;
                        self.send(Command::Login {
                            username: self.login_form.username.clone(),
                            password: self.login_form.password.clone(),
                        });
                    }
                });
            });
        });
    }
}
