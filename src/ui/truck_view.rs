use dockwatch::controller::Command;
use dockwatch::truck::{is_valid_truck_number, sanitize_truck_input};
use egui::{Button, RichText, TextEdit};

use super::{DockConsoleApp, PALETTE_GREEN, PALETTE_MUTED, card_frame};

impl DockConsoleApp {
    pub(crate) fn truck_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("truck-entry-header").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Sign Out").clicked() {
                    self.send(Command::Logout);
                }
                if let Some(user) = &self.snapshot.user {
                    ui.label(RichText::new(user).color(PALETTE_MUTED));
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 6.);
                card_frame().show(ui, |ui| {
                    ui.set_max_width(360.);
                    ui.vertical_centered(|ui| {
                        ui.label(
                            RichText::new("INBOUND LOGISTICS PORTAL")
                                .size(12.)
                                .color(PALETTE_MUTED),
                        );
                    });
                    ui.add_space(16.);
                    ui.label("Truck Number (Last 4 Digits)");

                    let response = ui.add_enabled(
                        !self.truck_form.pending,
                        TextEdit::singleline(&mut self.truck_form.truck_number)
                            .hint_text("1234")
                            .font(egui::TextStyle::Heading)
                            .horizontal_align(egui::Align::Center)
                            .desired_width(f32::INFINITY),
                    );
                    if response.changed() {
                        self.truck_form.truck_number =
                            sanitize_truck_input(&self.truck_form.truck_number);
                        self.truck_form.local_error = None;
                    }
                    let submitted_with_enter =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                    let message = self
                        .truck_form
                        .local_error
                        .as_ref()
                        .or(self.snapshot.error.as_ref());
                    if let Some(message) = message {
                        ui.add_space(8.);
                        Self::error_label(ui, message);
                    }

                    ui.add_space(16.);
                    let pending = self.truck_form.pending;
                    let label = if pending { "Processing..." } else { "Submit Entry →" };
                    let clicked = ui
                        .add_enabled(
                            !pending,
                            Button::new(RichText::new(label).strong())
                                .fill(PALETTE_GREEN)
                                .min_size(egui::vec2(ui.available_width(), 40.)),
                        )
                        .clicked();

                    if (clicked || submitted_with_enter) && !pending {
                        self.submit_truck();
                    }
                });
            });
        });
    }

    fn submit_truck(&mut self) {
        let truck_number = self.truck_form.truck_number.clone();
        if !is_valid_truck_number(&truck_number) {
            self.truck_form.local_error =
                Some("Please enter the last 4 digits (e.g., 1234)".to_string());
            return;
        }
        self.truck_form.pending = true;
        self.send(Command::SubmitTruck { truck_number });
    }
}
