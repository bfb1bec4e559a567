use dockwatch::controller::{Command, ServerOperationStatus, StreamView};
use egui::{Button, Grid, RichText};

use super::{
    DockConsoleApp, PALETTE_GREEN, PALETTE_MUTED, PALETTE_RED, PALETTE_YELLOW, card_frame,
    status_color,
};

impl DockConsoleApp {
    pub(crate) fn dashboard_view(&mut self, ctx: &egui::Context) {
        let truck_number = self.snapshot.truck_number.clone().unwrap_or_default();
        let status = self.snapshot.server_status;

        egui::TopBottomPanel::top("dashboard-header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add(Button::new(RichText::new("dockwatch").strong()).frame(false))
                    .on_hover_text("New entry")
                    .clicked()
                {
                    self.send(Command::NewEntry);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Logout").clicked() {
                        self.send(Command::Logout);
                    }
                    ui.label(RichText::new("● Live Ops").color(PALETTE_GREEN));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                card_frame().show(&mut columns[0], |ui| {
                    ui.label(RichText::new("Truck No.").color(PALETTE_MUTED));
                    ui.label(RichText::new(&truck_number).size(32.).strong());
                    ui.label(RichText::new("Unloading Now").color(PALETTE_MUTED));
                });
                card_frame().show(&mut columns[1], |ui| {
                    ui.label(RichText::new("Computer Vision Count").color(PALETTE_MUTED));
                    ui.label(RichText::new(self.snapshot.count.to_string()).size(32.).strong());
                    ui.label(RichText::new("Live from backend").color(PALETTE_MUTED));
                });
            });

            ui.add_space(12.);
            card_frame().show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.label(RichText::new(format!("Truck {}", truck_number)).size(24.).strong());
                ui.horizontal(|ui| {
                    ui.label("Status:");
                    ui.label(
                        RichText::new(status.label().to_uppercase())
                            .strong()
                            .color(status_color(status)),
                    );
                });
                ui.add_space(8.);
                ui.horizontal(|ui| {
                    let start_label = if status == ServerOperationStatus::Starting {
                        "Starting..."
                    } else {
                        "▶ Start"
                    };
                    if ui
                        .add_enabled(
                            status == ServerOperationStatus::Idle,
                            Button::new(start_label).fill(PALETTE_GREEN),
                        )
                        .clicked()
                    {
                        self.send(Command::StartServer);
                    }

                    let stop_label = if status == ServerOperationStatus::Stopping {
                        "Stopping..."
                    } else {
                        "■ Stop"
                    };
                    if ui
                        .add_enabled(
                            status == ServerOperationStatus::Running,
                            Button::new(stop_label).fill(PALETTE_RED),
                        )
                        .clicked()
                    {
                        self.send(Command::StopServer);
                    }

                    if ui.button("Terminate").clicked() {
                        self.send(Command::Terminate);
                    }
                });
            });

            ui.add_space(12.);
            card_frame().show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new("✔ Entry Logged Successfully").strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("New Entry").clicked() {
                            self.send(Command::NewEntry);
                        }
                    });
                });
            });

            ui.add_space(12.);
            card_frame().show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.label(RichText::new("Session Entries").size(18.).strong());
                ui.label(RichText::new("Live logs").color(PALETTE_MUTED));
                ui.add_space(8.);
                Grid::new("session-entries")
                    .num_columns(4)
                    .spacing([32., 8.])
                    .show(ui, |ui| {
                        for header in ["STREAM", "TRUCK NO", "CV COUNT", "STATUS"] {
                            ui.label(RichText::new(header).size(11.).color(PALETTE_MUTED));
                        }
                        ui.end_row();

                        if ui
                            .add(Button::new(RichText::new("▶ Watch Live").color(PALETTE_RED)))
                            .clicked()
                        {
                            self.send(Command::OpenStream);
                        }
                        ui.monospace(&truck_number);
                        ui.label(RichText::new(self.snapshot.count.to_string()).strong());
                        ui.label(RichText::new("Unloading").color(PALETTE_YELLOW));
                        ui.end_row();
                    });
            });
        });

        self.stream_window(ctx);
    }

    fn stream_window(&mut self, ctx: &egui::Context) {
        if self.snapshot.stream == StreamView::Closed {
            return;
        }

        let mut open = true;
        egui::Window::new("Live Feed: Dock 02")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.set_min_width(360.);
                match &self.snapshot.stream {
                    StreamView::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Connecting to Truck Camera...");
                        });
                    }
                    StreamView::Ready(descriptor) => {
                        if descriptor.is_embeddable() {
                            ui.label(RichText::new("● Live Signal").color(PALETTE_RED));
                        }
                        ui.hyperlink_to("Open live stream", &descriptor.embed_url);
                        ui.label(RichText::new(&descriptor.raw_url).small().color(PALETTE_MUTED));
                    }
                    StreamView::Unavailable | StreamView::Closed => {
                        ui.label(
                            RichText::new("Signal Lost or No URL provided.").color(PALETTE_MUTED),
                        );
                    }
                }
            });

        if !open {
            self.send(Command::CloseStream);
        }
    }
}
