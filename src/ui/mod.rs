mod dashboard_view;
mod login_view;
mod truck_view;

use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use dockwatch::{AppConfig, ConfigOrigin};
use dockwatch::controller::{Command, ConsoleSnapshot, ServerOperationStatus, ViewState};
use egui::{Color32, CornerRadius, Frame, Margin, RichText, Visuals, style::Widgets};
use log::{error, warn};

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_CARD: Color32 = Color32::from_rgb(28, 28, 30);
pub(crate) const PALETTE_GREEN: Color32 = Color32::from_rgb(12, 131, 31);
pub(crate) const PALETTE_YELLOW: Color32 = Color32::from_rgb(248, 203, 70);
pub(crate) const PALETTE_RED: Color32 = Color32::from_rgb(220, 53, 69);
pub(crate) const PALETTE_MUTED: Color32 = Color32::from_rgb(140, 140, 140);

const DEFAULT_CARD_CORNER_RADIUS: u8 = 12;
const ENTRY_RECORDED_DISPLAY: Duration = Duration::from_millis(1500);
const IDLE_REPAINT: Duration = Duration::from_secs(1);

#[derive(Default)]
struct LoginForm {
    username: String,
    password: String,
    pending: bool,
}

#[derive(Default)]
struct TruckForm {
    truck_number: String,
    pending: bool,
    // validation message shown before anything is sent
    local_error: Option<String>,
}

/// `DockConsoleApp` renders whatever the console worker last published.
///
/// It never talks to the backend itself: operator actions become
/// [`Command`]s for the worker and the resulting [`ConsoleSnapshot`]s are
/// drained every frame.
pub struct DockConsoleApp {
    commands: Sender<Command>,
    snapshots: Receiver<ConsoleSnapshot>,
    snapshot: ConsoleSnapshot,
    app_config: AppConfig,
    config_origin: ConfigOrigin,
    login_form: LoginForm,
    truck_form: TruckForm,
    entry_recorded_until: Option<Instant>,
}

impl DockConsoleApp {
    pub fn new(
        commands: Sender<Command>,
        snapshots: Receiver<ConsoleSnapshot>,
        app_config: AppConfig,
        config_origin: ConfigOrigin,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let default_visuals = Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_YELLOW,
            faint_bg_color: PALETTE_CARD,
            panel_fill: PALETTE_BLACK,
            widgets: Widgets::dark(),
            striped: false,
            ..Default::default()
        };
        cc.egui_ctx.set_visuals(default_visuals);

        Self {
            commands,
            snapshots,
            snapshot: ConsoleSnapshot::default(),
            app_config,
            config_origin,
            login_form: LoginForm::default(),
            truck_form: TruckForm::default(),
            entry_recorded_until: None,
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            error!("Console worker is gone, command dropped");
        }
    }

    fn apply_snapshot(&mut self, snapshot: ConsoleSnapshot) {
        if self.snapshot.view == ViewState::TruckEntryRequired
            && snapshot.view == ViewState::DashboardActive
        {
            self.entry_recorded_until = Some(Instant::now() + ENTRY_RECORDED_DISPLAY);
            self.truck_form = TruckForm::default();
        }
        if snapshot.view != ViewState::LoginRequired {
            self.login_form = LoginForm::default();
        }
        self.login_form.pending = false;
        self.truck_form.pending = false;
        self.snapshot = snapshot;
    }

    fn loading_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
        });
    }

    fn entry_recorded_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.);
                ui.label(RichText::new("✔").size(64.).color(PALETTE_GREEN));
                ui.label(RichText::new("Entry Recorded!").size(24.).strong());
                ui.label(RichText::new("Syncing with Server...").color(PALETTE_MUTED));
            });
        });
    }

    fn error_label(ui: &mut egui::Ui, message: &str) {
        ui.label(RichText::new(format!("⚠ {}", message)).color(PALETTE_RED));
    }
}

pub(crate) fn card_frame() -> Frame {
    Frame::new()
        .fill(PALETTE_CARD)
        .inner_margin(Margin::same(20))
        .corner_radius(CornerRadius::same(DEFAULT_CARD_CORNER_RADIUS))
}

pub(crate) fn status_color(status: ServerOperationStatus) -> Color32 {
    match status {
        ServerOperationStatus::Running => PALETTE_GREEN,
        ServerOperationStatus::Starting | ServerOperationStatus::Stopping => PALETTE_YELLOW,
        ServerOperationStatus::Idle => PALETTE_MUTED,
    }
}

impl eframe::App for DockConsoleApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.app_config.save_back(self.config_origin) {
            warn!("Error while saving config file: {}", e);
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(snapshot) = self.snapshots.try_recv() {
            self.apply_snapshot(snapshot);
        }

        if let Some(until) = self.entry_recorded_until {
            if Instant::now() < until {
                self.entry_recorded_view(ctx);
                ctx.request_repaint_after(until.saturating_duration_since(Instant::now()));
                return;
            }
            self.entry_recorded_until = None;
        }

        match self.snapshot.view {
            ViewState::Loading => self.loading_view(ctx),
            ViewState::LoginRequired => self.login_view(ctx),
            ViewState::TruckEntryRequired => self.truck_view(ctx),
            ViewState::DashboardActive => self.dashboard_view(ctx),
        }

        // the worker wakes us on every publish, this only keeps spinners moving
        ctx.request_repaint_after(IDLE_REPAINT);
    }
}
