mod ui;

use std::sync::Arc;

use clap::{Parser, Subcommand, arg};
use dockwatch::controller::spawn_console_worker;
use dockwatch::{
    AppConfig, ConsoleError, DockBackend, FileSessionStore, HttpBackend,
    MemorySessionStore, SessionStore, ViewController, ViewState, resolve,
};
use egui::Vec2;
use log::{error, info};
use snafu::Snafu;
use ui::DockConsoleApp;

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("{source}"))]
    Console { source: ConsoleError },
    #[snafu(display("Could not start console worker"))]
    Worker { source: std::io::Error },
    #[snafu(display("Could not start user interface: {reason}"))]
    Gui { reason: String },
}

impl From<ConsoleError> for CliError {
    fn from(source: ConsoleError) -> Self {
        CliError::Console { source }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the operator console
    Console {
        /// Backend base URL, overrides DOCKWATCH_API_BASE_URL and the config file
        #[arg(short, long)]
        api_base_url: Option<String>,

        /// Keep the session in memory only, nothing survives a restart
        #[arg(long, default_value_t = false)]
        ephemeral: bool,
    },
    /// Print the persisted session and the view it routes to
    Status,
    /// Forget the persisted session
    Logout,
    /// Print the embeddable form of a stream link
    Resolve { url: String },
}

fn session_store(ephemeral: bool) -> Result<Arc<dyn SessionStore>, ConsoleError> {
    if ephemeral {
        Ok(Arc::new(MemorySessionStore::new()))
    } else {
        Ok(Arc::new(FileSessionStore::new_default()?))
    }
}

fn console(api_base_url: Option<String>, ephemeral: bool) -> Result<(), CliError> {
    let (app_config, config_origin) = AppConfig::load_local();
    let backend: Arc<dyn DockBackend> = Arc::new(HttpBackend::new(
        app_config.resolve_api_base_url(api_base_url),
        app_config.request_timeout(),
    )?);
    let store = session_store(ephemeral)?;
    let controller = ViewController::new(backend, store, app_config.poll_interval());

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_title("Dockwatch")
        .with_inner_size(Vec2::new(app_config.window_width, app_config.window_height));

    eframe::run_native(
        "Dockwatch",
        native_options,
        Box::new(move |cc| {
            let repaint_ctx = cc.egui_ctx.clone();
            let channels = spawn_console_worker(controller, move || repaint_ctx.request_repaint())?;
            Ok(Box::new(DockConsoleApp::new(
                channels.commands,
                channels.snapshots,
                app_config,
                config_origin,
                cc,
            )))
        }),
    )
    .map_err(|e| CliError::Gui {
        reason: e.to_string(),
    })
}

fn status() -> Result<(), CliError> {
    let store = FileSessionStore::new_default()?;
    let session = store.load()?;
    println!("user:        {}", session.user.as_deref().unwrap_or("-"));
    println!("truck:       {}", session.truck_number.as_deref().unwrap_or("-"));
    println!("token:       {}", if session.token.is_some() { "present" } else { "-" });
    println!("opens in:    {:?}", ViewState::from_session(&session));
    Ok(())
}

fn logout() -> Result<(), CliError> {
    // purely local, no backend involved
    let store = FileSessionStore::new_default()?;
    store.clear()?;
    info!("Cleared session at {:?}", store.path());
    println!("Session cleared");
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        error!("Could not set Ctrl-C handler: {}", e);
    }

    let result = match cli.command.unwrap_or(Commands::Console {
        api_base_url: None,
        ephemeral: false,
    }) {
        Commands::Console {
            api_base_url,
            ephemeral,
        } => console(api_base_url, ephemeral),
        Commands::Status => status(),
        Commands::Logout => logout(),
        Commands::Resolve { url } => {
            println!("{}", resolve(&url));
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
