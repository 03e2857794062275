mod app;
mod config;
mod entry;
mod error;
mod io;
mod message;
mod state;
mod style;
mod subscription;
mod view;

use app::App;
use config::Config;
use crossterm::event::{self, Event};
use error::StartupError;
use io::worker::spawn_worker;
use io::{Credentials, DriveClient};
use ratatui::DefaultTerminal;
use state::Session;
use std::fs::{self, OpenOptions};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// The terminal belongs to the UI, so logs go to a file. Failure here only loses logs.
fn init_logging(config: &Config) {
    let Some(path) = config.log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn start(config: &Config) -> Result<App, StartupError> {
    let token_path = config.token_path().ok_or(StartupError::NoConfigDir)?;
    let credentials_path = config.credentials_path().ok_or(StartupError::NoConfigDir)?;
    let credentials = Credentials::load(&token_path, &credentials_path)?;
    let client = DriveClient::new(credentials, config.drive.page_size, config.drive.order_by.clone())?;

    let user = client.about()?;
    info!(user = %user.email_address, "signed in");
    let session = Session::start(&client, &config.drive.root_folder)?;

    Ok(App::new(session, user, config, spawn_worker(Arc::new(client))))
}

fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<(), StartupError> {
    let poll_interval = Duration::from_millis(style::POLL_INTERVAL_MS);
    while !app.should_quit {
        terminal.draw(|frame| app.render(frame))?;
        if event::poll(poll_interval)? {
            if let Event::Key(key) = event::read()? {
                if let Some(message) = subscription::handle_key(key, app.session.mode().kind()) {
                    app.update(message);
                }
            }
        }
        app.drain_io();
        app.ui.clear_expired_messages();
    }
    Ok(())
}

fn main() -> ExitCode {
    let (config, config_warning) = Config::load();
    init_logging(&config);
    if let Some(warning) = config_warning {
        warn!("{}", warning);
    }
    if let Err(e) = Config::create_default() {
        warn!(error = %e, "could not write default config");
    }

    let app = match start(&config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("kura: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, app);
    ratatui::restore();

    match result {
        Ok(()) => {
            info!("bye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "terminal loop failed");
            eprintln!("kura: {}", e);
            ExitCode::FAILURE
        }
    }
}
