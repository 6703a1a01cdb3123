use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::sync::Arc;
use std::time::Duration;
use std::{error::Error, io};

mod alerts;
mod app;
mod cli;
mod config;
mod error;
mod logging;
mod notify;
mod open_meteo;
mod session;
mod store;
mod units;
mod view;
mod weather;

use crate::alerts::AlertEvaluator;
use crate::app::{run_app, App};
use crate::config::Config;
use crate::notify::{Dispatcher, Permission, ToastTray};
use crate::open_meteo::OpenMeteo;
use crate::store::{FileStore, Preferences};

fn main() -> Result<(), Box<dyn Error>> {
    let args = cli::Args::parse();
    let config = Config::load(args.config.as_deref())?;
    logging::init(&config::log_path())?;

    let source = OpenMeteo::new(&config.api)?;
    let prefs = Preferences::new(FileStore::new(config.storage_path()));
    tracing::info!(storage = %prefs.store().path().display(), "meteo starting");

    let supported = config.notifications.enabled && !args.no_notifications;
    let dispatcher = Dispatcher::new(
        supported,
        Permission::load(prefs.store()),
        ToastTray::new(Duration::from_secs(config.notifications.toast_secs)),
    );

    let mut app = App::new(
        Arc::new(source),
        prefs,
        dispatcher,
        AlertEvaluator::from(&config.alerts),
    );
    if let Some(city) = args.city.as_deref() {
        app.search(city);
    }

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // run the app
    let res = run_app(&mut terminal, &mut app);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        println!("{:?}", err)
    }

    Ok(())
}
