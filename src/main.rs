use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

mod auth;
mod cli;
mod client;
mod clipboard;
mod config;
mod logging;
mod models;
mod runtime;
mod setup;
mod tui;
mod ui;

use cli::Cli;
use config::{Config, ConfigFile};

fn main() -> Result<()> {
    // Ensure terminal colors are enabled on Windows
    #[cfg(windows)]
    let _ = colored::control::set_virtual_terminal(true);

    let cli = Cli::parse();

    // Logging is optional; the app works without a log file.
    if let Ok(path) = logging::init_logging() {
        tracing::debug!(log = %path.display(), "logging initialised");
    }

    let path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let store = Arc::new(ConfigFile::open(path)?);
    tracing::info!(config = %store.path().display(), "loaded settings");

    if let Err(e) = cli::run(cli.command, store) {
        tracing::error!("{e:#}");
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}
