//! Stand-alone host: publishes the symbols given on the command line to the
//! companion window and logs every plot request until the window is closed.

use bufwatch_host::error::HostError;
use bufwatch_host::logger::initialize as LoggerInitialize;
use bufwatch_host::paths::{config_dir, log_dir};
use bufwatch_host::session::HostSession;

use bufwatch_core::PlotStatus;
use bufwatch_core::config::BridgeConfig;

use common::ErrorLocation;

use std::env::args;
use std::fs::create_dir_all;
use std::panic::Location;
use std::process::ExitCode;

use log::{error, info};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), HostError> {
    let log_dir = log_dir()?;
    create_dir_all(&log_dir).map_err(|e| HostError::Host {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("bufwatch host starting");
    info!("Log directory: {}", log_dir.display());

    let config_dir = config_dir()?;
    let config = BridgeConfig::load(&config_dir).map_err(|e| HostError::Bridge {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let symbols: Vec<String> = args().skip(1).collect();

    let mut session = HostSession::new(config, |buffer_name| {
        info!("Plot requested: {buffer_name}");
        PlotStatus::Plotted
    })?;

    if !session.start() {
        return Err(HostError::Bridge {
            message: "Companion window did not start".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    session.set_available_symbols(&symbols);

    let observed = session.get_observed_symbols();
    info!("Window observes {} symbols: {observed:?}", observed.len());

    while session.is_window_ready() {
        session.run_event_loop();
    }

    info!("Companion window closed");
    session.shutdown();

    Ok(())
}
