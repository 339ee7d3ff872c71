//! Per-user directories for the config file and the log file.

use crate::error::HostError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "bufwatch";

/// `{config_dir}/bufwatch`, where `config.json` lives.
pub fn config_dir() -> Result<PathBuf, HostError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| HostError::Host {
            message: "Could not determine the user config directory".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// `{data_local_dir}/bufwatch/logs`, falling back to the config directory.
pub fn log_dir() -> Result<PathBuf, HostError> {
    match dirs::data_local_dir() {
        Some(dir) => Ok(dir.join(APP_DIR_NAME).join("logs")),
        None => config_dir().map(|dir| dir.join("logs")),
    }
}
