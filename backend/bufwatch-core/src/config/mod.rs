//! Bridge configuration stored as `{config_dir}/config.json`.
//!
//! Everything that used to be a process-wide literal (listening port, companion
//! executable, timeouts) lives here and is handed to [`crate::bridge::Bridge::new`].

use crate::error::config::ConfigError;
use crate::{COMPANION_BINARY, DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT};

use common::ErrorLocation;

use std::net::IpAddr;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenConfig {
    #[serde(default = "default_listen_host")]
    pub host: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_listen_host(),
            port: default_listen_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanionConfig {
    #[serde(default = "default_companion_program")]
    pub program: PathBuf,
    #[serde(default = "default_companion_args")]
    pub args: Vec<String>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            program: default_companion_program(),
            args: default_companion_args(),
        }
    }
}

/// All timeouts in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// How long `start` waits for the companion to connect.
    #[serde(default = "default_connect_ms")]
    pub connect_ms: u64,
    /// Per-read bound once a frame has started arriving.
    #[serde(default = "default_read_ms")]
    pub read_ms: u64,
    /// Wait bound of one event-loop tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Overall deadline of a synchronous request/response exchange.
    #[serde(default = "default_response_ms")]
    pub response_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_ms(),
            read_ms: default_read_ms(),
            tick_ms: default_tick_ms(),
            response_ms: default_response_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn response(&self) -> Duration {
        Duration::from_millis(self.response_ms)
    }
}

/// Upper bounds on length prefixes read from the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    #[serde(default = "default_max_string_bytes")]
    pub max_string_bytes: u32,
    #[serde(default = "default_max_sequence_len")]
    pub max_sequence_len: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_string_bytes: default_max_string_bytes(),
            max_sequence_len: default_max_sequence_len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub listen: ListenConfig,

    #[serde(default)]
    pub companion: CompanionConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            listen: ListenConfig::default(),
            companion: CompanionConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_listen_host() -> String {
    DEFAULT_LISTEN_HOST.to_string()
}
fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}
fn default_companion_program() -> PathBuf {
    PathBuf::from(COMPANION_BINARY)
}
fn default_companion_args() -> Vec<String> {
    vec!["-style".to_string(), "fusion".to_string()]
}
fn default_connect_ms() -> u64 {
    10_000
}
fn default_read_ms() -> u64 {
    3_000
}
fn default_tick_ms() -> u64 {
    200
}
fn default_response_ms() -> u64 {
    10_000
}
fn default_max_string_bytes() -> u32 {
    1024 * 1024
}
fn default_max_sequence_len() -> u32 {
    65_536
}

// ============================================
// IMPLEMENTATION
// ============================================

impl BridgeConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(BridgeConfig)` if loaded successfully or defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: BridgeConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation, serialization,
    /// write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation_error(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        if self.listen.host.parse::<IpAddr>().is_err() {
            return Err(validation_error(format!(
                "Invalid listen host: {} (must be an IP address)",
                self.listen.host
            )));
        }

        if self.companion.program.as_os_str().is_empty() {
            return Err(validation_error(
                "companion.program cannot be empty".to_string(),
            ));
        }

        let timeouts = [
            ("connect_ms", self.timeouts.connect_ms),
            ("read_ms", self.timeouts.read_ms),
            ("tick_ms", self.timeouts.tick_ms),
            ("response_ms", self.timeouts.response_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
            return Err(validation_error(format!(
                "Invalid timeout: {name} must be greater than 0"
            )));
        }

        if self.limits.max_string_bytes == 0 || self.limits.max_sequence_len == 0 {
            return Err(validation_error(
                "Invalid limits: max_string_bytes and max_sequence_len must be greater than 0"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[track_caller]
fn validation_error(reason: String) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason,
    }
}
