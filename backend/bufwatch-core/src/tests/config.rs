// Unit tests for config defaults and validation

use crate::config::{BridgeConfig, TimeoutConfig};
use crate::error::config::ConfigError;
use crate::{COMPANION_BINARY, DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT};

use std::path::PathBuf;
use std::time::Duration;

/// **VALUE**: Verifies the defaults match the documented protocol settings.
///
/// **WHY THIS MATTERS**: A host with no config file must still find the window on the
/// usual port and give it ten seconds to connect.
///
/// **BUG THIS CATCHES**: Would catch drifting default port, program or timeouts.
#[test]
fn given_default_config_when_inspected_then_uses_documented_values() {
    // GIVEN/WHEN: Default config
    let config = BridgeConfig::default();

    // THEN: Documented defaults
    assert_eq!(config.listen.host, DEFAULT_LISTEN_HOST);
    assert_eq!(config.listen.port, DEFAULT_LISTEN_PORT);
    assert_eq!(config.companion.program, PathBuf::from(COMPANION_BINARY));
    assert_eq!(config.companion.args, vec!["-style", "fusion"]);
    assert_eq!(config.timeouts.connect(), Duration::from_secs(10));
    assert_eq!(config.timeouts.tick(), Duration::from_millis(200));
    assert!(config.validate().is_ok());
}

/// **VALUE**: Verifies missing fields fall back to defaults when parsing.
///
/// **WHY THIS MATTERS**: Users typically write only the port or the program path.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]`.
#[test]
fn given_partial_json_when_parsed_then_fills_defaults() {
    // GIVEN: JSON that only sets the port
    let json = r#"{ "listen": { "port": 9700 } }"#;

    // WHEN: Parsing
    let config: BridgeConfig = serde_json::from_str(json).unwrap();

    // THEN: Port set, everything else default
    assert_eq!(config.listen.port, 9700);
    assert_eq!(config.listen.host, DEFAULT_LISTEN_HOST);
    assert_eq!(config.timeouts, TimeoutConfig::default());
    assert_eq!(config.version, 1);
}

/// **VALUE**: Verifies a host that is not an IP address is rejected.
///
/// **WHY THIS MATTERS**: The listener binds a literal address; a hostname typo would only
/// surface as a bind failure at debug time.
///
/// **BUG THIS CATCHES**: Would catch the host check being dropped.
#[test]
fn given_non_ip_host_when_validated_then_returns_validation_error() {
    let mut config = BridgeConfig::default();
    config.listen.host = "localhost.invalid".to_string();

    let result = config.validate();

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Verifies zero timeouts are rejected, naming the field.
///
/// **WHY THIS MATTERS**: A zero tick would make the event loop never read.
///
/// **BUG THIS CATCHES**: Would catch a timeout slipping past validation.
#[test]
fn given_zero_timeout_when_validated_then_error_names_field() {
    let mut config = BridgeConfig::default();
    config.timeouts.tick_ms = 0;

    let err = config.validate().expect_err("zero tick must be rejected");

    assert!(err.to_string().contains("tick_ms"));
}

/// **VALUE**: Verifies an empty companion program and an unknown version are rejected.
///
/// **WHY THIS MATTERS**: Both would otherwise fail later with a less helpful error.
///
/// **BUG THIS CATCHES**: Would catch either check being removed.
#[test]
fn given_empty_program_or_future_version_when_validated_then_fails() {
    let mut empty_program = BridgeConfig::default();
    empty_program.companion.program = PathBuf::new();
    assert!(empty_program.validate().is_err());

    let mut future_version = BridgeConfig::default();
    future_version.version = 99;
    assert!(future_version.validate().is_err());
}

/// **VALUE**: Verifies zero limits are rejected.
///
/// **WHY THIS MATTERS**: A zero string limit would reject every non-empty symbol name.
///
/// **BUG THIS CATCHES**: Would catch the limits check being dropped.
#[test]
fn given_zero_limit_when_validated_then_fails() {
    let mut config = BridgeConfig::default();
    config.limits.max_string_bytes = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}
