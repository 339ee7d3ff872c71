use bufwatch_core::BridgeConfig;
use bufwatch_core::error::config::ConfigError;

use std::fs;

use tempfile::TempDir;

/// **VALUE**: Verifies a missing config file yields defaults rather than an error.
///
/// **WHY THIS MATTERS**: First launch has no config file.
///
/// **BUG THIS CATCHES**: Would catch `load` failing with a read error on first run.
#[test]
fn given_no_config_file_when_loaded_then_returns_defaults() {
    let dir = TempDir::new().unwrap();

    let config = BridgeConfig::load(dir.path()).unwrap();

    assert_eq!(config, BridgeConfig::default());
}

/// **VALUE**: Verifies a saved config loads back unchanged, into a fresh directory.
///
/// **WHY THIS MATTERS**: Users edit the port and program once and expect them to stick.
///
/// **BUG THIS CATCHES**: Would catch a field missing from serialization or `save`
/// failing on a directory that does not exist yet.
#[test]
fn given_saved_config_when_loaded_then_values_persist() {
    // GIVEN: A customized config saved into a nested directory
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("bufwatch");
    let mut config = BridgeConfig::default();
    config.listen.port = 9700;
    config.timeouts.tick_ms = 50;
    config.companion.args = vec!["--dark".to_string()];

    // WHEN: Saving and loading
    config.save(&config_dir).unwrap();
    let loaded = BridgeConfig::load(&config_dir).unwrap();

    // THEN: Identical, and no temp file left behind
    assert_eq!(loaded, config);
    let leftovers: Vec<_> = fs::read_dir(&config_dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.file_name())
        .collect();
    assert_eq!(leftovers, vec!["config.json"]);
}

/// **VALUE**: Verifies a corrupt file is reported, not silently replaced by defaults.
///
/// **WHY THIS MATTERS**: Falling back would hide a typo and listen on the wrong port.
///
/// **BUG THIS CATCHES**: Would catch `load` swallowing parse errors.
#[test]
fn given_corrupt_json_when_loaded_then_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    let result = BridgeConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Verifies a well-formed file with invalid values fails validation on load.
///
/// **WHY THIS MATTERS**: A zero timeout would make the bridge unusable at debug time.
///
/// **BUG THIS CATCHES**: Would catch `load` skipping `validate`.
#[test]
fn given_invalid_values_when_loaded_then_returns_validation_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.json"),
        r#"{ "timeouts": { "connect_ms": 0 } }"#,
    )
    .unwrap();

    let result = BridgeConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Verifies `save` refuses an invalid config and writes nothing.
///
/// **WHY THIS MATTERS**: A bad config on disk would break the next launch.
///
/// **BUG THIS CATCHES**: Would catch validation running after the write.
#[test]
fn given_invalid_config_when_saved_then_nothing_written() {
    let dir = TempDir::new().unwrap();
    let mut config = BridgeConfig::default();
    config.limits.max_sequence_len = 0;

    let result = config.save(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    assert!(!dir.path().join("config.json").exists());
}
