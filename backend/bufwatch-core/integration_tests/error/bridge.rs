use bufwatch_core::error::BridgeError;
use bufwatch_core::error::config::ConfigError;
use bufwatch_core::error::ipc::IpcError;
use bufwatch_core::error::spawn::SpawnError;
use common::ErrorLocation;

use std::error::Error;
use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

/// **VALUE**: Verifies `BridgeError` shows the wrapped error unchanged.
///
/// **WHY THIS MATTERS**: The host logs `BridgeError`; the inner location must survive.
///
/// **BUG THIS CATCHES**: Would catch a wrapper that adds its own text or drops the location.
#[test]
fn given_wrapped_errors_when_formatted_then_display_is_transparent() {
    // GIVEN: One error of each wrapped kind
    let ipc = IpcError::Bind {
        message: "Could not listen on 127.0.0.1:9588".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let config = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: "tick_ms must be greater than zero".to_string(),
    };
    let ipc_text = ipc.to_string();
    let config_text = config.to_string();

    // WHEN: Wrapping them
    let wrapped_ipc = BridgeError::from(ipc);
    let wrapped_config = BridgeError::from(config);

    // THEN: Display is identical and the location is included
    assert_eq!(wrapped_ipc.to_string(), ipc_text);
    assert_eq!(wrapped_config.to_string(), config_text);
    assert!(ipc_text.contains("bridge.rs"));
}

/// **VALUE**: Verifies a spawn failure keeps its OS error as the source.
///
/// **WHY THIS MATTERS**: "not found" and "permission denied" need different fixes.
///
/// **BUG THIS CATCHES**: Would catch the `#[source]` attribute being dropped.
#[test]
fn given_spawn_error_when_source_requested_then_returns_io_error() {
    let err = SpawnError::Spawn {
        message: "Failed to spawn bufwatch-window".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::PermissionDenied, "denied")),
    };

    let text = err.to_string();
    let source = err.source().expect("Spawn error should have a source");

    assert!(text.contains("Spawn Error"));
    assert!(source.to_string().contains("denied"));
}
