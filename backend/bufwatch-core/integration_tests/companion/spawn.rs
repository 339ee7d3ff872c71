use bufwatch_core::companion::spawn_companion;
use bufwatch_core::config::CompanionConfig;
use bufwatch_core::error::spawn::SpawnError;

use std::path::PathBuf;

fn sleep_companion() -> CompanionConfig {
    CompanionConfig {
        program: PathBuf::from("sleep"),
        args: vec!["30".to_string()],
    }
}

/// **VALUE**: Verifies a spawned companion is alive until terminated, then gone.
///
/// **WHY THIS MATTERS**: `is_ready` and shutdown both depend on the OS-level probe.
///
/// **BUG THIS CATCHES**: Would catch a liveness check that ignores exited children, or
/// a terminate that returns before the process is reaped.
#[tokio::test]
async fn given_spawned_companion_when_terminated_then_no_longer_alive() {
    // GIVEN: A running companion found on PATH
    let mut companion = spawn_companion(&sleep_companion()).expect("sleep should spawn");
    assert!(companion.pid() > 0);
    assert!(companion.is_alive());

    // WHEN: Terminating it
    let terminated = companion.terminate().await;

    // THEN: Gone
    assert!(terminated);
    assert!(!companion.is_alive());
}

/// **VALUE**: Verifies a companion that exits by itself is reported dead.
///
/// **WHY THIS MATTERS**: The user closing the window is the common way it goes away.
///
/// **BUG THIS CATCHES**: Would catch zombies being counted as alive.
#[tokio::test]
async fn given_companion_that_exits_when_probed_then_not_alive() {
    // GIVEN: A companion that exits immediately
    let config = CompanionConfig {
        program: PathBuf::from("true"),
        args: Vec::new(),
    };
    let mut companion = spawn_companion(&config).expect("true should spawn");

    // WHEN: Giving it time to exit
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    // THEN: Not alive
    assert!(!companion.is_alive());
}

/// **VALUE**: Verifies a path to a missing program fails with a spawn error carrying the cause.
///
/// **WHY THIS MATTERS**: A broken install must explain itself.
///
/// **BUG THIS CATCHES**: Would catch the local-binary fallback masking an explicit path.
#[tokio::test]
async fn given_missing_program_path_when_spawned_then_returns_spawn_error() {
    let config = CompanionConfig {
        program: PathBuf::from("/nonexistent/bufwatch-window"),
        args: Vec::new(),
    };

    let result = spawn_companion(&config);

    match result {
        Err(SpawnError::Spawn { message, .. }) => {
            assert!(message.contains("/nonexistent/bufwatch-window"));
        }
        other => panic!("Expected SpawnError::Spawn, got {other:?}"),
    }
}

/// **VALUE**: Verifies an empty program path is rejected before touching the OS.
///
/// **WHY THIS MATTERS**: An empty path would otherwise surface as a confusing OS error.
///
/// **BUG THIS CATCHES**: Would catch the validation step being removed.
#[tokio::test]
async fn given_empty_program_when_spawned_then_returns_validation_error() {
    let config = CompanionConfig {
        program: PathBuf::new(),
        args: Vec::new(),
    };

    let result = spawn_companion(&config);

    assert!(matches!(result, Err(SpawnError::Validation { .. })));
}
