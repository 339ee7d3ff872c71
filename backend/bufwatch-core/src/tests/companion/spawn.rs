// Unit tests for spawn module private functions
// Integration tests for the public API are in integration_tests/companion/spawn.rs

use crate::companion::spawn::build_spawn_command;
use crate::{COMPANION_BINARY, COMPANION_EXECUTABLE};

use std::path::Path;

/// **VALUE**: Verifies that `build_spawn_command()` uses the configured program and args.
///
/// **WHY THIS MATTERS**: The window path and its arguments come from configuration now;
/// a refactor that drops the args would start the window with the wrong style.
///
/// **BUG THIS CATCHES**: Would catch a hardcoded program or lost arguments.
#[test]
fn given_program_and_args_when_build_spawn_command_called_then_sets_both() {
    // GIVEN: A program and arguments
    let args = vec!["-style".to_string(), "fusion".to_string()];

    // WHEN: Building the spawn command
    let cmd = build_spawn_command(Path::new("/opt/bufwatch/window"), &args);

    // THEN: Program and args are passed through untouched
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), "/opt/bufwatch/window");
    let passed: Vec<_> = std_cmd.get_args().collect();
    assert_eq!(passed, vec!["-style", "fusion"]);
}

/// **VALUE**: Verifies the local-binary fallback name derives from the binary name.
///
/// **WHY THIS MATTERS**: The fallback looks next to the host executable; on Windows that
/// file carries an `.exe` suffix.
///
/// **BUG THIS CATCHES**: Would catch the executable name drifting from the binary name.
#[test]
fn given_companion_binary_when_executable_name_built_then_starts_with_binary() {
    assert!(COMPANION_EXECUTABLE.starts_with(COMPANION_BINARY));
    assert!(COMPANION_EXECUTABLE.ends_with(std::env::consts::EXE_SUFFIX));
}
