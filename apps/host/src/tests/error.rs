// Unit tests for the host error type

use crate::error::HostError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that host errors serialize with their variant and message.
///
/// **WHY THIS MATTERS**: Embedding hosts report errors as JSON to their own UI.
///
/// **BUG THIS CATCHES**: Would catch the `Serialize` derive or the tag layout being changed.
#[test]
fn given_host_error_when_serialized_then_contains_type_and_message() {
    // GIVEN: A Bridge error
    let err = HostError::Bridge {
        message: String::from("Companion window did not start"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(&err).expect("HostError should serialize");

    // THEN: Tagged with the variant, message under data
    assert_eq!(json["type"], "Bridge");
    assert_eq!(json["data"]["message"], "Companion window did not start");
    assert!(json["data"]["location"]["line"].as_u64().is_some());
}

/// **VALUE**: Verifies Display names the variant and includes the location.
///
/// **WHY THIS MATTERS**: The binary prints this on exit; it must say where it failed.
///
/// **BUG THIS CATCHES**: Would catch a Display format without the location.
#[test]
fn given_runtime_error_when_displayed_then_includes_location() {
    let err = HostError::Runtime {
        message: "no reactor".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let text = err.to_string();

    assert!(text.starts_with("Runtime Error: no reactor"));
    assert!(text.contains("error.rs"));
}
