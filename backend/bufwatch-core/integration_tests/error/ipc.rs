use bufwatch_core::error::ipc::IpcError;
use common::ErrorLocation;

use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

/// **VALUE**: Verifies IPC errors carry file/line/column of where they were raised.
///
/// **WHY THIS MATTERS**: The same "not connected" can come from any operation; the location
/// tells which one.
///
/// **BUG THIS CATCHES**: Would catch the location being dropped from the Display format.
#[test]
fn given_ipc_error_when_formatted_then_includes_location() {
    // GIVEN: A NotConnected error with location
    let err = IpcError::NotConnected {
        message: "No companion connection".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Formatting
    let error_string = err.to_string();

    // THEN: Message and file are present
    assert!(error_string.contains("No companion connection"));
    assert!(error_string.contains("ipc.rs"));
}

/// **VALUE**: Verifies an unknown tag error reports the offending byte.
///
/// **WHY THIS MATTERS**: The tag is the first clue when the two ends disagree on the protocol.
///
/// **BUG THIS CATCHES**: Would catch the tag missing from the message.
#[test]
fn given_unknown_kind_when_formatted_then_includes_tag() {
    let err = IpcError::UnknownKind {
        tag: 0xEE,
        location: ErrorLocation::from(Location::caller()),
    };

    let error_string = err.to_string();

    assert!(error_string.contains("tag 238"));
    assert!(err.is_protocol_violation());
}

/// **VALUE**: Verifies socket I/O errors are split into "peer went away" and everything else.
///
/// **WHY THIS MATTERS**: The bridge closes quietly on a hang-up but logs other I/O failures.
///
/// **BUG THIS CATCHES**: Would catch EOF or a reset being reported as a generic I/O error.
#[test]
fn given_io_errors_when_converted_then_hangups_become_connection_closed() {
    for kind in [
        ErrorKind::UnexpectedEof,
        ErrorKind::ConnectionReset,
        ErrorKind::ConnectionAborted,
        ErrorKind::BrokenPipe,
    ] {
        let err = IpcError::from(IoError::new(kind, "gone"));
        assert!(
            matches!(err, IpcError::ConnectionClosed { .. }),
            "{kind:?} should map to ConnectionClosed"
        );
        assert!(!err.is_protocol_violation());
    }

    let other = IpcError::from(IoError::new(ErrorKind::PermissionDenied, "denied"));
    assert!(matches!(other, IpcError::Io { .. }));
}
