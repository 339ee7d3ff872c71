use common::ErrorLocation;

use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum IpcError {
    #[error("Bind Error: {message} {location}")]
    Bind {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Listening Error: {message} {location}")]
    NotListening {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Connected Error: {message} {location}")]
    NotConnected {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connection Closed Error: {message} {location}")]
    ConnectionClosed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unknown Message Kind Error: tag {tag} {location}")]
    UnknownKind { tag: u8, location: ErrorLocation },

    #[error("Malformed Frame Error: {message} {location}")]
    Malformed {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },
}

impl IpcError {
    /// Errors after which the rest of the byte stream can no longer be trusted
    /// to start on a frame boundary.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            IpcError::UnknownKind { .. } | IpcError::Malformed { .. } | IpcError::Timeout { .. }
        )
    }
}

impl From<IoError> for IpcError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        let location = ErrorLocation::from(Location::caller());

        match error.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => IpcError::ConnectionClosed {
                message: error.to_string(),
                location,
            },
            _ => IpcError::Io {
                message: error.to_string(),
                location,
            },
        }
    }
}
