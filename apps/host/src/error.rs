use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the host application.
///
/// Bridge errors are flattened to their message so the host can report them
/// through whatever channel its embedding environment offers.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum HostError {
    /// Error from this app (logging, directories, startup)
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Error from bufwatch-core (config, bridge, companion)
    #[error("Bridge Error: {message} {location}")]
    Bridge {
        message: String,
        location: ErrorLocation,
    },

    /// The async runtime driving the bridge could not be built
    #[error("Runtime Error: {message} {location}")]
    Runtime {
        message: String,
        location: ErrorLocation,
    },
}
