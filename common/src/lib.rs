//! Shared building blocks for the bufwatch crates.
//!
//! Every error type in the workspace carries an [`ErrorLocation`] so that a
//! logged failure points straight at the line that produced it.

pub mod error;

pub use error::error_location::ErrorLocation;
