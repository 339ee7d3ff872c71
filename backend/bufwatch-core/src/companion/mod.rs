//! Launching and supervising the companion window process.
//!
//! The window is an ordinary executable started with the program and
//! arguments from [`crate::config::CompanionConfig`]. The bridge owns the
//! resulting [`CompanionProcess`]:
//! - liveness is an OS-level probe, independent of the socket
//! - the process is killed when the handle is dropped

pub mod process;
pub mod spawn;

pub use process::CompanionProcess;
pub use spawn::spawn_companion;
