pub mod bridge;
pub mod companion;
pub mod config;
pub mod error;
pub mod ipc;

#[cfg(test)]
mod tests;

pub use bridge::{Bridge, PlotCallback, PlotStatus};
pub use config::BridgeConfig;

pub const COMPANION_BINARY: &str = "bufwatch-window";
pub const COMPANION_EXECUTABLE: &str =
    const_format::concatcp!(COMPANION_BINARY, std::env::consts::EXE_SUFFIX);
pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: u16 = 9588;
