//! Blocking facade over [`Bridge`] for hosts without an async runtime.
//!
//! A debugger extension calls into the bridge from its own thread, one call
//! at a time. [`HostSession`] owns a single-threaded tokio runtime and blocks
//! on each bridge operation, so the bridge only makes progress while the host
//! is inside one of these calls.

use crate::error::HostError;

use bufwatch_core::config::BridgeConfig;
use bufwatch_core::ipc::ConnectionState;
use bufwatch_core::{Bridge, PlotStatus};

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, error, info, warn};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

pub struct HostSession {
    // Declared before the runtime so the companion is killed while it still exists.
    bridge: Bridge,
    runtime: Runtime,
}

impl HostSession {
    /// Build the session. Nothing is bound or spawned until [`HostSession::start`].
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Runtime`] if the tokio runtime cannot be built.
    pub fn new<F>(config: BridgeConfig, plot_callback: F) -> Result<Self, HostError>
    where
        F: FnMut(&str) -> PlotStatus + Send + 'static,
    {
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HostError::Runtime {
                message: format!("Failed to build bridge runtime: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            bridge: Bridge::new(config, plot_callback),
            runtime,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.bridge.state()
    }

    pub fn companion_pid(&self) -> Option<u32> {
        self.bridge.companion_pid()
    }

    /// Listen, launch the window and wait for it to connect.
    ///
    /// Returns `false` on any failure; the cause is logged.
    pub fn start(&mut self) -> bool {
        match self.runtime.block_on(self.bridge.start()) {
            Ok(()) => {
                info!("Companion window ready");
                true
            }
            Err(e) => {
                error!("Failed to start companion window: {e}");
                false
            }
        }
    }

    pub fn is_window_ready(&mut self) -> bool {
        let _runtime = self.runtime.enter();
        self.bridge.is_ready()
    }

    /// Symbols the window currently observes; empty if it could not be asked.
    pub fn get_observed_symbols(&mut self) -> Vec<String> {
        self.runtime.block_on(self.bridge.get_observed_symbols())
    }

    /// Publish the symbols the debugger can show. Failures are logged only.
    pub fn set_available_symbols<S: AsRef<str>>(&mut self, names: &[S]) {
        if let Err(e) = self
            .runtime
            .block_on(self.bridge.set_available_symbols(names))
        {
            warn!("Could not publish available symbols: {e}");
        }
    }

    /// One event-loop tick. Returns the number of plot callbacks made.
    pub fn run_event_loop(&mut self) -> usize {
        match self.runtime.block_on(self.bridge.run_event_loop()) {
            Ok(dispatched) => dispatched,
            Err(e) => {
                debug!("Event loop tick skipped: {e}");
                0
            }
        }
    }

    /// Close the connection and terminate the window.
    pub fn shutdown(&mut self) -> bool {
        self.runtime.block_on(self.bridge.shutdown())
    }
}
