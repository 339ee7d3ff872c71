//! The bridge between the debugger host and the companion window.
//!
//! [`Bridge`] is driven entirely by its caller. Nothing reads the socket in
//! the background: the host calls [`Bridge::run_event_loop`] from its own loop
//! and the synchronous request helpers read only while they wait for a reply.
//!
//! # Lifecycle
//!
//! 1. [`Bridge::start`] binds the listener, spawns the window and waits for it
//!    to connect back.
//! 2. The host publishes symbols with [`Bridge::set_available_symbols`] and
//!    queries the window's selection with [`Bridge::get_observed_symbols`].
//! 3. Every tick of [`Bridge::run_event_loop`] hands queued plot requests to
//!    the plot callback.
//! 4. Dropping the bridge kills the window.
//!
//! # Malformed frames
//!
//! Frames carry no length of their own, so after an unknown tag or a broken
//! length prefix there is no way to find the next frame boundary. The bridge
//! logs the violation, abandons every byte it has buffered at that point and
//! keeps the connection. Frames the window writes afterwards decode normally.

use crate::companion::{CompanionProcess, spawn_companion};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::error::ipc::IpcError;
use crate::ipc::{ConnectionManager, ConnectionState, Inbox, Message, MessageKind};

use common::ErrorLocation;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::panic::Location;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::time::Instant;

/// Outcome reported by the host's plot callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotStatus {
    Plotted,
    Failed,
}

/// Invoked once per plot request, with the requested buffer name.
pub type PlotCallback = Box<dyn FnMut(&str) -> PlotStatus + Send>;

pub struct Bridge {
    config: BridgeConfig,
    connection: ConnectionManager,
    companion: Option<CompanionProcess>,
    inbox: Inbox,
    plot_queue: VecDeque<String>,
    plot_callback: PlotCallback,
}

impl Bridge {
    pub fn new<F>(config: BridgeConfig, plot_callback: F) -> Self
    where
        F: FnMut(&str) -> PlotStatus + Send + 'static,
    {
        let connection = ConnectionManager::new(config.timeouts.read());

        Self {
            config,
            connection,
            companion: None,
            inbox: Inbox::new(),
            plot_queue: VecDeque::new(),
            plot_callback: Box::new(plot_callback),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.connection.local_addr()
    }

    pub fn companion_pid(&self) -> Option<u32> {
        self.companion.as_ref().map(CompanionProcess::pid)
    }

    /// Listen, spawn the companion window and wait for it to connect.
    ///
    /// Calling `start` again after the client wait timed out only repeats the
    /// wait; a connected bridge returns `Ok` immediately.
    ///
    /// # Errors
    ///
    /// - [`crate::error::config::ConfigError`] - The config failed validation
    /// - [`IpcError::Bind`] - The listening port could not be bound
    /// - [`crate::error::spawn::SpawnError`] - The window could not be launched
    /// - [`IpcError::NotConnected`] - No client connected within `timeouts.connect_ms`,
    ///   or the bridge was already closed
    pub async fn start(&mut self) -> Result<(), BridgeError> {
        match self.connection.state() {
            ConnectionState::Unbound => {}
            ConnectionState::Listening => return self.wait_for_client().await,
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Closed => {
                return Err(IpcError::NotConnected {
                    message: "Bridge is closed and cannot be restarted".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
                .into());
            }
        }

        self.config.validate()?;

        let host = self.config.listen.host.clone();
        let port = self.config.listen.port;
        if let Err(e) = self.connection.listen(&host, port).await {
            error!("Could not start bridge server: {e}");
            return Err(e.into());
        }

        match spawn_companion(&self.config.companion) {
            Ok(companion) => self.companion = Some(companion),
            Err(e) => {
                error!("Could not launch companion window: {e}");
                self.connection.close();
                return Err(e.into());
            }
        }

        self.wait_for_client().await
    }

    /// Wait up to `timeouts.connect_ms` for the companion to connect.
    ///
    /// The bridge stays listening after a timeout, so the caller may try again.
    pub async fn wait_for_client(&mut self) -> Result<(), BridgeError> {
        let timeout = self.config.timeouts.connect();

        if self.connection.accept(timeout).await? {
            Ok(())
        } else {
            Err(IpcError::NotConnected {
                message: format!("No clients connected to the bridge within {timeout:?}"),
                location: ErrorLocation::from(Location::caller()),
            }
            .into())
        }
    }

    /// True iff the companion is connected and its process is still alive.
    pub fn is_ready(&mut self) -> bool {
        self.connection.state().is_connected()
            && self.companion.as_mut().is_some_and(CompanionProcess::is_alive)
    }

    /// Ask the window which symbols it is currently observing.
    ///
    /// Waits for the reply for at most `timeouts.response_ms`. A lost
    /// connection, a broken stream or a missed deadline all yield an empty
    /// list: to the host, "no symbols" and "could not ask" mean the same thing.
    pub async fn get_observed_symbols(&mut self) -> Vec<String> {
        if self
            .inbox
            .take(MessageKind::GetObservedSymbolsResponse)
            .is_some()
        {
            debug!("Discarding stale observed symbols response");
        }

        if let Err(e) = self.send(&Message::GetObservedSymbols).await {
            warn!("Could not request observed symbols: {e}");
            return Vec::new();
        }

        let deadline = Instant::now() + self.config.timeouts.response();

        loop {
            if let Some(Message::GetObservedSymbolsResponse { symbols }) =
                self.inbox.take(MessageKind::GetObservedSymbolsResponse)
            {
                debug!("Companion observes {} symbols", symbols.len());
                return symbols;
            }

            if !self.connection.state().is_connected() {
                warn!("Connection lost while waiting for observed symbols");
                return Vec::new();
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "No observed symbols response within {:?}",
                    self.config.timeouts.response()
                );
                return Vec::new();
            }

            let wait = (deadline - now).min(self.config.timeouts.read());
            if let Err(e) = self.read_incoming_messages(wait).await {
                warn!("Stopped waiting for observed symbols: {e}");
                return Vec::new();
            }
        }
    }

    /// Publish the symbols the debugger can currently show. No reply is expected.
    pub async fn set_available_symbols<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Result<(), IpcError> {
        let symbols = names.iter().map(|name| name.as_ref().to_string()).collect();
        self.send(&Message::SetAvailableSymbols { symbols }).await
    }

    /// One tick of the host's event loop.
    ///
    /// Reads for at most `timeouts.tick_ms`, then invokes the plot callback for
    /// every queued plot request in arrival order.
    ///
    /// # Returns
    ///
    /// The number of plot requests dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::NotConnected`] when there is no connection and
    /// nothing left to dispatch.
    pub async fn run_event_loop(&mut self) -> Result<usize, IpcError> {
        let tick = self.config.timeouts.tick();

        if let Err(e) = self.read_incoming_messages(tick).await
            && self.plot_queue.is_empty()
        {
            return Err(e);
        }

        Ok(self.dispatch_plot_requests())
    }

    /// Close the connection and terminate the companion, waiting for it to exit.
    ///
    /// Returns `false` if the process was still running when the wait gave up.
    pub async fn shutdown(&mut self) -> bool {
        self.connection.close();
        self.inbox.clear();
        self.plot_queue.clear();

        match self.companion.take() {
            Some(mut companion) => {
                info!("Shutting down companion (PID: {})", companion.pid());
                companion.terminate().await
            }
            None => true,
        }
    }

    async fn send(&mut self, message: &Message) -> Result<(), IpcError> {
        let frame = message.encode()?;
        let channel = self.connection.channel_mut()?;

        trace!("Sending {} frame ({} bytes)", message.kind(), frame.len());

        if let Err(e) = channel.send(&frame).await {
            warn!("Failed to send {} frame: {e}", message.kind());
            self.connection.close();
            return Err(e);
        }

        Ok(())
    }

    /// One read-and-dispatch pass.
    ///
    /// Waits up to `wait` for the first byte, then decodes frames for as long
    /// as bytes are already available, storing each in the inbox. Returns the
    /// number of frames decoded. Only a missing connection is an error; a lost
    /// connection is recorded in the connection state.
    async fn read_incoming_messages(&mut self, wait: Duration) -> Result<usize, IpcError> {
        let limits = self.config.limits;
        let channel = self.connection.channel_mut()?;

        let mut decoded = 0;
        let mut lost = false;

        match channel.wait_readable(wait).await {
            Ok(true) => loop {
                match Message::read_from(channel, &limits).await {
                    Ok(message) => {
                        let kind = message.kind();
                        trace!("Received {kind} frame");
                        self.inbox.store(kind, message);
                        decoded += 1;

                        // Plot requests queue up in arrival order; the slot only
                        // ever holds the one just decoded.
                        if let Some(Message::PlotBufferRequest { buffer_name }) =
                            self.inbox.take(MessageKind::PlotBufferRequest)
                        {
                            self.plot_queue.push_back(buffer_name);
                        }
                    }
                    Err(e) if e.is_protocol_violation() => {
                        let dropped = channel.discard_buffered();
                        warn!("Dropped malformed frame, abandoned {dropped} buffered bytes: {e}");
                        break;
                    }
                    Err(e) => {
                        debug!("Connection lost while reading a frame: {e}");
                        lost = true;
                        break;
                    }
                }

                match channel.has_buffered() {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        debug!("Connection lost while polling for frames: {e}");
                        lost = true;
                        break;
                    }
                }
            },
            Ok(false) => {}
            Err(e) => {
                debug!("Connection lost while waiting for frames: {e}");
                lost = true;
            }
        }

        if lost || (channel.is_peer_closed() && channel.buffered_len() == 0) {
            info!("Companion connection closed");
            self.connection.close();
        }

        if decoded > 0 {
            trace!("Dispatch pass decoded {decoded} frames");
        }

        Ok(decoded)
    }

    fn dispatch_plot_requests(&mut self) -> usize {
        let mut dispatched = 0;

        while let Some(buffer_name) = self.plot_queue.pop_front() {
            debug!("Plot requested for buffer {buffer_name}");
            if (self.plot_callback)(&buffer_name) == PlotStatus::Failed {
                warn!("Plot callback failed for buffer {buffer_name}");
            }
            dispatched += 1;
        }

        dispatched
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Some(companion) = self.companion.as_mut() {
            info!("Killing companion (PID: {})", companion.pid());
            companion.kill();
        }
    }
}
