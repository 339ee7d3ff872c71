//! Listening endpoint and the one accepted companion connection.
//!
//! The manager binds a TCP listener, waits a bounded time for exactly one
//! loopback peer and then hands out the resulting [`Channel`]. It never
//! retries on its own: a bind failure is returned to the caller and an accept
//! timeout leaves the listener open for the caller to try again.

use crate::error::ipc::IpcError;
use crate::ipc::channel::Channel;
use crate::ipc::connection_state::ConnectionState;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio::time::{Instant, timeout_at};

pub struct ConnectionManager {
    state: ConnectionState,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    channel: Option<Channel>,
    read_timeout: Duration,
}

impl ConnectionManager {
    /// `read_timeout` bounds every read of a frame that has started arriving.
    pub fn new(read_timeout: Duration) -> Self {
        Self {
            state: ConnectionState::Unbound,
            listener: None,
            local_addr: None,
            channel: None,
            read_timeout,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Address the listener was bound to, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind the listening endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Bind`] if the port is in use, the host is not a
    /// local address or permission is denied.
    pub async fn listen(&mut self, host: &str, port: u16) -> Result<SocketAddr, IpcError> {
        let address = format!("{host}:{port}");

        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| IpcError::Bind {
                message: format!("Could not listen on {address}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let local_addr = listener.local_addr()?;
        info!("Bridge listening on {local_addr}");

        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        self.state = ConnectionState::Listening;
        Ok(local_addr)
    }

    /// Wait up to `timeout` for the companion to connect.
    ///
    /// Returns `Ok(false)` if nobody connected in time; the manager stays in
    /// `Listening`. Connections from non-loopback addresses are dropped and the
    /// wait continues until the deadline.
    pub async fn accept(&mut self, timeout: Duration) -> Result<bool, IpcError> {
        if self.state == ConnectionState::Connected {
            return Ok(true);
        }

        let listener = self.listener.as_ref().ok_or_else(|| IpcError::NotListening {
            message: format!("Cannot accept a client while {}", self.state),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let deadline = Instant::now() + timeout;

        loop {
            match timeout_at(deadline, listener.accept()).await {
                Err(_elapsed) => {
                    warn!("No client connected to the bridge within {timeout:?}");
                    return Ok(false);
                }
                Ok(Err(e)) => return Err(IpcError::from(e)),
                Ok(Ok((stream, peer))) => {
                    if !peer.ip().is_loopback() {
                        warn!("Rejected non-loopback connection from {peer}");
                        continue;
                    }

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Could not disable Nagle on connection from {peer}: {e}");
                    }

                    info!("Companion connected from {peer}");
                    self.channel = Some(Channel::new(stream, peer, self.read_timeout));
                    self.listener = None;
                    self.state = ConnectionState::Connected;
                    return Ok(true);
                }
            }
        }
    }

    /// The live channel, failing fast when there is none.
    #[track_caller]
    pub fn channel_mut(&mut self) -> Result<&mut Channel, IpcError> {
        let state = self.state;

        match self.channel.as_mut() {
            Some(channel) if state.is_connected() => Ok(channel),
            _ => Err(IpcError::NotConnected {
                message: format!("No companion connection (state: {state})"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Drop the connection and the listener. Idempotent.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            info!("Closing companion connection to {}", channel.peer());
        }
        self.listener = None;
        if self.state != ConnectionState::Unbound {
            self.state = ConnectionState::Closed;
        }
    }
}
