//! The accepted companion socket plus a receive buffer.
//!
//! Reads never block past a deadline. The buffer lets the bridge ask "is
//! anything already here?" without waiting, which is what allows a dispatch
//! pass to drain every queued frame and then return immediately.

use crate::error::ipc::IpcError;
use crate::ipc::codec::FrameSource;

use common::ErrorLocation;

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::panic::Location;
use std::time::Duration;

use log::{debug, trace};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};

const READ_CHUNK_SIZE: usize = 8 * 1024;

pub struct Channel {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: Vec<u8>,
    read_timeout: Duration,
    peer_closed: bool,
}

impl Channel {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr, read_timeout: Duration) -> Self {
        Self {
            stream,
            peer,
            buffer: Vec::new(),
            read_timeout,
            peer_closed: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// True once the peer has shut down its write half (EOF was read).
    pub fn is_peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Number of bytes received but not yet consumed.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Write a fully encoded frame.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), IpcError> {
        trace!("Sending {} bytes to {}", bytes.len(), self.peer);

        self.stream
            .write_all(bytes)
            .await
            .map_err(|e| IpcError::Send {
                message: format!("Failed to write frame to {}: {e}", self.peer),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.stream.flush().await.map_err(|e| IpcError::Send {
            message: format!("Failed to flush frame to {}: {e}", self.peer),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Wait up to `timeout` for at least one unread byte.
    ///
    /// Returns `Ok(false)` when nothing arrived in time or the peer is gone
    /// with nothing left buffered. Neither case is an error.
    pub async fn wait_readable(&mut self, timeout: Duration) -> Result<bool, IpcError> {
        let deadline = Instant::now() + timeout;

        loop {
            if !self.buffer.is_empty() {
                return Ok(true);
            }
            if self.peer_closed {
                return Ok(false);
            }

            match timeout_at(deadline, self.stream.readable()).await {
                Err(_elapsed) => return Ok(false),
                Ok(readiness) => {
                    readiness?;
                    self.fill_available()?;
                }
            }
        }
    }

    /// Non-blocking check for unread bytes, pulling in whatever the OS holds.
    pub fn has_buffered(&mut self) -> Result<bool, IpcError> {
        if self.buffer.is_empty() && !self.peer_closed {
            self.fill_available()?;
        }
        Ok(!self.buffer.is_empty())
    }

    /// Drop every byte received so far. Returns how many were dropped.
    pub fn discard_buffered(&mut self) -> usize {
        // A read error here leaves nothing more to discard.
        let _ = self.fill_available();
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    /// Move everything the socket can hand over without waiting into the buffer.
    fn fill_available(&mut self) -> Result<usize, IpcError> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut total = 0;

        loop {
            match self.stream.try_read(&mut chunk) {
                Ok(0) => {
                    if !self.peer_closed {
                        debug!("Peer {} closed the connection", self.peer);
                    }
                    self.peer_closed = true;
                    break;
                }
                Ok(count) => {
                    self.buffer.extend_from_slice(&chunk[..count]);
                    total += count;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    self.peer_closed = true;
                    return Err(IpcError::from(e));
                }
            }
        }

        if total > 0 {
            trace!("Received {total} bytes from {}", self.peer);
        }

        Ok(total)
    }
}

impl FrameSource for Channel {
    async fn read_exact(&mut self, count: usize) -> Result<Vec<u8>, IpcError> {
        let deadline = Instant::now() + self.read_timeout;

        while self.buffer.len() < count {
            if self.peer_closed {
                return Err(IpcError::ConnectionClosed {
                    message: format!(
                        "Peer {} closed the connection with {} of {count} bytes received",
                        self.peer,
                        self.buffer.len()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            match timeout_at(deadline, self.stream.readable()).await {
                Err(_elapsed) => {
                    return Err(IpcError::Timeout {
                        message: format!(
                            "Short read from {}: {} of {count} bytes within {:?}",
                            self.peer,
                            self.buffer.len(),
                            self.read_timeout
                        ),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                Ok(readiness) => {
                    readiness?;
                    self.fill_available()?;
                }
            }
        }

        Ok(self.buffer.drain(..count).collect())
    }
}
