mod codec;
mod inbox;
mod message;

use crate::error::ipc::IpcError;
use crate::ipc::codec::FrameSource;

use common::ErrorLocation;

use std::collections::VecDeque;
use std::panic::Location;

/// In-memory frame source; running out of bytes behaves like a closed peer.
pub(crate) struct MemorySource {
    bytes: VecDeque<u8>,
}

impl MemorySource {
    pub(crate) fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: VecDeque::from(bytes.into()),
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl FrameSource for MemorySource {
    async fn read_exact(&mut self, count: usize) -> Result<Vec<u8>, IpcError> {
        if self.bytes.len() < count {
            return Err(IpcError::ConnectionClosed {
                message: format!("{} of {count} bytes left", self.bytes.len()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.bytes.drain(..count).collect())
    }
}
