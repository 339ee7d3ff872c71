//! Primitive wire encoding shared by every frame.
//!
//! All integers are little-endian. A string is a `u32` byte length followed by
//! the raw bytes; a string sequence is a `u32` count followed by that many
//! strings. Frame tags are a single byte, see [`MessageKind`].

use crate::config::LimitsConfig;
use crate::error::ipc::IpcError;
use crate::ipc::message::MessageKind;

use common::ErrorLocation;

use std::future::Future;
use std::panic::Location;

/// A byte stream frames are decoded from.
///
/// `read_exact` either yields exactly `count` bytes or fails. Implementations
/// decide how long they are willing to wait; a short read must be reported as
/// an error, never padded.
pub trait FrameSource {
    fn read_exact(&mut self, count: usize)
    -> impl Future<Output = Result<Vec<u8>, IpcError>> + Send;
}

/// Builds an outgoing frame in memory so it can be written in one go.
#[derive(Debug, Default, Clone)]
pub struct MessageComposer {
    buffer: Vec<u8>,
}

impl MessageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_kind(&mut self, kind: MessageKind) -> &mut Self {
        self.buffer.push(kind.tag());
        self
    }

    pub fn push_u32(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a length-prefixed string.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Malformed`] if the string does not fit a `u32` prefix.
    #[track_caller]
    pub fn push_str(&mut self, value: &str) -> Result<&mut Self, IpcError> {
        let length = prefix_for(value.len(), "string length")?;
        self.push_u32(length);
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(self)
    }

    /// Append a count-prefixed sequence of strings, preserving order.
    #[track_caller]
    pub fn push_str_list<S: AsRef<str>>(&mut self, values: &[S]) -> Result<&mut Self, IpcError> {
        let count = prefix_for(values.len(), "sequence length")?;
        self.push_u32(count);
        for value in values {
            self.push_str(value.as_ref())?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[track_caller]
fn prefix_for(length: usize, what: &str) -> Result<u32, IpcError> {
    u32::try_from(length).map_err(|_| IpcError::Malformed {
        message: format!("{what} {length} does not fit a u32 prefix"),
        location: ErrorLocation::from(Location::caller()),
    })
}

pub async fn read_u8<S: FrameSource>(source: &mut S) -> Result<u8, IpcError> {
    let bytes = source.read_exact(1).await?;
    Ok(bytes[0])
}

pub async fn read_u32<S: FrameSource>(source: &mut S) -> Result<u32, IpcError> {
    let bytes = source.read_exact(4).await?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read one frame tag. Out-of-set values are rejected here, before any
/// payload decoding is attempted.
pub async fn read_kind<S: FrameSource>(source: &mut S) -> Result<MessageKind, IpcError> {
    let tag = read_u8(source).await?;
    MessageKind::try_from(tag)
}

/// Read a length-prefixed string.
///
/// The bytes are opaque on the wire; invalid UTF-8 is replaced rather than
/// rejected so that one odd symbol name does not cost the whole frame.
pub async fn read_string<S: FrameSource>(
    source: &mut S,
    limits: &LimitsConfig,
) -> Result<String, IpcError> {
    let length = read_u32(source).await?;

    if length > limits.max_string_bytes {
        return Err(IpcError::Malformed {
            message: format!(
                "String length {length} exceeds limit of {} bytes",
                limits.max_string_bytes
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let bytes = source.read_exact(length as usize).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn read_string_list<S: FrameSource>(
    source: &mut S,
    limits: &LimitsConfig,
) -> Result<Vec<String>, IpcError> {
    let count = read_u32(source).await?;

    if count > limits.max_sequence_len {
        return Err(IpcError::Malformed {
            message: format!(
                "Sequence length {count} exceeds limit of {}",
                limits.max_sequence_len
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut values = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        values.push(read_string(source, limits).await?);
    }

    Ok(values)
}
