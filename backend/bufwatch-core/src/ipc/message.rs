//! The closed set of frames exchanged with the companion window.

use crate::config::LimitsConfig;
use crate::error::ipc::IpcError;
use crate::ipc::codec::{self, FrameSource, MessageComposer};

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

/// One-byte frame tag. The numeric values are part of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MessageKind {
    /// Host to window, empty payload.
    GetObservedSymbols = 0,
    /// Window to host, string sequence.
    GetObservedSymbolsResponse = 1,
    /// Host to window, string sequence.
    SetAvailableSymbols = 2,
    /// Window to host, single string.
    PlotBufferRequest = 3,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::GetObservedSymbols,
        MessageKind::GetObservedSymbolsResponse,
        MessageKind::SetAvailableSymbols,
        MessageKind::PlotBufferRequest,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = IpcError;

    #[track_caller]
    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(MessageKind::GetObservedSymbols),
            1 => Ok(MessageKind::GetObservedSymbolsResponse),
            2 => Ok(MessageKind::SetAvailableSymbols),
            3 => Ok(MessageKind::PlotBufferRequest),
            _ => Err(IpcError::UnknownKind {
                tag,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            MessageKind::GetObservedSymbols => "GetObservedSymbols",
            MessageKind::GetObservedSymbolsResponse => "GetObservedSymbolsResponse",
            MessageKind::SetAvailableSymbols => "SetAvailableSymbols",
            MessageKind::PlotBufferRequest => "PlotBufferRequest",
        };
        formatter.write_str(name)
    }
}

/// A decoded frame. The payload shape is fixed by the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    GetObservedSymbols,
    GetObservedSymbolsResponse { symbols: Vec<String> },
    SetAvailableSymbols { symbols: Vec<String> },
    PlotBufferRequest { buffer_name: String },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::GetObservedSymbols => MessageKind::GetObservedSymbols,
            Message::GetObservedSymbolsResponse { .. } => MessageKind::GetObservedSymbolsResponse,
            Message::SetAvailableSymbols { .. } => MessageKind::SetAvailableSymbols,
            Message::PlotBufferRequest { .. } => MessageKind::PlotBufferRequest,
        }
    }

    /// Encode the complete frame: tag followed by payload.
    pub fn encode(&self) -> Result<Vec<u8>, IpcError> {
        let mut composer = MessageComposer::new();
        composer.push_kind(self.kind());

        match self {
            Message::GetObservedSymbols => {}
            Message::GetObservedSymbolsResponse { symbols }
            | Message::SetAvailableSymbols { symbols } => {
                composer.push_str_list(symbols)?;
            }
            Message::PlotBufferRequest { buffer_name } => {
                composer.push_str(buffer_name)?;
            }
        }

        Ok(composer.into_bytes())
    }

    /// Decode the payload of a frame whose tag has already been consumed.
    ///
    /// Reads exactly the bytes the payload occupies and nothing more, since the
    /// next frame follows immediately on the same stream.
    pub async fn decode<S: FrameSource>(
        kind: MessageKind,
        source: &mut S,
        limits: &LimitsConfig,
    ) -> Result<Self, IpcError> {
        let message = match kind {
            MessageKind::GetObservedSymbols => Message::GetObservedSymbols,
            MessageKind::GetObservedSymbolsResponse => Message::GetObservedSymbolsResponse {
                symbols: codec::read_string_list(source, limits).await?,
            },
            MessageKind::SetAvailableSymbols => Message::SetAvailableSymbols {
                symbols: codec::read_string_list(source, limits).await?,
            },
            MessageKind::PlotBufferRequest => Message::PlotBufferRequest {
                buffer_name: codec::read_string(source, limits).await?,
            },
        };

        Ok(message)
    }

    /// Read a tag and then its payload.
    pub async fn read_from<S: FrameSource>(
        source: &mut S,
        limits: &LimitsConfig,
    ) -> Result<Self, IpcError> {
        let kind = codec::read_kind(source).await?;
        Self::decode(kind, source, limits).await
    }
}
