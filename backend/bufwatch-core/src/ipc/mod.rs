//! Host side of the bridge protocol.
//!
//! The companion window connects back to a TCP listener owned by the host.
//! Both ends then exchange frames over that one connection:
//!
//! ```text
//! Frame     ::= Kind Payload
//! Kind      ::= u8
//! String    ::= u32le length, raw bytes
//! StringSeq ::= u32le count, String*
//! ```
//!
//! - [`codec`]: primitive encoding and the [`FrameSource`] abstraction
//! - [`message`]: the closed set of frames and their payload shapes
//! - [`inbox`]: per-kind slots for frames that arrived before anyone asked
//! - [`server`] / [`channel`]: the listener, the accepted socket, its state

pub mod channel;
pub mod codec;
pub mod connection_state;
pub mod inbox;
pub mod message;
pub mod server;

pub use channel::Channel;
pub use codec::{FrameSource, MessageComposer};
pub use connection_state::ConnectionState;
pub use inbox::Inbox;
pub use message::{Message, MessageKind};
pub use server::ConnectionManager;
