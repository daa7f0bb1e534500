//! Wire protocol layer for Tamer
//!
//! Provides the packet cursor and writer, the length-prefixed frame codec,
//! message header mapping, and the codecs for pet inventory records.

pub mod fragment;
pub mod frame;
pub mod headers;
pub mod intercept;
pub mod packet;
pub mod pet;
pub mod sender;

pub use fragment::PetInventoryFragment;
pub use frame::{FramedCodec, MAX_FRAME_LEN};
pub use headers::{IncomingKind, MessageHeaders};
pub use intercept::{Direction, Intercept};
pub use packet::{Header, Packet, PacketReader, PacketWriter};
pub use pet::{CustomPart, InventoryPet};
pub use sender::PacketSender;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unexpected end of packet: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Invalid UTF-8 in string field")]
    InvalidString,

    #[error("Malformed pet record: {0}")]
    MalformedEntity(String),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Send failed: {0}")]
    Send(String),
}
