//! Length-prefixed frame codec
//!
//! Frame layout: `u32` length (header + payload), `u16` header, payload.

use crate::packet::{Header, Packet};
use crate::ProtocolError;
use bytes::{Buf, BufMut, BytesMut};

/// Largest frame body accepted from the wire
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Frame encoder/decoder for a packet stream
pub struct FramedCodec;

impl FramedCodec {
    /// Encode a packet with length prefix
    pub fn encode(packet: &Packet, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let body_len = 2 + packet.payload.len();
        if body_len > MAX_FRAME_LEN {
            return Err(ProtocolError::FrameTooLarge(body_len));
        }

        buf.reserve(4 + body_len);
        buf.put_u32(body_len as u32);
        buf.put_u16(packet.header.0);
        buf.extend_from_slice(&packet.payload);

        Ok(())
    }

    /// Decode a packet from buffer
    /// Returns Some(packet) if a complete frame is available, None if more data needed
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Packet>, ProtocolError> {
        if buf.len() < 4 {
            return Ok(None);
        }

        // Peek at length without consuming
        let mut length_bytes = [0u8; 4];
        length_bytes.copy_from_slice(&buf[..4]);
        let length = u32::from_be_bytes(length_bytes) as usize;

        if length > MAX_FRAME_LEN {
            return Err(ProtocolError::FrameTooLarge(length));
        }
        if length < 2 {
            return Err(ProtocolError::UnexpectedEof {
                needed: 2,
                remaining: length,
            });
        }

        if buf.len() < 4 + length {
            return Ok(None);
        }

        buf.advance(4);
        let mut body = buf.split_to(length);
        let header = Header(body.get_u16());

        Ok(Some(Packet::new(header, body.freeze())))
    }
}
