//! Packet payload cursor and writer
//!
//! All integers are big-endian. Strings are a `u16` byte length followed by
//! UTF-8 bytes. "Legacy" longs and shorts are carried as `int32`/`int16` on
//! the wire and widened on read.

use crate::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

/// Numeric message identifier for one client build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Header(pub u16);

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decoded packet: header plus raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(header: Header, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// A packet with no payload
    pub fn empty(header: Header) -> Self {
        Self::new(header, Bytes::new())
    }

    /// Cursor over a cheap clone of the payload
    pub fn reader(&self) -> PacketReader {
        PacketReader::new(self.payload.clone())
    }
}

/// Read cursor over a packet payload
#[derive(Debug, Clone)]
pub struct PacketReader {
    buf: Bytes,
}

impl PacketReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), ProtocolError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(ProtocolError::UnexpectedEof { needed, remaining });
        }
        Ok(())
    }

    pub fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    /// Long identifier carried as an `int32`
    pub fn read_legacy_long(&mut self) -> Result<i64, ProtocolError> {
        self.read_i32().map(i64::from)
    }

    /// Count carried as an `int16`
    pub fn read_legacy_short(&mut self) -> Result<i16, ProtocolError> {
        self.read_i16()
    }

    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        self.ensure(2)?;
        let len = self.buf.get_u16() as usize;
        self.ensure(len)?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidString)
    }
}

/// Payload builder
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.buf.put_i16(value);
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32(value);
        self
    }

    /// Writes an identifier as `int32`; values outside that range are truncated
    pub fn write_legacy_long(&mut self, value: i64) -> &mut Self {
        self.buf.put_i32(value as i32);
        self
    }

    pub fn write_legacy_short(&mut self, value: i16) -> &mut Self {
        self.buf.put_i16(value);
        self
    }

    /// Strings longer than `u16::MAX` bytes are cut at that length
    pub fn write_string(&mut self, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        let len = bytes.len().min(u16::MAX as usize);
        self.buf.put_u16(len as u16);
        self.buf.extend_from_slice(&bytes[..len]);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Finish into a packet with the given header
    pub fn into_packet(self, header: Header) -> Packet {
        Packet::new(header, self.into_bytes())
    }
}
