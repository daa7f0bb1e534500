//! Intercepted packet handed to handlers by the interception layer

use crate::packet::{Header, Packet, PacketReader};

/// Which way a packet was travelling when intercepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// A packet in transit. Handlers may block it so it is not forwarded.
#[derive(Debug, Clone)]
pub struct Intercept {
    direction: Direction,
    packet: Packet,
    blocked: bool,
}

impl Intercept {
    pub fn new(direction: Direction, packet: Packet) -> Self {
        Self {
            direction,
            packet,
            blocked: false,
        }
    }

    pub fn incoming(packet: Packet) -> Self {
        Self::new(Direction::Incoming, packet)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn header(&self) -> Header {
        self.packet.header
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// Fresh cursor at the start of the payload
    pub fn reader(&self) -> PacketReader {
        self.packet.reader()
    }

    /// Stop the packet from being forwarded downstream
    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn into_packet(self) -> Packet {
        self.packet
    }
}
