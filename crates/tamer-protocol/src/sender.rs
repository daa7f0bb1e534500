//! Outbound send seam

use crate::packet::Packet;
use crate::ProtocolError;
use async_trait::async_trait;

/// Sends packets to the server through the interception layer
#[async_trait]
pub trait PacketSender: Send + Sync {
    async fn send(&self, packet: Packet) -> Result<(), ProtocolError>;
}
