//! One fragment of a multi-packet pet inventory listing

use crate::packet::{Header, Packet, PacketReader, PacketWriter};
use crate::pet::InventoryPet;
use crate::ProtocolError;

/// `int32 total, int32 index, int16 count, count × pet record`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetInventoryFragment {
    /// Number of fragments in the sequence
    pub total: i32,
    /// Zero-based position of this fragment
    pub index: i32,
    pub pets: Vec<InventoryPet>,
}

impl PetInventoryFragment {
    pub fn new(total: i32, index: i32, pets: Vec<InventoryPet>) -> Self {
        Self { total, index, pets }
    }

    /// Read `(total, index)`
    pub fn decode_header(reader: &mut PacketReader) -> Result<(i32, i32), ProtocolError> {
        let total = reader.read_i32()?;
        let index = reader.read_i32()?;
        Ok((total, index))
    }

    pub fn decode(reader: &mut PacketReader) -> Result<Self, ProtocolError> {
        let (total, index) = Self::decode_header(reader)?;
        let pets = InventoryPet::decode_list(reader)?;
        Ok(Self { total, index, pets })
    }

    /// Whether this is the final fragment of its sequence
    pub fn is_last(&self) -> bool {
        self.index.checked_add(1) == Some(self.total)
    }

    pub fn compose(&self, writer: &mut PacketWriter) {
        writer.write_i32(self.total).write_i32(self.index);
        InventoryPet::compose_list(&self.pets, writer);
    }

    pub fn to_packet(&self, header: Header) -> Packet {
        let mut writer = PacketWriter::new();
        self.compose(&mut writer);
        writer.into_packet(header)
    }

    /// Split a listing into `chunk` sized fragments, as the server sends it
    pub fn split(pets: &[InventoryPet], chunk: usize) -> Vec<Self> {
        let chunk = chunk.max(1);
        if pets.is_empty() {
            return vec![Self::new(1, 0, Vec::new())];
        }
        let total = pets.len().div_ceil(chunk) as i32;
        pets.chunks(chunk)
            .enumerate()
            .map(|(index, pets)| Self::new(total, index as i32, pets.to_vec()))
            .collect()
    }
}
