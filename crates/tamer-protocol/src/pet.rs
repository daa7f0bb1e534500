//! Pet inventory record codec

use crate::packet::{PacketReader, PacketWriter};
use crate::ProtocolError;

/// One per-part customization of a pet's figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomPart {
    pub layer_id: i32,
    pub part_id: i32,
    pub palette_id: i32,
}

/// A pet held in the user's inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryPet {
    /// Unique within the inventory
    pub id: i64,
    pub name: String,
    pub type_id: i32,
    pub palette_id: i32,
    pub color: String,
    pub breed_id: i32,
    pub custom_parts: Vec<CustomPart>,
    pub level: i32,
}

impl InventoryPet {
    /// Decode a single record from the cursor
    pub fn decode(reader: &mut PacketReader) -> Result<Self, ProtocolError> {
        Self::decode_fields(reader).map_err(|e| match e {
            ProtocolError::MalformedEntity(_) => e,
            other => ProtocolError::MalformedEntity(other.to_string()),
        })
    }

    fn decode_fields(reader: &mut PacketReader) -> Result<Self, ProtocolError> {
        let id = reader.read_legacy_long()?;
        let name = reader.read_string()?;
        let type_id = reader.read_i32()?;
        let palette_id = reader.read_i32()?;
        let color = reader.read_string()?;
        let breed_id = reader.read_i32()?;

        let part_count = reader.read_i32()?;
        if part_count < 0 {
            return Err(ProtocolError::MalformedEntity(format!(
                "negative custom part count {part_count} for pet {id}"
            )));
        }
        // Each part is three int32s; don't trust the count for allocation
        let mut custom_parts = Vec::with_capacity((part_count as usize).min(reader.remaining() / 12));
        for _ in 0..part_count {
            custom_parts.push(CustomPart {
                layer_id: reader.read_i32()?,
                part_id: reader.read_i32()?,
                palette_id: reader.read_i32()?,
            });
        }

        let level = reader.read_i32()?;

        Ok(Self {
            id,
            name,
            type_id,
            palette_id,
            color,
            breed_id,
            custom_parts,
            level,
        })
    }

    /// Decode a legacy-short count followed by that many records
    pub fn decode_list(reader: &mut PacketReader) -> Result<Vec<Self>, ProtocolError> {
        let count = reader.read_legacy_short()?;
        if count < 0 {
            return Err(ProtocolError::MalformedEntity(format!(
                "negative pet count {count}"
            )));
        }

        let mut pets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            pets.push(Self::decode(reader)?);
        }
        Ok(pets)
    }

    /// Write this record in wire order
    pub fn compose(&self, writer: &mut PacketWriter) {
        writer
            .write_legacy_long(self.id)
            .write_string(&self.name)
            .write_i32(self.type_id)
            .write_i32(self.palette_id)
            .write_string(&self.color)
            .write_i32(self.breed_id)
            .write_i32(self.custom_parts.len() as i32);
        for part in &self.custom_parts {
            writer
                .write_i32(part.layer_id)
                .write_i32(part.part_id)
                .write_i32(part.palette_id);
        }
        writer.write_i32(self.level);
    }

    pub fn compose_list(pets: &[Self], writer: &mut PacketWriter) {
        writer.write_legacy_short(pets.len() as i16);
        for pet in pets {
            pet.compose(writer);
        }
    }
}
