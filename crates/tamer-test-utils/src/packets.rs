use tamer_protocol::{
    CustomPart, Intercept, InventoryPet, MessageHeaders, PacketWriter, PetInventoryFragment,
};

/// A pet with predictable filler fields
pub fn pet(id: i64, name: &str, level: i32) -> InventoryPet {
    InventoryPet {
        id,
        name: name.to_string(),
        type_id: (id % 30) as i32,
        palette_id: 1,
        color: "FFFFFF".to_string(),
        breed_id: 0,
        custom_parts: vec![CustomPart {
            layer_id: 1,
            part_id: (id % 7) as i32,
            palette_id: 2,
        }],
        level,
    }
}

/// The listing split into incoming fragment packets of `chunk` pets each
pub fn fragment_packets(
    headers: &MessageHeaders,
    pets: &[InventoryPet],
    chunk: usize,
) -> Vec<Intercept> {
    PetInventoryFragment::split(pets, chunk)
        .iter()
        .map(|fragment| Intercept::incoming(fragment.to_packet(headers.pet_inventory)))
        .collect()
}

pub fn pet_added_packet(headers: &MessageHeaders, pet: &InventoryPet) -> Intercept {
    let mut writer = PacketWriter::new();
    pet.compose(&mut writer);
    Intercept::incoming(writer.into_packet(headers.pet_added_to_inventory))
}

pub fn pet_removed_packet(headers: &MessageHeaders, id: i64) -> Intercept {
    let mut writer = PacketWriter::new();
    writer.write_legacy_long(id);
    Intercept::incoming(writer.into_packet(headers.pet_removed_from_inventory))
}
