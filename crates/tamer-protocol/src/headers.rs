//! Header ids for the messages the pet inventory consumes and sends
//!
//! Header values differ between client builds, so they are configuration
//! rather than constants.

use crate::packet::Header;

/// Incoming message kinds understood by the pet inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingKind {
    /// One fragment of the full inventory listing
    PetInventory,
    /// A single pet was added or updated
    PetAddedToInventory,
    /// A single pet was removed
    PetRemovedFromInventory,
}

/// Header mapping for one client build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeaders {
    pub pet_inventory: Header,
    pub pet_added_to_inventory: Header,
    pub pet_removed_from_inventory: Header,
    /// Outgoing zero-payload request for the full listing
    pub get_pet_inventory: Header,
}

impl Default for MessageHeaders {
    fn default() -> Self {
        Self {
            pet_inventory: Header(3522),
            pet_added_to_inventory: Header(2101),
            pet_removed_from_inventory: Header(3253),
            get_pet_inventory: Header(3095),
        }
    }
}

impl MessageHeaders {
    /// Map an incoming header to its kind, if it is one we handle
    pub fn classify(&self, header: Header) -> Option<IncomingKind> {
        if header == self.pet_inventory {
            Some(IncomingKind::PetInventory)
        } else if header == self.pet_added_to_inventory {
            Some(IncomingKind::PetAddedToInventory)
        } else if header == self.pet_removed_from_inventory {
            Some(IncomingKind::PetRemovedFromInventory)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let headers = MessageHeaders::default();
        assert_eq!(
            headers.classify(headers.pet_inventory),
            Some(IncomingKind::PetInventory)
        );
        assert_eq!(
            headers.classify(headers.pet_removed_from_inventory),
            Some(IncomingKind::PetRemovedFromInventory)
        );
        // Outgoing ids are never classified as incoming
        assert_eq!(headers.classify(headers.get_pet_inventory), None);
    }
}
