//! Concurrent pet inventory store
//!
//! `PetInventory` is a shared handle: clones observe the same pets. Readers
//! are public; mutation is reserved to the owning manager.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tamer_protocol::InventoryPet;
use tracing::warn;

#[derive(Debug, Default)]
struct Inner {
    items: DashMap<i64, InventoryPet>,
    invalidated: AtomicBool,
}

/// Local mirror of the user's pet inventory, keyed by pet id
#[derive(Debug, Clone, Default)]
pub struct PetInventory {
    inner: Arc<Inner>,
}

impl PetInventory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether two handles point at the same store
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Stale copy that must be refetched before it is trusted
    pub fn is_invalidated(&self) -> bool {
        self.inner.invalidated.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.inner.items.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<InventoryPet> {
        self.inner.items.get(&id).map(|entry| entry.value().clone())
    }

    /// Copy of every pet; order is unspecified
    pub fn snapshot(&self) -> Vec<InventoryPet> {
        self.inner
            .items
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.inner.items.iter().map(|entry| *entry.key()).collect()
    }

    /// Insert only if the id is absent
    pub(crate) fn try_add(&self, pet: InventoryPet) -> bool {
        match self.inner.items.entry(pet.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(pet);
                true
            }
        }
    }

    /// Insert or overwrite; returns true when the id was new
    pub(crate) fn upsert(&self, pet: InventoryPet) -> bool {
        self.inner.items.insert(pet.id, pet).is_none()
    }

    pub(crate) fn try_remove(&self, id: i64) -> Option<InventoryPet> {
        self.inner.items.remove(&id).map(|(_, pet)| pet)
    }

    /// Clear, mark valid, then insert the whole listing.
    /// On a duplicate id inside `pets` the later record wins.
    pub(crate) fn replace_all(&self, pets: impl IntoIterator<Item = InventoryPet>) {
        self.inner.items.clear();
        self.inner.invalidated.store(false, Ordering::Release);

        for pet in pets {
            let id = pet.id;
            if self.inner.items.insert(id, pet).is_some() {
                warn!("Duplicate pet inventory item {} in listing, keeping the later one", id);
            }
        }
    }

    /// Mark stale without discarding contents
    pub(crate) fn invalidate(&self) {
        self.inner.invalidated.store(true, Ordering::Release);
    }
}

impl FromIterator<InventoryPet> for PetInventory {
    fn from_iter<T: IntoIterator<Item = InventoryPet>>(iter: T) -> Self {
        let inventory = Self::new();
        for pet in iter {
            inventory.try_add(pet);
        }
        inventory
    }
}
