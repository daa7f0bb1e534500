//! Pet inventory lifecycle events and the listener registry

use std::sync::{Arc, Mutex, PoisonError};
use tamer_protocol::InventoryPet;

/// Raised synchronously on the dispatch context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetInventoryEvent {
    /// The inventory was fully (re)populated
    Loaded,
    /// The inventory was marked stale
    Invalidated,
    PetAdded(InventoryPet),
    PetUpdated(InventoryPet),
    PetRemoved(InventoryPet),
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&PetInventoryEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Listeners {
    inner: Mutex<ListenerTable>,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

impl Listeners {
    pub(crate) fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(table.next_id);
        table.next_id += 1;
        table.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = table.entries.len();
        table.entries.retain(|(entry_id, _)| *entry_id != id);
        table.entries.len() != before
    }

    /// Call every listener; the table lock is released first so listeners
    /// may subscribe or unsubscribe
    pub(crate) fn emit(&self, event: &PetInventoryEvent) {
        let listeners: Vec<Listener> = {
            let table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            table.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .inner
            .lock()
            .map(|t| t.entries.len())
            .unwrap_or_default();
        f.debug_struct("Listeners").field("count", &count).finish()
    }
}
