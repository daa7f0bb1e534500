//! Pet inventory manager
//!
//! Owns the mirrored inventory. Inbound packets and the disconnect signal
//! arrive one at a time from the dispatch context; `get_inventory` may be
//! called from any task.

use crate::{
    assembler::{FragmentAssembler, FragmentOutcome},
    cancel::Cancellation,
    config::ManagerConfig,
    events::{Listeners, PetInventoryEvent, SubscriptionId},
    inventory::PetInventory,
    InventoryError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tamer_protocol::{
    Direction, IncomingKind, Intercept, InventoryPet, Packet, PacketSender, PetInventoryFragment,
    ProtocolError,
};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// One resolution of the pending fetch
#[derive(Debug, Clone, Default)]
struct LoadCycle {
    generation: u64,
    inventory: Option<PetInventory>,
}

/// Resets the in-flight flag unless the request went out
struct LoadingGuard<'a> {
    loading: &'a AtomicBool,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(loading: &'a AtomicBool) -> Self {
        Self {
            loading,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.loading.store(false, Ordering::Release);
        }
    }
}

/// Keeps a local mirror of the user's pet inventory
pub struct PetInventoryManager {
    config: ManagerConfig,
    sender: Arc<dyn PacketSender>,
    inventory: RwLock<Option<PetInventory>>,
    /// A fetch this manager requested is outstanding
    loading: AtomicBool,
    assembler: Mutex<FragmentAssembler>,
    load_tx: watch::Sender<LoadCycle>,
    listeners: Listeners,
}

impl PetInventoryManager {
    pub fn new(sender: Arc<dyn PacketSender>, config: ManagerConfig) -> Self {
        let (load_tx, _) = watch::channel(LoadCycle::default());
        Self {
            config,
            sender,
            inventory: RwLock::new(None),
            loading: AtomicBool::new(false),
            assembler: Mutex::new(FragmentAssembler::new()),
            load_tx,
            listeners: Listeners::default(),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Current inventory, if one has been loaded, without fetching
    pub fn inventory(&self) -> Option<PetInventory> {
        self.inventory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a fetch requested by this manager is outstanding
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PetInventoryEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// `get_inventory` with the configured default timeout and no cancellation
    pub async fn fetch(&self) -> Result<PetInventory, InventoryError> {
        self.get_inventory(self.config.default_timeout, Cancellation::never())
            .await
    }

    /// Returns the inventory immediately if it is loaded and valid, otherwise
    /// requests it from the server and waits for the listing to complete.
    ///
    /// Concurrent callers share one request. A zero `timeout` waits without a
    /// timer. The timer and `cancel` race the outbound send as well as the
    /// wait; either only ends this caller's wait.
    pub async fn get_inventory(
        &self,
        timeout: Duration,
        mut cancel: Cancellation,
    ) -> Result<PetInventory, InventoryError> {
        if let Some(inventory) = self.valid_inventory() {
            return Ok(inventory);
        }
        if cancel.is_cancelled() {
            return Err(InventoryError::Cancelled);
        }

        // Subscribe before sending so a fast completion is not missed
        let mut load_rx = self.load_tx.subscribe();
        let seen = load_rx.borrow_and_update().generation;

        // A load may have landed between the first check and subscribing
        if let Some(inventory) = self.valid_inventory() {
            return Ok(inventory);
        }

        let completion = async {
            if let Err(e) = self.request_inventory().await {
                return Err(e);
            }
            match load_rx.wait_for(|cycle| cycle.generation != seen).await {
                Ok(cycle) => cycle.inventory.clone().ok_or(InventoryError::Closed),
                Err(_) => Err(InventoryError::Closed),
            }
        };
        let timer = async {
            if timeout.is_zero() {
                std::future::pending::<()>().await
            } else {
                tokio::time::sleep(timeout).await
            }
        };

        tokio::select! {
            biased;
            result = completion => result,
            _ = cancel.cancelled() => Err(InventoryError::Cancelled),
            _ = timer => {
                debug!("Timed out after {:?} waiting for pet inventory", timeout);
                Err(InventoryError::TimedOut)
            }
        }
    }

    fn valid_inventory(&self) -> Option<PetInventory> {
        self.inventory().filter(|inventory| !inventory.is_invalidated())
    }

    /// Send the request unless one is already outstanding
    async fn request_inventory(&self) -> Result<(), InventoryError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("Pet inventory request already in flight");
            return Ok(());
        }

        // Clears `loading` if the send fails or this future is dropped mid-send
        let guard = LoadingGuard::new(&self.loading);

        debug!("Requesting pet inventory");
        let request = Packet::empty(self.config.headers.get_pet_inventory);
        if let Err(e) = self.sender.send(request).await {
            warn!("Failed to request pet inventory: {}", e);
            return Err(InventoryError::Send(e));
        }

        guard.disarm();
        Ok(())
    }

    /// Mark the loaded inventory stale; the next `get_inventory` refetches
    pub fn invalidate(&self) {
        let Some(inventory) = self.inventory() else {
            return;
        };
        inventory.invalidate();
        debug!("Pet inventory invalidated");
        self.listeners.emit(&PetInventoryEvent::Invalidated);
    }

    /// Route an intercepted packet. Decode failures drop the packet and are
    /// logged; they never reach callers.
    pub fn dispatch(&self, intercept: &mut Intercept) {
        if intercept.direction() != Direction::Incoming {
            return;
        }
        let Some(kind) = self.config.headers.classify(intercept.header()) else {
            return;
        };

        let result = match kind {
            IncomingKind::PetInventory => self.handle_pet_inventory(intercept),
            IncomingKind::PetAddedToInventory => self.handle_pet_added(intercept),
            IncomingKind::PetRemovedFromInventory => self.handle_pet_removed(intercept),
        };

        if let Err(e) = result {
            warn!("Dropping {:?} packet {}: {}", kind, intercept.header(), e);
        }
    }

    /// Handle one fragment of the listing
    pub fn handle_pet_inventory(&self, intercept: &mut Intercept) -> Result<(), ProtocolError> {
        if self.is_loading() {
            intercept.block();
        }

        let fragment = PetInventoryFragment::decode(&mut intercept.reader())?;

        let outcome = self
            .assembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fragment);

        match outcome {
            FragmentOutcome::Pending { .. } => {}
            FragmentOutcome::Mismatch(e) => warn!("{}", e),
            FragmentOutcome::Complete(pets) => self.complete_load(pets),
        }
        Ok(())
    }

    fn complete_load(&self, pets: Vec<InventoryPet>) {
        let inventory = {
            let mut slot = self.inventory.write().unwrap_or_else(PoisonError::into_inner);
            slot.get_or_insert_with(PetInventory::new).clone()
        };
        inventory.replace_all(pets);
        self.loading.store(false, Ordering::Release);

        debug!("Pet inventory loaded with {} pets", inventory.len());

        self.load_tx.send_modify(|cycle| {
            cycle.generation = cycle.generation.wrapping_add(1);
            cycle.inventory = Some(inventory.clone());
        });
        self.listeners.emit(&PetInventoryEvent::Loaded);
    }

    pub fn handle_pet_added(&self, intercept: &mut Intercept) -> Result<(), ProtocolError> {
        let Some(inventory) = self.inventory() else {
            return Ok(());
        };

        let pet = InventoryPet::decode(&mut intercept.reader())?;
        if inventory.upsert(pet.clone()) {
            trace!("Added pet inventory item {}", pet.id);
            self.listeners.emit(&PetInventoryEvent::PetAdded(pet));
        } else {
            trace!("Updated pet inventory item {}", pet.id);
            self.listeners.emit(&PetInventoryEvent::PetUpdated(pet));
        }
        Ok(())
    }

    pub fn handle_pet_removed(&self, intercept: &mut Intercept) -> Result<(), ProtocolError> {
        let Some(inventory) = self.inventory() else {
            return Ok(());
        };

        let id = intercept.reader().read_legacy_long()?;
        match inventory.try_remove(id) {
            Some(pet) => {
                trace!("Pet inventory item {} removed", id);
                self.listeners.emit(&PetInventoryEvent::PetRemoved(pet));
            }
            None => warn!("Failed to find pet inventory item {} to remove", id),
        }
        Ok(())
    }

    /// Session ended: forget the inventory entirely
    pub fn on_disconnected(&self) {
        *self.inventory.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.loading.store(false, Ordering::Release);
        self.assembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        debug!("Pet inventory cleared on disconnect");
    }
}

impl std::fmt::Debug for PetInventoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetInventoryManager")
            .field("config", &self.config)
            .field("loading", &self.is_loading())
            .field("loaded", &self.inventory().is_some())
            .field("listeners", &self.listeners)
            .finish()
    }
}
