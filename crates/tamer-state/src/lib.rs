//! Pet inventory state synchronization for Tamer
//!
//! Mirrors the server-side pet inventory inside the client by reassembling
//! multi-packet listings, applying incremental add/remove notifications, and
//! serving the mirrored state to callers through an async load-and-cache
//! protocol.

pub mod assembler;
pub mod cancel;
pub mod config;
pub mod events;
pub mod inventory;
pub mod manager;

pub use assembler::{AssemblerState, FragmentAssembler, FragmentOutcome};
pub use cancel::{CancelHandle, Cancellation};
pub use config::{ManagerConfig, DEFAULT_TIMEOUT};
pub use events::{PetInventoryEvent, SubscriptionId};
pub use inventory::PetInventory;
pub use manager::PetInventoryManager;

use tamer_protocol::ProtocolError;
use thiserror::Error;

/// Failures surfaced to a caller of `get_inventory`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Timed out waiting for the pet inventory")]
    TimedOut,

    #[error("Pet inventory request cancelled")]
    Cancelled,

    #[error("Failed to request pet inventory: {0}")]
    Send(#[from] ProtocolError),

    #[error("Pet inventory manager closed")]
    Closed,
}

/// Fragment sequence errors reported by the assembler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error(
        "Pet inventory load state mismatch: expected {expected_index}/{expected_total}, \
         received {index}/{total} (index/total)"
    )]
    SequenceMismatch {
        expected_index: i32,
        expected_total: i32,
        index: i32,
        total: i32,
    },
}
