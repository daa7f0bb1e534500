//! Reassembly of a pet inventory listing sent as a fragment sequence
//!
//! A sequence is the fragments `0..total` sharing one `total`. Index 0 always
//! restarts assembly. Any other fragment must match the expected index and
//! the recorded total or it is dropped; a mismatch keeps the expectation as
//! it was, so only a fresh index 0 recovers.

use crate::AssemblyError;
use tamer_protocol::{InventoryPet, PetInventoryFragment};
use tracing::trace;

/// Where the assembler is within a sequence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssemblerState {
    #[default]
    Idle,
    Accumulating {
        expected_index: i32,
        total: i32,
        buffer: Vec<InventoryPet>,
    },
    Mismatched {
        expected_index: i32,
        total: i32,
        buffer: Vec<InventoryPet>,
    },
}

/// Result of feeding one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// Accepted; more fragments to come
    Pending { received: i32, total: i32 },
    /// Final fragment accepted; the whole listing in fragment order
    Complete(Vec<InventoryPet>),
    /// Dropped
    Mismatch(AssemblyError),
}

#[derive(Debug, Default)]
pub struct FragmentAssembler {
    state: AssemblerState,
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AssemblerState {
        &self.state
    }

    /// Drop any partial sequence
    pub fn reset(&mut self) {
        self.state = AssemblerState::Idle;
    }

    pub fn push(&mut self, fragment: PetInventoryFragment) -> FragmentOutcome {
        let PetInventoryFragment { total, index, pets } = fragment;

        let (expected_index, expected_total, mut buffer) = if index == 0 {
            trace!("Resetting pet inventory load state");
            (0, total, Vec::new())
        } else {
            match std::mem::take(&mut self.state) {
                AssemblerState::Idle => (0, 0, Vec::new()),
                AssemblerState::Accumulating {
                    expected_index,
                    total,
                    buffer,
                }
                | AssemblerState::Mismatched {
                    expected_index,
                    total,
                    buffer,
                } => (expected_index, total, buffer),
            }
        };

        if index != expected_index || total != expected_total {
            self.state = AssemblerState::Mismatched {
                expected_index,
                total: expected_total,
                buffer,
            };
            return FragmentOutcome::Mismatch(AssemblyError::SequenceMismatch {
                expected_index,
                expected_total,
                index,
                total,
            });
        }

        // `total` comes off the wire unchecked; a sequence whose count can
        // never be reached just stays pending until the next index 0
        let received = index.saturating_add(1);
        trace!("Received pet inventory fragment {} of {}", received, total);
        buffer.extend(pets);

        if index.checked_add(1) == Some(total) {
            trace!("All pet inventory fragments received");
            self.state = AssemblerState::Idle;
            return FragmentOutcome::Complete(buffer);
        }

        self.state = AssemblerState::Accumulating {
            expected_index: received,
            total,
            buffer,
        };
        FragmentOutcome::Pending { received, total }
    }
}
