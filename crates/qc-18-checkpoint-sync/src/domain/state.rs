//! Process-wide sync-checkpoint state
//!
//! Every field is mutated only under the service's single state lock.

use super::block::Hash;
use super::message::CheckpointMessage;

/// Lifecycle phase of the checkpoint state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointPhase {
    NoCheckpoint,
    HasCheckpoint,
    HasCheckpointPending,
}

#[derive(Debug, Default)]
pub struct SyncCheckpointState {
    /// Accepted checkpoint; always a block known to the tree
    pub current_hash: Option<Hash>,
    /// `None` when the current hash came from a reset rather than a message
    pub current_message: Option<CheckpointMessage>,
    /// Verified checkpoint whose block is not yet known
    pub pending_hash: Option<Hash>,
    pub pending_message: Option<CheckpointMessage>,
    /// Last checkpoint that failed consistency validation
    pub invalid_hash: Option<Hash>,
    /// Operator-visible advisory
    pub warning: Option<String>,
}

impl SyncCheckpointState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CheckpointPhase {
        match (self.current_hash, self.pending_hash) {
            (None, _) => CheckpointPhase::NoCheckpoint,
            (Some(_), None) => CheckpointPhase::HasCheckpoint,
            (Some(_), Some(_)) => CheckpointPhase::HasCheckpointPending,
        }
    }

    /// Record a checkpoint awaiting its block. Supersedes any earlier pending one.
    pub fn set_pending(&mut self, hash: Hash, message: Option<CheckpointMessage>) {
        self.pending_hash = Some(hash);
        self.pending_message = message;
    }

    pub fn clear_pending(&mut self) {
        self.pending_hash = None;
        self.pending_message = None;
    }

    /// Install a durable checkpoint as current and drop pending state.
    pub fn promote(&mut self, hash: Hash, message: Option<CheckpointMessage>) {
        self.current_hash = Some(hash);
        self.current_message = message;
        self.clear_pending();
    }

    pub fn record_invalid(&mut self, hash: Hash, warning: String) {
        self.invalid_hash = Some(hash);
        self.warning = Some(warning);
    }
}
