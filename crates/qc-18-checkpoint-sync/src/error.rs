//! Error types for the Checkpoint Sync subsystem
//!
//! Expected negative outcomes (stale or conflicting checkpoints, bad
//! signatures) are NOT errors: they are reported through
//! [`ValidationOutcome`](crate::domain::ValidationOutcome) and
//! [`ProcessOutcome`](crate::ports::inbound::ProcessOutcome).

use crate::domain::Hash;
use crate::ports::inbound::ProcessOutcome;
use thiserror::Error;

/// Checkpoint Sync subsystem errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// A checkpoint references a block the block tree does not know
    #[error("Block index missing for {}", hex::encode(.hash))]
    UnknownBlock { hash: Hash },

    /// A parent walk ran off the root before reaching the target height.
    ///
    /// The block tree is corrupt; callers must treat this as fatal.
    #[error("Block tree structure failure: parent of {} missing before height {target_height}", hex::encode(.from))]
    BrokenBlockTree { from: Hash, target_height: u64 },

    /// Bytes did not decode to a checkpoint message
    #[error("Malformed checkpoint message: {reason}")]
    MalformedMessage { reason: String },

    /// Private or public key material failed validity checks
    #[error("Invalid checkpoint key: {reason}")]
    InvalidKey { reason: String },

    /// The signature operation itself failed
    #[error("Unable to sign checkpoint: {reason}")]
    SigningFailed { reason: String },

    /// A master-only operation was invoked without a master key
    #[error("Checkpoint master key unavailable")]
    MasterKeyUnavailable,

    /// The master's own acceptance path refused a checkpoint it was about to issue
    #[error("Checkpoint {} not accepted locally: {outcome:?}", hex::encode(.hash))]
    NotAccepted {
        hash: Hash,
        outcome: ProcessOutcome,
    },

    /// The accepted checkpoint no longer resolves in the block tree
    #[error("Block index missing for current sync-checkpoint {}", hex::encode(.hash))]
    StateDiverged { hash: Hash },

    /// Persistence gateway failure
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    /// Chain selection could not activate a block
    #[error("Activation failed: {reason}")]
    Activation { reason: String },

    /// Network collaborator failure
    #[error("Network error: {reason}")]
    Network { reason: String },
}

impl CheckpointError {
    /// Whether the caller should stop the node rather than carry on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CheckpointError::BrokenBlockTree { .. } | CheckpointError::StateDiverged { .. }
        )
    }
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;
