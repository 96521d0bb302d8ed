//! Driving Ports (API - Inbound)
//!
//! The operations the network handler, the maintenance loop and the
//! operator CLI/RPC layer call into.

use crate::domain::{BlockRef, CheckpointMessage, Hash, PeerId, SubscribeMode};
use crate::error::CheckpointResult;
use async_trait::async_trait;
use serde::Serialize;

/// What happened to an incoming checkpoint message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Became the current checkpoint and was queued for rebroadcast
    Accepted,
    /// Block unknown; stored as pending and requested from the sender
    Pending,
    /// Already implied by the current checkpoint
    Ignored,
    /// Conflicts with the current checkpoint; recorded as invalid
    Rejected,
    /// Signature did not verify against the network key; dropped
    BadSignature,
}

/// Operator-facing snapshot of the checkpoint state.
#[derive(Clone, Debug, Serialize)]
pub struct CheckpointStatus {
    pub current: Option<Hash>,
    pub current_height: Option<u64>,
    pub current_timestamp: Option<u64>,
    pub mode: SubscribeMode,
    pub pending: Option<Hash>,
    pub invalid: Option<Hash>,
    pub warning: Option<String>,
    pub is_master: bool,
}

/// Primary Checkpoint Sync API
#[async_trait]
pub trait CheckpointSyncApi: Send + Sync {
    /// Handle a checkpoint message from the network (`source = None` for local issuance).
    async fn process_incoming(
        &self,
        message: CheckpointMessage,
        source: Option<PeerId>,
    ) -> CheckpointResult<ProcessOutcome>;

    /// Promote the pending checkpoint if its block has arrived.
    async fn accept_pending(&self) -> CheckpointResult<bool>;

    /// Reset to the network's hardened checkpoint (genesis if none).
    async fn reset_to_hardened(&self) -> CheckpointResult<()>;

    /// Re-anchor trust when the persisted master key differs from the network key.
    ///
    /// Returns whether a reset was forced.
    async fn check_master_key(&self) -> CheckpointResult<bool>;

    /// Sign and issue a checkpoint (master only).
    async fn send_checkpoint(&self, hash: Hash) -> CheckpointResult<()>;

    /// Install a master private key after a signing self-test.
    async fn set_master_key(&self, secret: &str) -> CheckpointResult<()>;

    async fn set_enforced(&self, enforce: bool);

    async fn is_enforced(&self) -> bool;

    /// Whether the current checkpoint block is older than `max_age_secs` at `now`.
    async fn is_stale(&self, now: u64, max_age_secs: u64) -> CheckpointResult<bool>;

    /// The hash the configured depth policy would checkpoint; `None` in manual mode.
    async fn auto_select_checkpoint(&self) -> Option<Hash>;

    /// Ask a newly connected peer for the pending checkpoint block.
    async fn ask_for_pending(&self, peer: &PeerId);

    /// Whether a new block with `parent` is consistent with the current checkpoint.
    async fn admits_block(&self, block_hash: &Hash, parent: &BlockRef) -> CheckpointResult<bool>;

    async fn status(&self) -> CheckpointStatus;
}
