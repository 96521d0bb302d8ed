//! Ports module for Checkpoint Sync

pub mod inbound;
pub mod outbound;

pub use inbound::{CheckpointStatus, CheckpointSyncApi, ProcessOutcome};
pub use outbound::{BlockTree, ChainSelector, CheckpointStore, KeyValueStore, PeerNetwork};
