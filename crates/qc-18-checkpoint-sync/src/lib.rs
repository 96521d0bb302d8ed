//! # qc-18-checkpoint-sync
//!
//! Centrally broadcast sync-checkpoints with conflict detection.
//!
//! ## Overview
//!
//! A privileged node (the *checkpoint master*) signs block hashes that the
//! network should converge on. Every node:
//! - **Verifies** the signature against the network's master public key
//! - **Validates** that a new checkpoint descends from the accepted one
//! - **Enforces** it by activating the checkpointed chain, or only warns
//!   (advisory mode)
//! - **Persists** it before exposing it in memory
//!
//! A checkpoint that is neither an ancestor nor a descendant of the current
//! one is recorded as invalid and raises an operator warning; it is never
//! accepted.
//!
//! ## State Machine
//!
//! ```text
//! [NoCheckpoint] ──open/reset──→ [HasCheckpoint] ←──accept_pending── [HasCheckpoint+Pending]
//!                                      │                                      ↑
//!                                      └──── process_incoming (block unknown) ┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_checkpoint_sync::{CheckpointSyncApi, CheckpointSyncConfig, CheckpointSyncService, NetworkParams};
//!
//! let service = CheckpointSyncService::new(
//!     CheckpointSyncConfig::from_env(),
//!     NetworkParams::mainnet()?,
//!     block_tree,
//!     chain_selector,
//!     network,
//!     store,
//! )?;
//! service.open()?;
//!
//! let outcome = service.process_incoming(message, Some(peer)).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod maintenance;
pub mod ports;
pub mod service;

pub use config::{CheckpointSyncConfig, NetworkId, NetworkParams};
pub use domain::{
    BlockRef, CheckpointMessage, CheckpointPhase, EnforcementConfig, Hash, MasterKey,
    NetworkPublicKey, PeerId, SubscribeMode, SyncCheckpointState, ValidationOutcome,
};
pub use error::{CheckpointError, CheckpointResult};
pub use maintenance::spawn_maintenance;
pub use ports::inbound::{CheckpointStatus, CheckpointSyncApi, ProcessOutcome};
pub use ports::outbound::{BlockTree, ChainSelector, CheckpointStore, KeyValueStore, PeerNetwork};
pub use service::CheckpointSyncService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
