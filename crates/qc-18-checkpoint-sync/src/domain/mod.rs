//! Domain module for Checkpoint Sync
//!
//! - block: block references consumed from the block tree
//! - message: signed checkpoint message and wire codec
//! - signer: master key signing, network key verification
//! - validator: ancestor/descendant consistency check
//! - policy: enforcement mode and automatic depth selection
//! - state: the process-wide checkpoint state

pub mod block;
pub mod message;
pub mod policy;
pub mod signer;
pub mod state;
pub mod validator;

pub use block::{hash_hex, BlockRef, Hash, PeerId};
pub use message::{decode_unsigned, encode_unsigned, CheckpointMessage};
pub use policy::{auto_select, is_enforced, EnforcementConfig, SubscribeMode};
pub use signer::{content_hash, MasterKey, NetworkPublicKey};
pub use state::{CheckpointPhase, SyncCheckpointState};
pub use validator::{admits_block, validate, ValidationOutcome};
