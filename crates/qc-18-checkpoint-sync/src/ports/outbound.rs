//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Block tree, chain selection, network and persistence are collaborators;
//! this subsystem consumes them and implements none of their logic.

use crate::domain::{BlockRef, CheckpointMessage, Hash, PeerId};
use crate::error::CheckpointResult;
use async_trait::async_trait;

/// Read-only view of the block index.
pub trait BlockTree: Send + Sync {
    /// Look up a known block.
    fn resolve(&self, hash: &Hash) -> Option<BlockRef>;

    /// Parent of a block; `None` at genesis or when the index is broken.
    fn parent(&self, block: &BlockRef) -> Option<BlockRef> {
        block.parent.and_then(|hash| self.resolve(&hash))
    }

    /// Tip of the active chain.
    fn tip(&self) -> BlockRef;

    /// Whether the block is part of the active chain.
    fn is_active(&self, block: &BlockRef) -> bool;
}

/// Chain selection: makes a block part of the active chain.
pub trait ChainSelector: Send + Sync {
    fn activate(&self, block: &BlockRef) -> CheckpointResult<()>;
}

/// Peer-to-peer network.
///
/// `request_block` is fire-and-forget and must not block: it is called while
/// the checkpoint state lock is held.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    fn request_block(&self, peer: &PeerId, hash: &Hash);

    fn connected_peers(&self) -> Vec<PeerId>;

    async fn relay_to(&self, peer: &PeerId, message: &CheckpointMessage) -> CheckpointResult<()>;
}

/// Persistence gateway for the two checkpoint records.
///
/// Writes become durable only after `commit`.
pub trait CheckpointStore: Send {
    fn read_checkpoint(&self) -> CheckpointResult<Option<Hash>>;

    fn write_checkpoint(&mut self, hash: &Hash) -> CheckpointResult<()>;

    fn read_master_public_key(&self) -> CheckpointResult<Option<Vec<u8>>>;

    fn write_master_public_key(&mut self, key: &[u8]) -> CheckpointResult<()>;

    fn commit(&mut self) -> CheckpointResult<()>;
}

/// Narrow key-value contract backing [`CheckpointStore`].
pub trait KeyValueStore: Send {
    fn get(&self, key: &[u8]) -> CheckpointResult<Option<Vec<u8>>>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> CheckpointResult<()>;

    /// Durably flush prior writes.
    fn sync(&mut self) -> CheckpointResult<()>;
}
