//! In-memory block tree and chain selector
//!
//! Block records live in an arena owned by the tree. A child refers to its
//! parent by arena index, so the structure has no shared ownership and no
//! cycles. The active chain is a height-indexed list of arena indices.

use crate::domain::{hash_hex, BlockRef, Hash};
use crate::error::{CheckpointError, CheckpointResult};
use crate::ports::outbound::{BlockTree, ChainSelector};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

struct BlockRecord {
    block: BlockRef,
    parent: Option<usize>,
}

#[derive(Default)]
struct Arena {
    records: Vec<BlockRecord>,
    by_hash: HashMap<Hash, usize>,
    /// `active[h]` is the arena index of the active block at height `h`
    active: Vec<usize>,
}

impl Arena {
    fn get(&self, hash: &Hash) -> Option<&BlockRecord> {
        self.by_hash.get(hash).map(|&idx| &self.records[idx])
    }

    fn tip_index(&self) -> usize {
        // Genesis is inserted on construction, so the active chain is never empty.
        self.active.last().copied().unwrap_or(0)
    }
}

/// Arena-backed block tree implementing [`BlockTree`] and [`ChainSelector`].
pub struct InMemoryBlockTree {
    arena: RwLock<Arena>,
}

impl InMemoryBlockTree {
    pub fn new(genesis: BlockRef) -> Self {
        let mut arena = Arena::default();
        arena.records.push(BlockRecord {
            block: genesis,
            parent: None,
        });
        arena.by_hash.insert(genesis.hash, 0);
        arena.active.push(0);
        Self {
            arena: RwLock::new(arena),
        }
    }

    /// Add a block whose parent is already known.
    ///
    /// A block extending the current tip becomes the new tip; anything else
    /// is stored as a side branch. Re-inserting a known block is a no-op.
    pub fn insert(&self, block: BlockRef) -> CheckpointResult<()> {
        let mut arena = self.arena.write();
        if arena.by_hash.contains_key(&block.hash) {
            return Ok(());
        }

        let parent_hash = block.parent.ok_or(CheckpointError::BrokenBlockTree {
            from: block.hash,
            target_height: 0,
        })?;
        let parent_idx = *arena
            .by_hash
            .get(&parent_hash)
            .ok_or(CheckpointError::UnknownBlock { hash: parent_hash })?;
        let parent_height = arena.records[parent_idx].block.height;
        if block.height != parent_height + 1 {
            return Err(CheckpointError::BrokenBlockTree {
                from: block.hash,
                target_height: parent_height,
            });
        }

        let idx = arena.records.len();
        arena.records.push(BlockRecord {
            block,
            parent: Some(parent_idx),
        });
        arena.by_hash.insert(block.hash, idx);

        if arena.tip_index() == parent_idx {
            arena.active.push(idx);
        }
        Ok(())
    }

    /// Number of known blocks across all branches.
    pub fn len(&self) -> usize {
        self.arena.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockTree for InMemoryBlockTree {
    fn resolve(&self, hash: &Hash) -> Option<BlockRef> {
        self.arena.read().get(hash).map(|record| record.block)
    }

    fn parent(&self, block: &BlockRef) -> Option<BlockRef> {
        let arena = self.arena.read();
        let parent_idx = arena.get(&block.hash)?.parent?;
        Some(arena.records[parent_idx].block)
    }

    fn tip(&self) -> BlockRef {
        let arena = self.arena.read();
        arena.records[arena.tip_index()].block
    }

    fn is_active(&self, block: &BlockRef) -> bool {
        let arena = self.arena.read();
        usize::try_from(block.height)
            .ok()
            .and_then(|height| arena.active.get(height))
            .is_some_and(|&idx| arena.records[idx].block.hash == block.hash)
    }
}

impl ChainSelector for InMemoryBlockTree {
    /// Re-point the active chain at the ancestry of `block`.
    fn activate(&self, block: &BlockRef) -> CheckpointResult<()> {
        let mut arena = self.arena.write();
        let mut cursor = *arena
            .by_hash
            .get(&block.hash)
            .ok_or_else(|| CheckpointError::Activation {
                reason: format!("unknown block {}", hash_hex(&block.hash)),
            })?;

        let mut path = Vec::new();
        loop {
            path.push(cursor);
            match arena.records[cursor].parent {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        path.reverse();
        debug!(
            "[qc-18] Active chain re-pointed to {} at height {}",
            hash_hex(&block.hash),
            path.len() - 1
        );
        arena.active = path;
        Ok(())
    }
}
