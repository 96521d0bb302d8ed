//! # Checkpoint Consistency Validation
//!
//! Only a descendant of the current sync-checkpoint may replace it.
//!
//! ```text
//!   candidate at or below current:     candidate above current:
//!
//!        cur                                 cand
//!         │  walk back                         │  walk back
//!         ▼                                    ▼
//!   [height(cand)] == cand ? IgnoreOlder  [height(cur)] == cur ? Accept
//!                          : Conflict                          : Conflict
//! ```
//!
//! A checkpoint that is neither an ancestor nor a descendant of the current
//! one proves a compromised master key, an operator mistake, or a fork.

use super::block::{BlockRef, Hash};
use crate::error::{CheckpointError, CheckpointResult};
use crate::ports::outbound::BlockTree;

/// Result of checking a candidate against the current checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Candidate strictly extends the current checkpoint
    Accept,
    /// Candidate is the current checkpoint or one of its ancestors
    IgnoreOlder,
    /// Candidate is on an incompatible history
    Conflict,
}

/// Validate `candidate` against `current`.
///
/// Both hashes must resolve; an unknown block is a caller error
/// (the pending path should have been taken instead).
pub fn validate<T: BlockTree + ?Sized>(
    candidate: &Hash,
    current: &Hash,
    tree: &T,
) -> CheckpointResult<ValidationOutcome> {
    let cur = tree
        .resolve(current)
        .ok_or(CheckpointError::UnknownBlock { hash: *current })?;
    let cand = tree
        .resolve(candidate)
        .ok_or(CheckpointError::UnknownBlock { hash: *candidate })?;

    if cand.height <= cur.height {
        let ancestor = walk_back_to(tree, cur, cand.height)?;
        if ancestor.hash == *candidate {
            return Ok(ValidationOutcome::IgnoreOlder);
        }
        return Ok(ValidationOutcome::Conflict);
    }

    let ancestor = walk_back_to(tree, cand, cur.height)?;
    if ancestor.hash == *current {
        Ok(ValidationOutcome::Accept)
    } else {
        Ok(ValidationOutcome::Conflict)
    }
}

/// Walk parent links from `from` until `height` is reached.
pub(crate) fn walk_back_to<T: BlockTree + ?Sized>(
    tree: &T,
    from: BlockRef,
    height: u64,
) -> CheckpointResult<BlockRef> {
    let mut block = from;
    while block.height > height {
        block = tree
            .parent(&block)
            .ok_or(CheckpointError::BrokenBlockTree {
                from: from.hash,
                target_height: height,
            })?;
    }
    Ok(block)
}

/// Whether a new block may join the tree given the current checkpoint.
///
/// Above the checkpoint height the block must descend from it; at that height
/// it must be the checkpoint itself; below it, only already-known blocks pass.
pub fn admits_block<T: BlockTree + ?Sized>(
    tree: &T,
    checkpoint: &Hash,
    block_hash: &Hash,
    parent: &BlockRef,
) -> CheckpointResult<bool> {
    let sync = tree
        .resolve(checkpoint)
        .ok_or(CheckpointError::StateDiverged { hash: *checkpoint })?;
    let parent = tree
        .resolve(&parent.hash)
        .ok_or(CheckpointError::UnknownBlock { hash: parent.hash })?;
    let height = parent.height + 1;

    if height > sync.height {
        let ancestor = walk_back_to(tree, parent, sync.height)?;
        return Ok(ancestor.hash == *checkpoint);
    }
    if height == sync.height {
        return Ok(block_hash == checkpoint);
    }
    Ok(tree.resolve(block_hash).is_some())
}
