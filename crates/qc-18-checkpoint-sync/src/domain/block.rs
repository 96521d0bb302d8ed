//! Block references consumed from the block tree

/// A 32-byte block hash.
pub type Hash = [u8; 32];

/// A peer identifier as known to the network layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub [u8; 32]);

/// Read-only view of a block in the block tree.
///
/// The parent is a key into the tree, not an owning pointer; the tree owns
/// every record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRef {
    pub hash: Hash,
    pub height: u64,
    /// Unix timestamp (seconds)
    pub timestamp: u64,
    /// `None` only for the genesis block
    pub parent: Option<Hash>,
}

impl BlockRef {
    pub fn genesis(hash: Hash, timestamp: u64) -> Self {
        Self {
            hash,
            height: 0,
            timestamp,
            parent: None,
        }
    }

    /// A block extending `parent` by one.
    pub fn child_of(parent: &BlockRef, hash: Hash, timestamp: u64) -> Self {
        Self {
            hash,
            height: parent.height + 1,
            timestamp,
            parent: Some(parent.hash),
        }
    }
}

/// Hex rendering used in logs and status output.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}
