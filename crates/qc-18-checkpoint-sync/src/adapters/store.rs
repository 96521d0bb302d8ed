//! Checkpoint persistence over a narrow key-value store

use crate::domain::Hash;
use crate::error::{CheckpointError, CheckpointResult};
use crate::ports::outbound::{CheckpointStore, KeyValueStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Key of the current sync-checkpoint record (32-byte digest).
pub const KEY_SYNC_CHECKPOINT: &[u8] = b"synccheckpoint";
/// Key of the master public key record (raw SEC1 bytes).
pub const KEY_CHECKPOINT_PUBKEY: &[u8] = b"checkpointpubkey";

/// [`CheckpointStore`] backed by any [`KeyValueStore`].
pub struct KvCheckpointStore<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> KvCheckpointStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn inner(&self) -> &K {
        &self.kv
    }
}

impl<K: KeyValueStore> CheckpointStore for KvCheckpointStore<K> {
    fn read_checkpoint(&self) -> CheckpointResult<Option<Hash>> {
        let Some(bytes) = self.kv.get(KEY_SYNC_CHECKPOINT)? else {
            return Ok(None);
        };
        let hash: Hash = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CheckpointError::Storage {
                reason: format!(
                    "corrupt sync-checkpoint record: expected 32 bytes, got {}",
                    bytes.len()
                ),
            })?;
        Ok(Some(hash))
    }

    fn write_checkpoint(&mut self, hash: &Hash) -> CheckpointResult<()> {
        self.kv.put(KEY_SYNC_CHECKPOINT, hash)
    }

    fn read_master_public_key(&self) -> CheckpointResult<Option<Vec<u8>>> {
        self.kv.get(KEY_CHECKPOINT_PUBKEY)
    }

    fn write_master_public_key(&mut self, key: &[u8]) -> CheckpointResult<()> {
        self.kv.put(KEY_CHECKPOINT_PUBKEY, key)
    }

    fn commit(&mut self) -> CheckpointResult<()> {
        self.kv.sync()
    }
}

/// In-memory key-value store for tests and ephemeral nodes.
///
/// Clones share the same data, so a test can keep a handle while the
/// service owns the store.
#[derive(Clone, Default)]
pub struct InMemoryKVStore {
    data: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> CheckpointResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> CheckpointResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn sync(&mut self) -> CheckpointResult<()> {
        Ok(())
    }
}
