//! # RocksDB Checkpoint Storage
//!
//! Durable [`KeyValueStore`] for the checkpoint records. The records live in
//! their own column family so they never collide with block data keys.
//! `sync` flushes the write-ahead log with fsync.

use crate::error::{CheckpointError, CheckpointResult};
use crate::ports::outbound::KeyValueStore;
use rocksdb::{ColumnFamilyDescriptor, Options, WriteOptions, DB};
use std::path::Path;

/// Column family holding the checkpoint records
pub const CF_CHECKPOINT: &str = "checkpoint";

pub struct RocksDbKVStore {
    db: DB,
}

impl RocksDbKVStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> CheckpointResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
        let descriptors = vec![ColumnFamilyDescriptor::new(CF_CHECKPOINT, cf_opts)];

        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(|e| {
            CheckpointError::Storage {
                reason: format!("Failed to open RocksDB: {}", e),
            }
        })?;
        Ok(Self { db })
    }

    fn cf(&self) -> CheckpointResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_CHECKPOINT)
            .ok_or_else(|| CheckpointError::Storage {
                reason: format!("missing column family {}", CF_CHECKPOINT),
            })
    }
}

impl KeyValueStore for RocksDbKVStore {
    fn get(&self, key: &[u8]) -> CheckpointResult<Option<Vec<u8>>> {
        self.db
            .get_cf(self.cf()?, key)
            .map_err(|e| CheckpointError::Storage {
                reason: format!("RocksDB get failed: {}", e),
            })
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> CheckpointResult<()> {
        let write_opts = WriteOptions::default();
        self.db
            .put_cf_opt(self.cf()?, key, value, &write_opts)
            .map_err(|e| CheckpointError::Storage {
                reason: format!("RocksDB put failed: {}", e),
            })
    }

    fn sync(&mut self) -> CheckpointResult<()> {
        self.db.flush_wal(true).map_err(|e| CheckpointError::Storage {
            reason: format!("RocksDB WAL flush failed: {}", e),
        })
    }
}
