//! Adapters module for Checkpoint Sync
//!
//! In-process implementations of the outbound ports.

pub mod block_tree;
pub mod network;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_store;
pub mod store;

pub use block_tree::InMemoryBlockTree;
pub use network::{ChannelNetworkAdapter, NetworkCommand};
#[cfg(feature = "rocksdb")]
pub use rocksdb_store::RocksDbKVStore;
pub use store::{InMemoryKVStore, KvCheckpointStore};
