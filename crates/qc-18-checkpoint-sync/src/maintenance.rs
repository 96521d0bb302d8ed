//! Periodic checkpoint maintenance
//!
//! Each tick retries the pending checkpoint, lets an auto-mode master issue
//! the next checkpoint, and flags a checkpoint that has grown too old.

use crate::domain::hash_hex;
use crate::error::CheckpointResult;
use crate::ports::inbound::CheckpointSyncApi;
use crate::ports::outbound::{BlockTree, ChainSelector, CheckpointStore, PeerNetwork};
use crate::service::{CheckpointSyncService, WARNING_TOO_OLD};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::task::JoinHandle;

impl<T, C, N, S> CheckpointSyncService<T, C, N, S>
where
    T: BlockTree + 'static,
    C: ChainSelector + 'static,
    N: PeerNetwork + 'static,
    S: CheckpointStore + 'static,
{
    /// Run one maintenance pass at wall-clock time `now` (Unix seconds).
    ///
    /// Only fatal errors are returned; everything else is logged.
    pub async fn run_maintenance_tick(&self, now: u64) -> CheckpointResult<()> {
        if let Err(e) = self.accept_pending().await {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::warn!("[qc-18] Pending sync-checkpoint not accepted: {}", e);
        }

        if self.is_master() && self.config().enforcement().is_auto() {
            if let Some(hash) = self.auto_select_checkpoint().await {
                if self.current_checkpoint() != Some(hash) {
                    match self.send_checkpoint(hash).await {
                        Ok(()) => tracing::info!(
                            "[qc-18] Auto-issued sync-checkpoint {}",
                            hash_hex(&hash)
                        ),
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => tracing::warn!(
                            "[qc-18] Auto checkpoint {} failed: {}",
                            hash_hex(&hash),
                            e
                        ),
                    }
                }
            }
        }

        if self
            .is_stale(now, self.config().max_checkpoint_age_secs)
            .await?
        {
            tracing::warn!("[qc-18] Sync-checkpoint is too old");
            self.raise_warning(WARNING_TOO_OLD);
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Spawn the maintenance loop. It stops when `shutdown` flips to `true`
/// (or its sender is dropped), or on a fatal error.
pub fn spawn_maintenance<T, C, N, S>(
    service: Arc<CheckpointSyncService<T, C, N, S>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    T: BlockTree + 'static,
    C: ChainSelector + 'static,
    N: PeerNetwork + 'static,
    S: CheckpointStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(service.config().maintenance_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = service.run_maintenance_tick(unix_now()).await {
                        tracing::error!("[qc-18] Checkpoint maintenance stopped: {}", e);
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("[qc-18] Checkpoint maintenance shutting down");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        ChannelNetworkAdapter, InMemoryBlockTree, InMemoryKVStore, KvCheckpointStore,
    };
    use crate::config::{CheckpointSyncConfig, NetworkId, NetworkParams};
    use crate::domain::{BlockRef, Hash, MasterKey};
    use std::time::Duration;

    const MASTER_SECRET: &str = "2222222222222222222222222222222222222222222222222222222222222222";

    fn h(height: u64) -> Hash {
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&height.to_be_bytes());
        hash
    }

    type TestService = CheckpointSyncService<
        InMemoryBlockTree,
        InMemoryBlockTree,
        ChannelNetworkAdapter,
        KvCheckpointStore<InMemoryKVStore>,
    >;

    fn node(
        config: CheckpointSyncConfig,
        chain_len: u64,
    ) -> (Arc<TestService>, Arc<InMemoryBlockTree>) {
        let key = MasterKey::from_hex(MASTER_SECRET).unwrap();
        let params = NetworkParams::custom(NetworkId::Testnet, h(0), key.public_key());
        let tree = Arc::new(InMemoryBlockTree::new(BlockRef::genesis(h(0), 0)));
        let mut parent = tree.tip();
        for height in 1..=chain_len {
            let block = BlockRef::child_of(&parent, h(height), height * 60);
            tree.insert(block).unwrap();
            parent = block;
        }
        let (network, _rx) = ChannelNetworkAdapter::new();
        let service = CheckpointSyncService::new(
            config,
            params,
            tree.clone(),
            tree.clone(),
            Arc::new(network),
            KvCheckpointStore::new(InMemoryKVStore::new()),
        )
        .unwrap();
        service.open().unwrap();
        (Arc::new(service), tree)
    }

    #[tokio::test]
    async fn test_auto_master_issues_checkpoint_at_depth() {
        let config = CheckpointSyncConfig {
            checkpoint_depth: 3,
            checkpoint_key: Some(MASTER_SECRET.into()),
            ..CheckpointSyncConfig::for_testing()
        };
        let (service, _tree) = node(config, 10);

        service.run_maintenance_tick(600).await.unwrap();
        assert_eq!(service.current_checkpoint(), Some(h(7)));

        // Nothing new to issue on the next tick.
        service.run_maintenance_tick(600).await.unwrap();
        assert_eq!(service.current_checkpoint(), Some(h(7)));
    }

    #[tokio::test]
    async fn test_manual_master_does_not_auto_issue() {
        let config = CheckpointSyncConfig {
            checkpoint_key: Some(MASTER_SECRET.into()),
            ..CheckpointSyncConfig::for_testing()
        };
        let (service, _tree) = node(config, 10);

        service.run_maintenance_tick(0).await.unwrap();
        assert_eq!(service.current_checkpoint(), Some(h(0)));
    }

    #[tokio::test]
    async fn test_stale_checkpoint_raises_warning() {
        let (service, _tree) = node(CheckpointSyncConfig::for_testing(), 3);

        service.run_maintenance_tick(30).await.unwrap();
        assert!(service.status().await.warning.is_none());

        // Genesis has timestamp 0 and the test config allows 60 seconds.
        service.run_maintenance_tick(61).await.unwrap();
        assert_eq!(
            service.status().await.warning.as_deref(),
            Some(WARNING_TOO_OLD)
        );
    }

    #[tokio::test]
    async fn test_tick_promotes_pending_checkpoint() {
        let key = MasterKey::from_hex(MASTER_SECRET).unwrap();
        let (service, tree) = node(CheckpointSyncConfig::for_testing(), 3);
        service
            .process_incoming(key.sign(&h(4)).unwrap(), None)
            .await
            .unwrap();

        let parent = tree.tip();
        tree.insert(BlockRef::child_of(&parent, h(4), 240)).unwrap();
        service.run_maintenance_tick(240).await.unwrap();

        assert_eq!(service.current_checkpoint(), Some(h(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_on_shutdown() {
        let (service, _tree) = node(CheckpointSyncConfig::for_testing(), 3);
        let (tx, rx) = watch::channel(false);
        let handle = spawn_maintenance(service, rx);

        tokio::time::sleep(Duration::from_secs(3)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
