//! Checkpoint Sync Service - the sync-checkpoint state machine
//!
//! All state lives behind one lock. Every operation that reads or mutates the
//! checkpoint state holds it for its whole duration, and persistence
//! (`write` + `commit`) always happens under that lock before the in-memory
//! fields change. Rebroadcast happens only after the lock is released.

use crate::config::{CheckpointSyncConfig, NetworkParams};
use crate::domain::policy::subscribe_mode;
use crate::domain::{
    auto_select, hash_hex, is_enforced, validate, BlockRef, CheckpointMessage, Hash, MasterKey,
    PeerId, SyncCheckpointState, ValidationOutcome,
};
use crate::error::{CheckpointError, CheckpointResult};
use crate::ports::inbound::{CheckpointStatus, CheckpointSyncApi, ProcessOutcome};
use crate::ports::outbound::{BlockTree, ChainSelector, CheckpointStore, PeerNetwork};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Warning raised when a checkpoint conflicts with the accepted one.
pub const WARNING_INCONSISTENT: &str =
    "WARNING: Inconsistent checkpoint found! Stop enforcing checkpoints and notify developers to resolve the issue.";

/// Warning raised in advisory mode when the checkpoint is off the active chain.
pub const WARNING_FORK: &str =
    "WARNING: Checkpoint is on a different blockchain fork, contact developers to resolve the issue.";

/// Warning raised when chain selection refuses a checkpointed block.
pub const WARNING_ACTIVATION: &str =
    "WARNING: Unable to switch to the checkpointed chain, contact developers to resolve the issue.";

/// Warning raised when the current checkpoint is older than the configured age.
pub const WARNING_TOO_OLD: &str =
    "WARNING: Checkpoint is too old. Wait for block chain to download, or notify developers.";

/// State guarded by the service lock
struct ServiceState<S> {
    checkpoint: SyncCheckpointState,
    store: S,
    enforce: bool,
    master_key: Option<MasterKey>,
}

impl<S> ServiceState<S> {
    fn is_enforced(&self) -> bool {
        is_enforced(self.enforce, self.master_key.is_some())
    }
}

/// Checkpoint Sync Service implementation
pub struct CheckpointSyncService<T, C, N, S>
where
    T: BlockTree,
    C: ChainSelector,
    N: PeerNetwork,
    S: CheckpointStore,
{
    config: CheckpointSyncConfig,
    params: NetworkParams,
    state: Arc<Mutex<ServiceState<S>>>,
    tree: Arc<T>,
    chain: Arc<C>,
    network: Arc<N>,
}

impl<T, C, N, S> CheckpointSyncService<T, C, N, S>
where
    T: BlockTree,
    C: ChainSelector,
    N: PeerNetwork,
    S: CheckpointStore,
{
    /// Create the service with an empty checkpoint state.
    ///
    /// A configured master key must pass the signing self-test. Call
    /// [`open`](Self::open) before serving requests.
    pub fn new(
        config: CheckpointSyncConfig,
        params: NetworkParams,
        tree: Arc<T>,
        chain: Arc<C>,
        network: Arc<N>,
        store: S,
    ) -> CheckpointResult<Self> {
        let master_key = match config.checkpoint_key.as_deref() {
            Some(secret) => Some(Self::load_master_key(&params, secret)?),
            None => None,
        };

        Ok(Self {
            state: Arc::new(Mutex::new(ServiceState {
                checkpoint: SyncCheckpointState::new(),
                store,
                enforce: config.enforce,
                master_key,
            })),
            config,
            params,
            tree,
            chain,
            network,
        })
    }

    /// Load the persisted checkpoint and re-anchor on the network key.
    ///
    /// Falls back to the hardened checkpoint when nothing usable is stored.
    pub fn open(&self) -> CheckpointResult<()> {
        let mut state = self.state.lock();
        // A new or rotated master key has already reset the checkpoint.
        if self.check_master_key_locked(&mut state)? {
            return Ok(());
        }
        let persisted = state.store.read_checkpoint()?;
        match persisted {
            Some(hash) if self.tree.resolve(&hash).is_some() => {
                state.checkpoint.promote(hash, None);
                tracing::info!("[qc-18] Loaded sync-checkpoint {}", hash_hex(&hash));
            }
            Some(hash) => {
                tracing::warn!(
                    "[qc-18] Persisted sync-checkpoint {} unknown to block tree, resetting",
                    hash_hex(&hash)
                );
                self.reset_locked(&mut state)?;
            }
            None => self.reset_locked(&mut state)?,
        }
        Ok(())
    }

    pub fn config(&self) -> &CheckpointSyncConfig {
        &self.config
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn is_master(&self) -> bool {
        self.state.lock().master_key.is_some()
    }

    pub fn current_checkpoint(&self) -> Option<Hash> {
        self.state.lock().checkpoint.current_hash
    }

    /// Set the operator warning unless a more specific one is already showing.
    pub(crate) fn raise_warning(&self, warning: &str) {
        let mut state = self.state.lock();
        if state.checkpoint.warning.is_none() {
            state.checkpoint.warning = Some(warning.to_string());
        }
    }

    fn load_master_key(params: &NetworkParams, secret: &str) -> CheckpointResult<MasterKey> {
        let key = MasterKey::from_hex(secret)?;
        key.self_test(&params.genesis_hash)?;
        if key.public_key() != params.master_public_key {
            tracing::warn!(
                "[qc-18] Checkpoint key does not match the network master key; issued checkpoints will be rejected"
            );
        }
        Ok(key)
    }

    /// The accepted checkpoint, or genesis before the first one.
    fn anchor(&self, state: &ServiceState<S>) -> CheckpointResult<BlockRef> {
        let hash = state
            .checkpoint
            .current_hash
            .unwrap_or(self.params.genesis_hash);
        self.tree
            .resolve(&hash)
            .ok_or(CheckpointError::StateDiverged { hash })
    }

    /// Validate, possibly activate, persist and promote a known block.
    fn accept_locked(
        &self,
        state: &mut ServiceState<S>,
        hash: Hash,
        message: Option<CheckpointMessage>,
    ) -> CheckpointResult<ProcessOutcome> {
        let current = self.anchor(state)?;
        match validate(&hash, &current.hash, &*self.tree)? {
            ValidationOutcome::IgnoreOlder => return Ok(ProcessOutcome::Ignored),
            ValidationOutcome::Conflict => {
                tracing::warn!(
                    "[qc-18] Sync-checkpoint {} conflicts with current sync-checkpoint {}",
                    hash_hex(&hash),
                    hash_hex(&current.hash)
                );
                state
                    .checkpoint
                    .record_invalid(hash, WARNING_INCONSISTENT.to_string());
                return Ok(ProcessOutcome::Rejected);
            }
            ValidationOutcome::Accept => {}
        }

        let block = self
            .tree
            .resolve(&hash)
            .ok_or(CheckpointError::UnknownBlock { hash })?;
        let mut warning = None;
        if !self.tree.is_active(&block) {
            if state.is_enforced() {
                // Persisting the checkpoint does not depend on activation.
                if let Err(e) = self.chain.activate(&block) {
                    tracing::warn!(
                        "[qc-18] Failed to activate sync-checkpoint {}: {}",
                        hash_hex(&hash),
                        e
                    );
                    warning = Some(WARNING_ACTIVATION);
                }
            } else {
                warning = Some(WARNING_FORK);
            }
        }

        state.store.write_checkpoint(&hash)?;
        state.store.commit()?;
        state.checkpoint.promote(hash, message);
        if let Some(warning) = warning {
            state.checkpoint.warning = Some(warning.to_string());
        }
        tracing::info!(
            "[qc-18] Sync-checkpoint at {} (height {})",
            hash_hex(&hash),
            block.height
        );
        Ok(ProcessOutcome::Accepted)
    }

    /// Reset to the hardened checkpoint while holding the lock.
    fn reset_locked(&self, state: &mut ServiceState<S>) -> CheckpointResult<()> {
        let genesis = self.params.genesis_hash;
        let Some(hardened) = self.params.hardened_checkpoint else {
            return self.persist_reset(state, genesis, None);
        };

        let Some(block) = self.tree.resolve(&hardened) else {
            for peer in self.network.connected_peers() {
                self.network.request_block(&peer, &hardened);
            }
            tracing::info!(
                "[qc-18] Pending hardened sync-checkpoint {}",
                hash_hex(&hardened)
            );
            return self.persist_reset(state, genesis, Some(hardened));
        };

        if !self.tree.is_active(&block) && state.is_enforced() {
            if let Err(e) = self.chain.activate(&block) {
                tracing::warn!(
                    "[qc-18] Failed to activate hardened checkpoint {}: {}",
                    hash_hex(&hardened),
                    e
                );
            }
        }
        let target = if self.tree.is_active(&block) {
            hardened
        } else {
            genesis
        };
        self.persist_reset(state, target, None)
    }

    fn persist_reset(
        &self,
        state: &mut ServiceState<S>,
        target: Hash,
        pending: Option<Hash>,
    ) -> CheckpointResult<()> {
        state.store.write_checkpoint(&target)?;
        state.store.commit()?;
        state.checkpoint.promote(target, None);
        if let Some(pending) = pending {
            state.checkpoint.set_pending(pending, None);
        }
        tracing::info!("[qc-18] Sync-checkpoint reset to {}", hash_hex(&target));
        Ok(())
    }

    /// Rewrite the stored master key and reset when it differs from the network key.
    fn check_master_key_locked(&self, state: &mut ServiceState<S>) -> CheckpointResult<bool> {
        let expected = self.params.master_public_key.to_sec1_bytes();
        if state.store.read_master_public_key()?.as_deref() == Some(expected.as_slice()) {
            return Ok(false);
        }

        tracing::warn!(
            "[qc-18] Checkpoint master key changed to {}, resetting sync-checkpoint",
            hex::encode(&expected)
        );
        state.store.write_master_public_key(&expected)?;
        state.store.commit()?;
        self.reset_locked(state)?;
        Ok(true)
    }

    /// Relay to every connected peer. Failures are logged, never returned.
    async fn broadcast(&self, message: &CheckpointMessage) {
        for peer in self.network.connected_peers() {
            if let Err(e) = self.network.relay_to(&peer, message).await {
                tracing::warn!(
                    "[qc-18] Failed to relay sync-checkpoint {}: {}",
                    hash_hex(message.checkpoint_hash()),
                    e
                );
            }
        }
    }
}

#[async_trait]
impl<T, C, N, S> CheckpointSyncApi for CheckpointSyncService<T, C, N, S>
where
    T: BlockTree + 'static,
    C: ChainSelector + 'static,
    N: PeerNetwork + 'static,
    S: CheckpointStore + 'static,
{
    async fn process_incoming(
        &self,
        message: CheckpointMessage,
        source: Option<PeerId>,
    ) -> CheckpointResult<ProcessOutcome> {
        if !self.params.master_public_key.verify(&message) {
            tracing::debug!(
                "[qc-18] Dropped sync-checkpoint {} with invalid signature",
                hash_hex(message.checkpoint_hash())
            );
            return Ok(ProcessOutcome::BadSignature);
        }
        let hash = *message.checkpoint_hash();

        let outcome = {
            let mut state = self.state.lock();
            if self.tree.resolve(&hash).is_none() {
                state.checkpoint.set_pending(hash, Some(message));
                if let Some(peer) = source.as_ref() {
                    self.network.request_block(peer, &hash);
                }
                tracing::info!("[qc-18] Pending sync-checkpoint {}", hash_hex(&hash));
                return Ok(ProcessOutcome::Pending);
            }
            self.accept_locked(&mut state, hash, Some(message.clone()))?
        };

        if outcome == ProcessOutcome::Accepted {
            self.broadcast(&message).await;
        }
        Ok(outcome)
    }

    async fn accept_pending(&self) -> CheckpointResult<bool> {
        let relay = {
            let mut state = self.state.lock();
            let Some(hash) = state.checkpoint.pending_hash else {
                return Ok(false);
            };
            if self.tree.resolve(&hash).is_none() {
                return Ok(false);
            }
            let message = state.checkpoint.pending_message.clone();
            match self.accept_locked(&mut state, hash, message.clone())? {
                ProcessOutcome::Accepted => message,
                _ => {
                    state.checkpoint.clear_pending();
                    return Ok(false);
                }
            }
        };

        if let Some(message) = relay {
            self.broadcast(&message).await;
        }
        Ok(true)
    }

    async fn reset_to_hardened(&self) -> CheckpointResult<()> {
        let mut state = self.state.lock();
        self.reset_locked(&mut state)
    }

    async fn check_master_key(&self) -> CheckpointResult<bool> {
        let mut state = self.state.lock();
        self.check_master_key_locked(&mut state)
    }

    async fn send_checkpoint(&self, hash: Hash) -> CheckpointResult<()> {
        let message = {
            let state = self.state.lock();
            state
                .master_key
                .as_ref()
                .ok_or(CheckpointError::MasterKeyUnavailable)?
                .sign(&hash)?
        };

        match self.process_incoming(message, None).await? {
            ProcessOutcome::Accepted => Ok(()),
            outcome => {
                tracing::warn!(
                    "[qc-18] Failed to process own sync-checkpoint {}: {:?}",
                    hash_hex(&hash),
                    outcome
                );
                Err(CheckpointError::NotAccepted { hash, outcome })
            }
        }
    }

    async fn set_master_key(&self, secret: &str) -> CheckpointResult<()> {
        let key = Self::load_master_key(&self.params, secret)?;
        self.state.lock().master_key = Some(key);
        tracing::info!("[qc-18] Checkpoint master key installed");
        Ok(())
    }

    async fn set_enforced(&self, enforce: bool) {
        let mut state = self.state.lock();
        state.enforce = enforce;
        if enforce {
            state.checkpoint.warning = None;
        }
    }

    async fn is_enforced(&self) -> bool {
        self.state.lock().is_enforced()
    }

    async fn is_stale(&self, now: u64, max_age_secs: u64) -> CheckpointResult<bool> {
        let state = self.state.lock();
        let block = self.anchor(&state)?;
        Ok(block.timestamp.saturating_add(max_age_secs) < now)
    }

    async fn auto_select_checkpoint(&self) -> Option<Hash> {
        let tip = self.tree.tip();
        auto_select(&*self.tree, &tip, self.config.checkpoint_depth)
    }

    async fn ask_for_pending(&self, peer: &PeerId) {
        let state = self.state.lock();
        if let Some(hash) = state.checkpoint.pending_hash {
            if self.tree.resolve(&hash).is_none() {
                self.network.request_block(peer, &hash);
            }
        }
    }

    async fn admits_block(&self, block_hash: &Hash, parent: &BlockRef) -> CheckpointResult<bool> {
        let state = self.state.lock();
        let checkpoint = self.anchor(&state)?;
        crate::domain::admits_block(&*self.tree, &checkpoint.hash, block_hash, parent)
    }

    async fn status(&self) -> CheckpointStatus {
        let state = self.state.lock();
        let current = state.checkpoint.current_hash;
        let block = current.and_then(|hash| self.tree.resolve(&hash));
        CheckpointStatus {
            current,
            current_height: block.map(|b| b.height),
            current_timestamp: block.map(|b| b.timestamp),
            mode: subscribe_mode(state.enforce, state.master_key.is_some()),
            pending: state.checkpoint.pending_hash,
            invalid: state.checkpoint.invalid_hash,
            warning: state.checkpoint.warning.clone(),
            is_master: state.master_key.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        ChannelNetworkAdapter, InMemoryBlockTree, InMemoryKVStore, KvCheckpointStore,
        NetworkCommand,
    };
    use crate::config::NetworkId;
    use crate::domain::SubscribeMode;
    use tokio::sync::mpsc::UnboundedReceiver;

    const MASTER_SECRET: &str = "1111111111111111111111111111111111111111111111111111111111111111";

    type TestService = CheckpointSyncService<
        InMemoryBlockTree,
        InMemoryBlockTree,
        ChannelNetworkAdapter,
        KvCheckpointStore<InMemoryKVStore>,
    >;

    fn h(branch: u8, height: u64) -> Hash {
        let mut hash = [0u8; 32];
        hash[0] = branch;
        hash[24..].copy_from_slice(&height.to_be_bytes());
        hash
    }

    fn master() -> MasterKey {
        MasterKey::from_hex(MASTER_SECRET).unwrap()
    }

    fn params() -> NetworkParams {
        NetworkParams::custom(NetworkId::Testnet, h(0, 0), master().public_key())
    }

    fn extend(tree: &InMemoryBlockTree, branch: u8, from: u64, to: u64) {
        let mut parent = tree.resolve(&h(0, from)).unwrap();
        if branch != 0 {
            parent = tree.resolve(&h(branch, from)).unwrap_or(parent);
        }
        for height in from + 1..=to {
            let block = BlockRef::child_of(&parent, h(branch, height), height * 600);
            tree.insert(block).unwrap();
            parent = block;
        }
    }

    struct Harness {
        service: TestService,
        tree: Arc<InMemoryBlockTree>,
        network: Arc<ChannelNetworkAdapter>,
        commands: UnboundedReceiver<NetworkCommand>,
        kv: InMemoryKVStore,
    }

    fn harness(config: CheckpointSyncConfig, params: NetworkParams) -> Harness {
        let tree = Arc::new(InMemoryBlockTree::new(BlockRef::genesis(h(0, 0), 0)));
        extend(&tree, 0, 0, 20);
        let (network, commands) = ChannelNetworkAdapter::new();
        let network = Arc::new(network);
        let kv = InMemoryKVStore::new();
        let service = CheckpointSyncService::new(
            config,
            params,
            tree.clone(),
            tree.clone(),
            network.clone(),
            KvCheckpointStore::new(kv.clone()),
        )
        .unwrap();
        service.open().unwrap();
        Harness {
            service,
            tree,
            network,
            commands,
            kv,
        }
    }

    #[tokio::test]
    async fn test_open_without_persisted_state_anchors_genesis() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        assert_eq!(node.service.current_checkpoint(), Some(h(0, 0)));

        let store = KvCheckpointStore::new(node.kv.clone());
        assert_eq!(store.read_checkpoint().unwrap(), Some(h(0, 0)));
        assert_eq!(
            store.read_master_public_key().unwrap(),
            Some(master().public_key().to_sec1_bytes())
        );
    }

    #[tokio::test]
    async fn test_descendant_checkpoint_is_accepted_and_relayed() {
        let mut node = harness(CheckpointSyncConfig::for_testing(), params());
        node.network.peer_connected(PeerId([7; 32]));

        let message = master().sign(&h(0, 10)).unwrap();
        let outcome = node
            .service
            .process_incoming(message.clone(), Some(PeerId([7; 32])))
            .await
            .unwrap();

        assert_eq!(outcome, ProcessOutcome::Accepted);
        assert_eq!(node.service.current_checkpoint(), Some(h(0, 10)));
        match node.commands.try_recv().unwrap() {
            NetworkCommand::Relay { payload, .. } => {
                assert_eq!(CheckpointMessage::decode(&payload).unwrap(), message)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_signature_changes_nothing() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        let forged = MasterKey::from_bytes(&[0x22; 32])
            .unwrap()
            .sign(&h(0, 10))
            .unwrap();

        let outcome = node.service.process_incoming(forged, None).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::BadSignature);
        assert_eq!(node.service.current_checkpoint(), Some(h(0, 0)));
    }

    #[tokio::test]
    async fn test_unknown_block_goes_pending_and_is_requested() {
        let mut node = harness(CheckpointSyncConfig::for_testing(), params());
        let peer = PeerId([3; 32]);
        let message = master().sign(&h(0, 25)).unwrap();

        let outcome = node
            .service
            .process_incoming(message, Some(peer.clone()))
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Pending);
        assert_eq!(
            node.commands.try_recv().unwrap(),
            NetworkCommand::RequestBlock {
                peer,
                hash: h(0, 25)
            }
        );
        assert!(!node.service.accept_pending().await.unwrap());

        extend(&node.tree, 0, 20, 25);
        assert!(node.service.accept_pending().await.unwrap());
        let status = node.service.status().await;
        assert_eq!(status.current, Some(h(0, 25)));
        assert_eq!(status.current_height, Some(25));
        assert!(status.pending.is_none());
    }

    #[tokio::test]
    async fn test_conflicting_pending_is_dropped() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        node.service
            .process_incoming(master().sign(&h(0, 15)).unwrap(), None)
            .await
            .unwrap();
        node.service
            .process_incoming(master().sign(&h(1, 12)).unwrap(), None)
            .await
            .unwrap();

        extend(&node.tree, 1, 10, 12);
        assert!(!node.service.accept_pending().await.unwrap());

        let status = node.service.status().await;
        assert_eq!(status.current, Some(h(0, 15)));
        assert_eq!(status.invalid, Some(h(1, 12)));
        assert!(status.pending.is_none());
    }

    #[tokio::test]
    async fn test_enforced_checkpoint_on_side_branch_is_activated() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        extend(&node.tree, 1, 5, 9);

        let outcome = node
            .service
            .process_incoming(master().sign(&h(1, 9)).unwrap(), None)
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Accepted);
        assert_eq!(node.tree.tip().hash, h(1, 9));
        assert!(node.service.status().await.warning.is_none());
    }

    #[tokio::test]
    async fn test_advisory_checkpoint_on_side_branch_warns() {
        let config = CheckpointSyncConfig {
            enforce: false,
            ..CheckpointSyncConfig::for_testing()
        };
        let node = harness(config, params());
        extend(&node.tree, 1, 5, 9);

        node.service
            .process_incoming(master().sign(&h(1, 9)).unwrap(), None)
            .await
            .unwrap();

        let status = node.service.status().await;
        assert_eq!(status.mode, SubscribeMode::Advisory);
        assert_eq!(status.current, Some(h(1, 9)));
        assert_eq!(status.warning.as_deref(), Some(WARNING_FORK));
        assert_eq!(node.tree.tip().hash, h(0, 20));
    }

    #[tokio::test]
    async fn test_send_checkpoint_requires_master_key() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        assert!(matches!(
            node.service.send_checkpoint(h(0, 5)).await,
            Err(CheckpointError::MasterKeyUnavailable)
        ));

        node.service.set_master_key(MASTER_SECRET).await.unwrap();
        node.service.send_checkpoint(h(0, 5)).await.unwrap();
        assert_eq!(node.service.current_checkpoint(), Some(h(0, 5)));

        let err = node.service.send_checkpoint(h(0, 3)).await.unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::NotAccepted {
                outcome: ProcessOutcome::Ignored,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_master_is_always_enforced() {
        let config = CheckpointSyncConfig {
            enforce: false,
            checkpoint_key: Some(MASTER_SECRET.into()),
            ..CheckpointSyncConfig::for_testing()
        };
        let node = harness(config, params());
        assert!(node.service.is_master());
        assert!(node.service.is_enforced().await);
        assert_eq!(node.service.status().await.mode, SubscribeMode::Enforce);
    }

    #[tokio::test]
    async fn test_invalid_master_key_rejected() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        assert!(matches!(
            node.service.set_master_key("zz").await,
            Err(CheckpointError::InvalidKey { .. })
        ));
        assert!(!node.service.is_master());
    }

    #[tokio::test]
    async fn test_staleness_uses_checkpoint_block_time() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        node.service
            .process_incoming(master().sign(&h(0, 10)).unwrap(), None)
            .await
            .unwrap();

        // Block 10 carries timestamp 6000.
        assert!(!node.service.is_stale(6_500, 600).await.unwrap());
        assert!(node.service.is_stale(6_601, 600).await.unwrap());
    }

    #[tokio::test]
    async fn test_admits_block_checks_checkpoint_ancestry() {
        let node = harness(CheckpointSyncConfig::for_testing(), params());
        extend(&node.tree, 1, 5, 8);
        node.service
            .process_incoming(master().sign(&h(0, 10)).unwrap(), None)
            .await
            .unwrap();

        let tip = node.tree.resolve(&h(0, 20)).unwrap();
        assert!(node.service.admits_block(&h(0, 21), &tip).await.unwrap());
        let side = node.tree.resolve(&h(1, 8)).unwrap();
        assert!(!node.service.admits_block(&h(1, 9), &side).await.unwrap());
    }

    #[tokio::test]
    async fn test_auto_select_follows_configured_depth() {
        let config = CheckpointSyncConfig {
            checkpoint_depth: 5,
            ..CheckpointSyncConfig::for_testing()
        };
        let node = harness(config, params());
        assert_eq!(
            node.service.auto_select_checkpoint().await,
            Some(h(0, 15))
        );
    }

    #[tokio::test]
    async fn test_ask_for_pending_targets_new_peer() {
        let mut node = harness(CheckpointSyncConfig::for_testing(), params());
        node.service
            .process_incoming(master().sign(&h(0, 30)).unwrap(), None)
            .await
            .unwrap();

        let peer = PeerId([9; 32]);
        node.service.ask_for_pending(&peer).await;
        assert_eq!(
            node.commands.try_recv().unwrap(),
            NetworkCommand::RequestBlock {
                peer,
                hash: h(0, 30)
            }
        );
    }
}
