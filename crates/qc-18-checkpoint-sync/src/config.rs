//! # Checkpoint Sync Configuration
//!
//! Typed settings resolved once at startup, plus the per-network constants
//! (genesis, hardened checkpoint, checkpoint master public key).

use crate::domain::{EnforcementConfig, Hash, NetworkPublicKey};
use crate::error::{CheckpointError, CheckpointResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Mainnet checkpoint master public key (uncompressed SEC1, hex).
pub const MAINNET_MASTER_PUBKEY: &str = "04c0c707c28533fd5c9f79d2d3a2d80dff259ad8f915241cd14608fb9bc07c74830efe8438f2b272a866b4af5e0c2cc2a9909972aefbd976937e39f46bb38c277c";

/// Testnet checkpoint master public key (uncompressed SEC1, hex).
pub const TESTNET_MASTER_PUBKEY: &str = "0400c195be8d5194007b3f02249f785a51505776bd8f43cc6d49206163e08a63ad9009c814966921c361b14949c51e281edc9347e7ce0e8c57019df1313a6cac7b";

const MAINNET_GENESIS: &str = "0000000032fe677166d54963b62a4677d8957e87c508eaa4fd7eb1c880cd27e3";
const TESTNET_GENESIS: &str = "00000001f757bb737f6596503e17cd17b0658ce630cc727c0cca81aec47c9f06";

/// Default age after which the current checkpoint is reported as stale (24h).
pub const DEFAULT_MAX_CHECKPOINT_AGE_SECS: u64 = 24 * 60 * 60;

/// Node configuration for checkpoint sync.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointSyncConfig {
    /// Switch the active chain to accepted checkpoints (otherwise advisory)
    pub enforce: bool,
    /// `-1` manual issuance; `>= 0` auto-checkpoint this far behind the tip
    pub checkpoint_depth: i64,
    /// Hex-encoded master private key; makes this node the checkpoint master
    pub checkpoint_key: Option<String>,
    pub max_checkpoint_age_secs: u64,
    pub maintenance_interval_secs: u64,
}

impl Default for CheckpointSyncConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            checkpoint_depth: -1,
            checkpoint_key: None,
            max_checkpoint_age_secs: DEFAULT_MAX_CHECKPOINT_AGE_SECS,
            maintenance_interval_secs: 60,
        }
    }
}

impl CheckpointSyncConfig {
    /// Create a config for testing (enforcing, fast maintenance).
    pub fn for_testing() -> Self {
        Self {
            enforce: true,
            checkpoint_depth: -1,
            checkpoint_key: None,
            max_checkpoint_age_secs: 60,
            maintenance_interval_secs: 1,
        }
    }

    /// Defaults overridden from `QC_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup`; unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("QC_ENFORCE_CHECKPOINT") {
            match value.trim() {
                "1" | "true" => config.enforce = true,
                "0" | "false" => config.enforce = false,
                other => warn!("QC_ENFORCE_CHECKPOINT must be a boolean, got {:?}", other),
            }
        }
        if let Some(value) = lookup("QC_CHECKPOINT_DEPTH") {
            match value.trim().parse() {
                Ok(depth) => config.checkpoint_depth = depth,
                Err(_) => warn!("QC_CHECKPOINT_DEPTH must be an integer"),
            }
        }
        if let Some(value) = lookup("QC_CHECKPOINT_KEY") {
            if !value.trim().is_empty() {
                config.checkpoint_key = Some(value);
            }
        }
        if let Some(value) = lookup("QC_CHECKPOINT_MAX_AGE_SECS") {
            match value.trim().parse() {
                Ok(secs) => config.max_checkpoint_age_secs = secs,
                Err(_) => warn!("QC_CHECKPOINT_MAX_AGE_SECS must be an integer"),
            }
        }

        config
    }

    pub fn enforcement(&self) -> EnforcementConfig {
        EnforcementConfig {
            enforce: self.enforce,
            auto_depth: self.checkpoint_depth,
        }
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs.max(1))
    }
}

impl std::fmt::Debug for CheckpointSyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointSyncConfig")
            .field("enforce", &self.enforce)
            .field("checkpoint_depth", &self.checkpoint_depth)
            .field(
                "checkpoint_key",
                &self.checkpoint_key.as_ref().map(|_| "<redacted>"),
            )
            .field("max_checkpoint_age_secs", &self.max_checkpoint_age_secs)
            .field("maintenance_interval_secs", &self.maintenance_interval_secs)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkId {
    Mainnet,
    Testnet,
}

/// Per-network checkpoint constants.
#[derive(Clone, Debug)]
pub struct NetworkParams {
    pub network: NetworkId,
    pub genesis_hash: Hash,
    /// Fallback checkpoint used on reset; genesis when absent
    pub hardened_checkpoint: Option<Hash>,
    pub master_public_key: NetworkPublicKey,
}

impl NetworkParams {
    pub fn mainnet() -> CheckpointResult<Self> {
        Ok(Self {
            network: NetworkId::Mainnet,
            genesis_hash: parse_hash(MAINNET_GENESIS)?,
            hardened_checkpoint: None,
            master_public_key: NetworkPublicKey::from_hex(MAINNET_MASTER_PUBKEY)?,
        })
    }

    pub fn testnet() -> CheckpointResult<Self> {
        Ok(Self {
            network: NetworkId::Testnet,
            genesis_hash: parse_hash(TESTNET_GENESIS)?,
            hardened_checkpoint: None,
            master_public_key: NetworkPublicKey::from_hex(TESTNET_MASTER_PUBKEY)?,
        })
    }

    /// Params for a private network with its own genesis and master key.
    pub fn custom(network: NetworkId, genesis_hash: Hash, master_public_key: NetworkPublicKey) -> Self {
        Self {
            network,
            genesis_hash,
            hardened_checkpoint: None,
            master_public_key,
        }
    }

    pub fn with_hardened_checkpoint(mut self, hash: Hash) -> Self {
        self.hardened_checkpoint = Some(hash);
        self
    }
}

fn parse_hash(encoded: &str) -> CheckpointResult<Hash> {
    let bytes = hex::decode(encoded).map_err(|e| CheckpointError::InvalidKey {
        reason: format!("bad hash constant: {}", e),
    })?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CheckpointError::InvalidKey {
            reason: "hash constant must be 32 bytes".into(),
        })
}
