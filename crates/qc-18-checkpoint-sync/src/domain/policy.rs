//! Enforcement policy and automatic checkpoint selection

use super::block::{BlockRef, Hash};
use crate::ports::outbound::BlockTree;
use serde::{Deserialize, Serialize};

/// Typed enforcement settings, resolved once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementConfig {
    /// Operator consent to switch the active chain to checkpoints
    pub enforce: bool,
    /// `< 0` manual issuance only; `>= 0` auto-select this many blocks behind tip
    pub auto_depth: i64,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            auto_depth: -1,
        }
    }
}

impl EnforcementConfig {
    pub fn is_auto(&self) -> bool {
        self.auto_depth >= 0
    }
}

/// How the node treats checkpoints, as reported to operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscribeMode {
    Enforce,
    Advisory,
}

impl SubscribeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscribeMode::Enforce => "enforce",
            SubscribeMode::Advisory => "advisory",
        }
    }
}

/// A checkpoint master is always self-enforcing.
pub fn is_enforced(enforce: bool, is_master: bool) -> bool {
    enforce || is_master
}

pub fn subscribe_mode(enforce: bool, is_master: bool) -> SubscribeMode {
    if is_enforced(enforce, is_master) {
        SubscribeMode::Enforce
    } else {
        SubscribeMode::Advisory
    }
}

/// Pick the block `depth` blocks behind `tip`.
///
/// Returns `None` in manual mode (`depth < 0`). Stops at genesis if the
/// chain is shorter than `depth`.
pub fn auto_select<T: BlockTree + ?Sized>(tree: &T, tip: &BlockRef, depth: i64) -> Option<Hash> {
    let depth = u64::try_from(depth).ok()?;
    let mut candidate = *tip;
    while candidate.height.saturating_add(depth) > tip.height {
        match tree.parent(&candidate) {
            Some(parent) => candidate = parent,
            None => break,
        }
    }
    Some(candidate.hash)
}
