//! Checkpoint message and its wire codec
//!
//! The signed payload ("unsigned form") is the canonical encoding of a single
//! 256-bit digest. On the wire a message is the pair
//! `(signed_bytes, signature)`; the checkpoint hash is always re-derived from
//! `signed_bytes` and never trusted from elsewhere.

use super::block::Hash;
use crate::error::{CheckpointError, CheckpointResult};
use bincode::Options;
use serde::{Deserialize, Serialize};

/// Upper bound on an encoded wire message (payload + DER signature + prefixes).
pub const MAX_WIRE_MESSAGE_SIZE: u64 = 512;

#[derive(Serialize, Deserialize)]
struct UnsignedCheckpoint {
    checkpoint_hash: Hash,
}

#[derive(Serialize, Deserialize)]
struct WireCheckpoint {
    signed_bytes: Vec<u8>,
    signature: Vec<u8>,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_WIRE_MESSAGE_SIZE)
        .reject_trailing_bytes()
}

/// Canonical serialization of just the checkpoint hash (the bytes that get signed).
pub fn encode_unsigned(hash: &Hash) -> CheckpointResult<Vec<u8>> {
    codec()
        .serialize(&UnsignedCheckpoint {
            checkpoint_hash: *hash,
        })
        .map_err(|e| CheckpointError::MalformedMessage {
            reason: e.to_string(),
        })
}

/// Parse an unsigned payload; anything but exactly one digest is malformed.
pub fn decode_unsigned(bytes: &[u8]) -> CheckpointResult<Hash> {
    codec()
        .deserialize::<UnsignedCheckpoint>(bytes)
        .map(|unsigned| unsigned.checkpoint_hash)
        .map_err(|e| CheckpointError::MalformedMessage {
            reason: format!("signed payload is not a single digest: {}", e),
        })
}

/// A signed sync-checkpoint. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointMessage {
    checkpoint_hash: Hash,
    signed_bytes: Vec<u8>,
    signature: Vec<u8>,
}

impl CheckpointMessage {
    /// Build from raw parts, deriving the hash from `signed_bytes`.
    pub fn from_parts(signed_bytes: Vec<u8>, signature: Vec<u8>) -> CheckpointResult<Self> {
        let checkpoint_hash = decode_unsigned(&signed_bytes)?;
        Ok(Self {
            checkpoint_hash,
            signed_bytes,
            signature,
        })
    }

    /// Decode a message received from the network.
    pub fn decode(bytes: &[u8]) -> CheckpointResult<Self> {
        let wire: WireCheckpoint =
            codec()
                .deserialize(bytes)
                .map_err(|e| CheckpointError::MalformedMessage {
                    reason: e.to_string(),
                })?;
        Self::from_parts(wire.signed_bytes, wire.signature)
    }

    /// Encode for the network.
    pub fn encode(&self) -> CheckpointResult<Vec<u8>> {
        let wire = WireCheckpoint {
            signed_bytes: self.signed_bytes.clone(),
            signature: self.signature.clone(),
        };
        codec()
            .serialize(&wire)
            .map_err(|e| CheckpointError::MalformedMessage {
                reason: e.to_string(),
            })
    }

    pub fn checkpoint_hash(&self) -> &Hash {
        &self.checkpoint_hash
    }

    pub fn signed_bytes(&self) -> &[u8] {
        &self.signed_bytes
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}
