//! # Checkpoint Signing (secp256k1)
//!
//! The content hash of a message is double SHA-256 over `signed_bytes`;
//! signatures are DER-encoded ECDSA over that prehash.
//!
//! Verification failure is an expected outcome (wrong network key, forged
//! message) and is reported as `false`, never as an error.

use super::block::Hash;
use super::message::{decode_unsigned, encode_unsigned, CheckpointMessage};
use crate::error::{CheckpointError, CheckpointResult};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Double SHA-256 of a signed payload.
pub fn content_hash(bytes: &[u8]) -> Hash {
    let first = Sha256::digest(bytes);
    Sha256::digest(first).into()
}

/// The network-wide checkpoint master public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkPublicKey(VerifyingKey);

impl NetworkPublicKey {
    /// Parse SEC1 bytes (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> CheckpointResult<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CheckpointError::InvalidKey {
                reason: "not a valid secp256k1 public key".into(),
            })
    }

    /// Parse a hex-encoded SEC1 key.
    pub fn from_hex(encoded: &str) -> CheckpointResult<Self> {
        let bytes = hex::decode(encoded.trim()).map_err(|e| CheckpointError::InvalidKey {
            reason: format!("public key is not hex: {}", e),
        })?;
        Self::from_sec1_bytes(&bytes)
    }

    /// Uncompressed SEC1 encoding; this is the persisted form.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Verify a message's signature against this key.
    ///
    /// On success the message's hash is guaranteed to be the digest encoded
    /// in its signed payload.
    pub fn verify(&self, message: &CheckpointMessage) -> bool {
        let Ok(signature) = Signature::from_der(message.signature()) else {
            return false;
        };
        let digest = content_hash(message.signed_bytes());
        if self.0.verify_prehash(&digest, &signature).is_err() {
            return false;
        }
        matches!(
            decode_unsigned(message.signed_bytes()),
            Ok(hash) if &hash == message.checkpoint_hash()
        )
    }
}

/// The checkpoint master private key. Held in memory only.
pub struct MasterKey {
    signing_key: SigningKey,
}

impl MasterKey {
    /// Decode a hex-encoded 32-byte secret.
    pub fn from_hex(secret: &str) -> CheckpointResult<Self> {
        let bytes = Zeroizing::new(hex::decode(secret.trim()).map_err(|_| {
            CheckpointError::InvalidKey {
                reason: "invalid private key encoding".into(),
            }
        })?);
        Self::from_bytes(&bytes)
    }

    /// Build from raw secret bytes.
    pub fn from_bytes(bytes: &[u8]) -> CheckpointResult<Self> {
        if bytes.len() != 32 {
            return Err(CheckpointError::InvalidKey {
                reason: format!("private key must be 32 bytes, got {}", bytes.len()),
            });
        }
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CheckpointError::InvalidKey {
                reason: "private key outside allowed range".into(),
            })?;
        Ok(Self { signing_key })
    }

    pub fn public_key(&self) -> NetworkPublicKey {
        NetworkPublicKey(self.signing_key.verifying_key().clone())
    }

    /// Sign a checkpoint for `hash`.
    pub fn sign(&self, hash: &Hash) -> CheckpointResult<CheckpointMessage> {
        let signed_bytes = encode_unsigned(hash)?;
        let digest = content_hash(&signed_bytes);
        let signature: Signature =
            self.signing_key
                .sign_prehash(&digest)
                .map_err(|e| CheckpointError::SigningFailed {
                    reason: e.to_string(),
                })?;
        CheckpointMessage::from_parts(signed_bytes, signature.to_der().as_bytes().to_vec())
    }

    /// Sign `genesis` and discard the result.
    ///
    /// A key that cannot produce a signature is never installed as master.
    pub fn self_test(&self, genesis: &Hash) -> CheckpointResult<()> {
        let probe = self.sign(genesis)?;
        if !self.public_key().verify(&probe) {
            return Err(CheckpointError::SigningFailed {
                reason: "self-test signature does not verify".into(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("public_key", &hex::encode(self.public_key().to_sec1_bytes()))
            .finish_non_exhaustive()
    }
}
