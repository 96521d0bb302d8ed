//! Channel-backed network adapter
//!
//! Outgoing requests are emitted as [`NetworkCommand`]s on an unbounded
//! channel drained by the P2P layer. Sends never block.

use crate::domain::{hash_hex, CheckpointMessage, Hash, PeerId};
use crate::error::{CheckpointError, CheckpointResult};
use crate::ports::outbound::PeerNetwork;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tracing::debug;

/// Commands for the P2P layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkCommand {
    /// Ask `peer` for the block (and its missing ancestors)
    RequestBlock { peer: PeerId, hash: Hash },
    /// Send an encoded checkpoint message to `peer`
    Relay { peer: PeerId, payload: Vec<u8> },
}

pub struct ChannelNetworkAdapter {
    sender: mpsc::UnboundedSender<NetworkCommand>,
    peers: RwLock<BTreeSet<PeerId>>,
}

impl ChannelNetworkAdapter {
    /// Create the adapter and the receiving end for the P2P layer.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NetworkCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let adapter = Self {
            sender,
            peers: RwLock::new(BTreeSet::new()),
        };
        (adapter, receiver)
    }

    pub fn peer_connected(&self, peer: PeerId) {
        self.peers.write().insert(peer);
    }

    pub fn peer_disconnected(&self, peer: &PeerId) {
        self.peers.write().remove(peer);
    }
}

#[async_trait]
impl PeerNetwork for ChannelNetworkAdapter {
    fn request_block(&self, peer: &PeerId, hash: &Hash) {
        let command = NetworkCommand::RequestBlock {
            peer: peer.clone(),
            hash: *hash,
        };
        if self.sender.send(command).is_err() {
            debug!(
                "[qc-18] Network channel closed, dropped request for {}",
                hash_hex(hash)
            );
        }
    }

    fn connected_peers(&self) -> Vec<PeerId> {
        self.peers.read().iter().cloned().collect()
    }

    async fn relay_to(&self, peer: &PeerId, message: &CheckpointMessage) -> CheckpointResult<()> {
        let payload = message.encode()?;
        self.sender
            .send(NetworkCommand::Relay {
                peer: peer.clone(),
                payload,
            })
            .map_err(|_| CheckpointError::Network {
                reason: "network channel closed".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encode_unsigned;

    #[tokio::test]
    async fn test_relay_emits_encoded_message() {
        let (network, mut rx) = ChannelNetworkAdapter::new();
        let peer = PeerId([1; 32]);
        let message =
            CheckpointMessage::from_parts(encode_unsigned(&[5; 32]).unwrap(), vec![9]).unwrap();

        network.relay_to(&peer, &message).await.unwrap();

        match rx.recv().await.unwrap() {
            NetworkCommand::Relay { peer: to, payload } => {
                assert_eq!(to, peer);
                assert_eq!(CheckpointMessage::decode(&payload).unwrap(), message);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_relay_fails_when_receiver_dropped() {
        let (network, rx) = ChannelNetworkAdapter::new();
        drop(rx);
        let message =
            CheckpointMessage::from_parts(encode_unsigned(&[5; 32]).unwrap(), vec![9]).unwrap();

        assert!(matches!(
            network.relay_to(&PeerId([1; 32]), &message).await,
            Err(CheckpointError::Network { .. })
        ));
        // Requests stay fire-and-forget.
        network.request_block(&PeerId([1; 32]), &[5; 32]);
    }

    #[test]
    fn test_peer_registry() {
        let (network, _rx) = ChannelNetworkAdapter::new();
        network.peer_connected(PeerId([2; 32]));
        network.peer_connected(PeerId([1; 32]));
        network.peer_connected(PeerId([2; 32]));
        assert_eq!(
            network.connected_peers(),
            vec![PeerId([1; 32]), PeerId([2; 32])]
        );

        network.peer_disconnected(&PeerId([1; 32]));
        assert_eq!(network.connected_peers(), vec![PeerId([2; 32])]);
    }
}
