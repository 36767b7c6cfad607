// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{
    collections::HashMap,
    fmt::{Display, Error, Formatter},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::{broadcast, Mutex};

use crate::{
    consts::MAX_SUBNET_PEERS,
    network::{discovery::DiscoveryTable, rpc::RpcClient},
    types::{PeerId, PeerStatus, SubnetBitfield},
};

const LOG_TARGET: &str = "p::net::peer_directory";
const EVENT_CHANNEL_SIZE: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionDirection {
    Inbound,
    Outbound,
}

impl Display for ConnectionDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            ConnectionDirection::Inbound => f.write_str("inbound"),
            ConnectionDirection::Outbound => f.write_str("outbound"),
        }
    }
}

/// A currently or previously connected peer as tracked by the directory.
#[derive(Clone, Debug)]
pub struct Peer {
    pub peer_id: PeerId,
    pub direction: ConnectionDirection,
    /// Subnets from the peer's discovery record at connect time.
    pub advertised_attnets: SubnetBitfield,
    /// Latest chain status; reputation state owned by an external scorer.
    /// Peers without a status are not qualified for sync operations.
    pub status: Option<PeerStatus>,
}

#[derive(Debug, Clone)]
pub enum PeerEvent {
    Connected(PeerId, ConnectionDirection),
    Disconnected(PeerId),
}

impl Display for PeerEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            PeerEvent::Connected(peer, direction) => write!(f, "Connected({}, {})", peer.short_str(), direction),
            PeerEvent::Disconnected(peer) => write!(f, "Disconnected({})", peer.short_str()),
        }
    }
}

/// Peer lifecycle bookkeeping and subnet-based peer discovery.
#[derive(Clone)]
pub struct PeerDirectory {
    peers: Arc<Mutex<HashMap<PeerId, Peer>>>,
    gauge: Arc<AtomicUsize>,
    event_tx: broadcast::Sender<Arc<PeerEvent>>,
    discovery: Arc<dyn DiscoveryTable>,
    rpc: Arc<dyn RpcClient>,
}

impl PeerDirectory {
    pub fn new(discovery: Arc<dyn DiscoveryTable>, rpc: Arc<dyn RpcClient>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            peers: Arc::new(Mutex::new(HashMap::new())),
            gauge: Arc::new(AtomicUsize::new(0)),
            event_tx,
            discovery,
            rpc,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Arc<PeerEvent>> {
        self.event_tx.subscribe()
    }

    /// Number of peers with an active transport connection.
    pub fn connected_count(&self) -> usize {
        self.gauge.load(Ordering::SeqCst)
    }

    pub async fn peer_connected(&self, peer_id: PeerId, direction: ConnectionDirection, advertised_attnets: SubnetBitfield) {
        let mut peers = self.peers.lock().await;
        if peers.contains_key(&peer_id) {
            debug!(target: LOG_TARGET, "Peer {} already connected", peer_id.short_str());
            return;
        }
        peers.insert(peer_id, Peer {
            peer_id,
            direction,
            advertised_attnets,
            status: None,
        });
        drop(peers);
        self.gauge.fetch_add(1, Ordering::SeqCst);
        debug!(target: LOG_TARGET, "Peer connected {} {}", peer_id, direction);
        let _ = self.event_tx.send(Arc::new(PeerEvent::Connected(peer_id, direction)));
    }

    pub async fn peer_disconnected(&self, peer_id: PeerId) {
        let removed = self.peers.lock().await.remove(&peer_id).is_some();
        if !removed {
            return;
        }
        self.gauge.fetch_sub(1, Ordering::SeqCst);
        debug!(target: LOG_TARGET, "Peer disconnected {}", peer_id);
        let _ = self.event_tx.send(Arc::new(PeerEvent::Disconnected(peer_id)));
    }

    /// Record the latest status claimed by a connected peer. Unknown peers
    /// are ignored.
    pub async fn set_peer_status(&self, peer_id: PeerId, status: PeerStatus) {
        if let Some(peer) = self.peers.lock().await.get_mut(&peer_id) {
            peer.status = Some(status);
        }
    }

    pub async fn connected_peers(&self) -> Vec<Peer> {
        self.peers.lock().await.values().cloned().collect()
    }

    /// Connected peers that have supplied a status and are therefore
    /// eligible for sync operations.
    pub async fn qualified_peers(&self) -> Vec<Peer> {
        self.peers
            .lock()
            .await
            .values()
            .filter(|p| p.status.is_some())
            .cloned()
            .collect()
    }

    /// Scan the discovery table for peers advertising `subnet`, excluding
    /// `known` ids, and confirm each remaining candidate with a direct
    /// metadata query (discovery records may be stale). Candidates are
    /// evaluated until the running confirmed count reaches
    /// [`MAX_SUBNET_PEERS`]; individual failures skip that candidate only.
    /// Returns the confirmed count.
    pub async fn connect_to_subnet_peers(&self, subnet: u64, known: &[PeerId]) -> usize {
        let candidates = self
            .discovery
            .table_records()
            .into_iter()
            .filter(|record| record.advertises_subnet(subnet))
            .filter(|record| !known.contains(&record.peer_id))
            .collect::<Vec<_>>();

        let mut count = 0;
        for candidate in candidates {
            if count >= MAX_SUBNET_PEERS {
                break;
            }
            match self.rpc.metadata(candidate.peer_id).await {
                Ok(metadata) if metadata.attnets.get(subnet) => {
                    count += 1;
                },
                Ok(_) => {
                    trace!(
                        target: LOG_TARGET,
                        "Stale discovery record: {} no longer advertises subnet {}",
                        candidate.peer_id.short_str(),
                        subnet
                    );
                },
                Err(e) => {
                    debug!(
                        target: LOG_TARGET,
                        "Skipping subnet candidate {}: {}",
                        candidate.peer_id.short_str(),
                        e
                    );
                },
            }
        }
        info!(
            target: LOG_TARGET,
            "Connected to {} new peers for subnet {}", count, subnet
        );
        count
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        test_helpers::{subnet_bitfield, MockDiscovery, MockRpcClient},
        types::NodeMetadata,
    };

    fn setup(discovery: MockDiscovery, rpc: MockRpcClient) -> PeerDirectory {
        PeerDirectory::new(Arc::new(discovery), Arc::new(rpc))
    }

    #[tokio::test]
    async fn connect_disconnect_updates_gauge_and_events() {
        let directory = setup(MockDiscovery::default(), MockRpcClient::default());
        let mut events = directory.subscribe_events();
        let peer = PeerId::random();

        directory
            .peer_connected(peer, ConnectionDirection::Outbound, SubnetBitfield::new())
            .await;
        assert_eq!(directory.connected_count(), 1);
        match &*events.recv().await.unwrap() {
            PeerEvent::Connected(id, direction) => {
                assert_eq!(*id, peer);
                assert_eq!(*direction, ConnectionDirection::Outbound);
            },
            other => panic!("unexpected event {}", other),
        }

        directory.peer_disconnected(peer).await;
        assert_eq!(directory.connected_count(), 0);
        match &*events.recv().await.unwrap() {
            PeerEvent::Disconnected(id) => assert_eq!(*id, peer),
            other => panic!("unexpected event {}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_connect_and_unknown_disconnect_are_ignored() {
        let directory = setup(MockDiscovery::default(), MockRpcClient::default());
        let peer = PeerId::random();
        directory
            .peer_connected(peer, ConnectionDirection::Inbound, SubnetBitfield::new())
            .await;
        directory
            .peer_connected(peer, ConnectionDirection::Inbound, SubnetBitfield::new())
            .await;
        assert_eq!(directory.connected_count(), 1);
        directory.peer_disconnected(PeerId::random()).await;
        assert_eq!(directory.connected_count(), 1);
    }

    #[tokio::test]
    async fn qualified_peers_require_a_status() {
        let directory = setup(MockDiscovery::default(), MockRpcClient::default());
        let with_status = PeerId::random();
        let without_status = PeerId::random();
        directory
            .peer_connected(with_status, ConnectionDirection::Outbound, SubnetBitfield::new())
            .await;
        directory
            .peer_connected(without_status, ConnectionDirection::Inbound, SubnetBitfield::new())
            .await;
        directory.set_peer_status(with_status, PeerStatus::default()).await;

        assert_eq!(directory.connected_peers().await.len(), 2);
        let qualified = directory.qualified_peers().await;
        assert_eq!(qualified.len(), 1);
        assert_eq!(qualified[0].peer_id, with_status);
    }

    #[tokio::test]
    async fn subnet_scan_counts_only_confirmed_candidates() {
        // 12 records advertise subnet 7, but only 9 peers still confirm it
        // when queried directly.
        let mut discovery = MockDiscovery::default();
        let mut rpc = MockRpcClient::default();
        for i in 0..12 {
            let peer = PeerId::random();
            discovery.add_record(peer, Some(subnet_bitfield(&[7])));
            let confirmed = i < 9;
            rpc.set_metadata(peer, NodeMetadata {
                seq_number: 1,
                attnets: if confirmed { subnet_bitfield(&[7]) } else { SubnetBitfield::new() },
            });
        }
        let directory = setup(discovery, rpc);
        assert_eq!(directory.connect_to_subnet_peers(7, &[]).await, 9);
    }

    #[tokio::test]
    async fn subnet_scan_stops_at_the_cap() {
        let mut discovery = MockDiscovery::default();
        let mut rpc = MockRpcClient::default();
        for _ in 0..15 {
            let peer = PeerId::random();
            discovery.add_record(peer, Some(subnet_bitfield(&[2])));
            rpc.set_metadata(peer, NodeMetadata {
                seq_number: 0,
                attnets: subnet_bitfield(&[2]),
            });
        }
        let directory = setup(discovery, rpc);
        assert_eq!(directory.connect_to_subnet_peers(2, &[]).await, MAX_SUBNET_PEERS);
    }

    #[tokio::test]
    async fn subnet_scan_excludes_known_peers_and_tolerates_failures() {
        let mut discovery = MockDiscovery::default();
        let mut rpc = MockRpcClient::default();
        let known = PeerId::random();
        discovery.add_record(known, Some(subnet_bitfield(&[4])));

        let failing = PeerId::random();
        discovery.add_record(failing, Some(subnet_bitfield(&[4])));
        rpc.fail_peer(failing);

        let good = PeerId::random();
        discovery.add_record(good, Some(subnet_bitfield(&[4])));
        rpc.set_metadata(good, NodeMetadata {
            seq_number: 3,
            attnets: subnet_bitfield(&[4]),
        });

        // A record without an attnets field never qualifies as a candidate.
        discovery.add_record(PeerId::random(), None);

        let directory = setup(discovery, rpc.clone());
        assert_eq!(directory.connect_to_subnet_peers(4, &[known]).await, 1);
        let queried = rpc.metadata_queries();
        assert!(!queried.contains(&known));
        assert!(queried.contains(&failing));
        assert!(queried.contains(&good));
    }
}
