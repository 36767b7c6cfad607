// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::Arc;

use futures::future;
use log::*;
use polaris_shutdown::Shutdown;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::sleep,
};

use crate::{
    chain::{ChainEvent, ChainInterface},
    config::SyncConfig,
    network::{
        peer_directory::PeerDirectory,
        rpc::{RpcClient, RpcService},
    },
    sync::{
        attestation_collector::AttestationCollector,
        gossip_bridge::GossipBridge,
        round_robin::RoundRobinSelector,
        states::SyncMode,
        strategy::SyncStrategy,
        SyncError,
    },
    types::{Root, Slot},
};

const LOG_TARGET: &str = "p::sync::coordinator";

/// Sequences the node from "no peers" to following the live chain head.
///
/// `start` serves the request/response service and the attestation
/// collector, registers the unknown-root observer, waits for enough
/// qualified peers, runs the initial (bulk) strategy to completion and then
/// hands over to the regular (gossip-driven) strategy. The two strategies
/// are never both running: each handoff stops one side before starting the
/// other.
///
/// `Stopped` is terminal. The mode setter refuses to leave it, so a `stop`
/// racing an in-flight `start` leaves the machine stopped and the remaining
/// handoffs do nothing.
pub struct SyncCoordinator {
    config: SyncConfig,
    chain: Arc<dyn ChainInterface>,
    peers: PeerDirectory,
    rpc: Arc<dyn RpcClient>,
    rpc_service: Arc<RpcService>,
    attestation_collector: Arc<AttestationCollector>,
    gossip_bridge: Arc<GossipBridge>,
    initial_sync: Arc<dyn SyncStrategy>,
    regular_sync: Arc<dyn SyncStrategy>,
    mode_tx: watch::Sender<SyncMode>,
    observer: Mutex<Option<(Shutdown, JoinHandle<()>)>>,
}

impl SyncCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SyncConfig,
        chain: Arc<dyn ChainInterface>,
        peers: PeerDirectory,
        rpc: Arc<dyn RpcClient>,
        rpc_service: Arc<RpcService>,
        attestation_collector: Arc<AttestationCollector>,
        gossip_bridge: Arc<GossipBridge>,
        initial_sync: Arc<dyn SyncStrategy>,
        regular_sync: Arc<dyn SyncStrategy>,
    ) -> Self {
        let (mode_tx, _) = watch::channel(SyncMode::WaitingPeers);
        Self {
            config,
            chain,
            peers,
            rpc,
            rpc_service,
            attestation_collector,
            gossip_bridge,
            initial_sync,
            regular_sync,
            mode_tx,
            observer: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> SyncMode {
        *self.mode_tx.borrow()
    }

    pub fn mode_watcher(&self) -> watch::Receiver<SyncMode> {
        self.mode_tx.subscribe()
    }

    /// True only when the coordinator has reached `Synced`; never true after
    /// `stop`.
    pub fn is_synced(&self) -> bool {
        self.mode().is_synced()
    }

    pub async fn start(&self) -> Result<(), SyncError> {
        self.rpc_service.start().await?;
        self.attestation_collector.start().await?;
        self.spawn_unknown_root_observer().await;
        self.wait_for_peers().await;
        if self.mode().is_stopped() {
            return Ok(());
        }
        self.start_initial_sync().await?;
        if self.mode().is_stopped() {
            return Ok(());
        }
        self.start_regular_sync().await?;
        Ok(())
    }

    /// Stop everything. The mode becomes `Stopped` before any collaborator
    /// is awaited; repeated calls are safe.
    pub async fn stop(&self) -> Result<(), SyncError> {
        self.set_mode(SyncMode::Stopped);
        if let Some((shutdown, handle)) = self.observer.lock().await.take() {
            shutdown.trigger();
            let _ = handle.await;
        }
        self.initial_sync.stop().await?;
        self.regular_sync.stop().await?;
        self.attestation_collector.stop().await?;
        self.rpc_service.stop().await;
        self.gossip_bridge.stop().await?;
        info!(target: LOG_TARGET, "Sync coordinator stopped");
        Ok(())
    }

    /// Collect committee attestations for one slot via the attestation
    /// collector.
    pub async fn collect_attestations(&self, slot: Slot, committee_index: u64) -> Result<(), SyncError> {
        self.attestation_collector.collect(slot, committee_index).await
    }

    fn set_mode(&self, mode: SyncMode) {
        self.mode_tx.send_modify(|current| {
            // Stopped is terminal; nothing transitions away from it.
            if current.is_stopped() {
                return;
            }
            if *current != mode {
                info!(target: LOG_TARGET, "Sync mode: {} → {}", current, mode);
                *current = mode;
            }
        });
    }

    async fn wait_for_peers(&self) {
        info!(
            target: LOG_TARGET,
            "Waiting for at least {} qualified peers...", self.config.min_peers
        );
        while !self.mode().is_stopped() && self.qualified_peer_count().await < self.config.min_peers {
            sleep(self.config.peer_poll_interval).await;
        }
    }

    async fn qualified_peer_count(&self) -> usize {
        self.peers.qualified_peers().await.len()
    }

    async fn start_initial_sync(&self) -> Result<(), SyncError> {
        self.set_mode(SyncMode::InitialSyncing);
        self.regular_sync.stop().await?;
        self.initial_sync.start().await?;
        Ok(())
    }

    async fn start_regular_sync(&self) -> Result<(), SyncError> {
        self.set_mode(SyncMode::RegularSyncing);
        self.initial_sync.stop().await?;
        let (bridge, regular) = future::join(self.gossip_bridge.start(), self.regular_sync.start()).await;
        bridge?;
        regular?;
        Ok(())
    }

    async fn spawn_unknown_root_observer(&self) {
        let mut events = self.chain.event_stream();
        let peers = self.peers.clone();
        let rpc = self.rpc.clone();
        let chain = self.chain.clone();
        let shutdown = Shutdown::new();
        let mut signal = shutdown.to_signal();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = signal.wait() => break,
                    event = events.recv() => match event {
                        Ok(event) => {
                            if let ChainEvent::UnknownBlockRoot(root) = &*event {
                                repair_unknown_root(&peers, &*rpc, &*chain, *root).await;
                            }
                        },
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!(target: LOG_TARGET, "Lagging behind {} chain event(s)", n);
                        },
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!(target: LOG_TARGET, "Unknown-root observer shut down");
        });
        *self.observer.lock().await = Some((shutdown, handle));
    }
}

/// One round-robin pass over the qualified peers, asking each for the
/// missing block until one answers. A recovered block is handed to the
/// chain exactly once; if every peer comes up empty the root is left
/// unresolved until the next trigger.
async fn repair_unknown_root(peers: &PeerDirectory, rpc: &dyn RpcClient, chain: &dyn ChainInterface, root: Root) {
    let peer_ids = peers
        .qualified_peers()
        .await
        .into_iter()
        .map(|p| p.peer_id)
        .collect::<Vec<_>>();
    debug!(
        target: LOG_TARGET,
        "Repairing unknown block root {} across {} peers",
        root.short_str(),
        peer_ids.len()
    );
    let mut selector = RoundRobinSelector::new(peer_ids);
    let mut recovered = None;
    for _ in 0..selector.len() {
        let Some(peer) = selector.next().copied() else {
            break;
        };
        match rpc.blocks_by_root(peer, &[root]).await {
            Ok(blocks) => {
                if let Some(block) = blocks.into_iter().next() {
                    recovered = Some(block);
                    break;
                }
            },
            Err(e) => {
                debug!(target: LOG_TARGET, "Peer {} failed to serve {}: {}", peer.short_str(), root.short_str(), e);
            },
        }
    }
    match recovered {
        Some(block) => {
            if let Err(e) = chain.receive_block(block).await {
                warn!(
                    target: LOG_TARGET,
                    "Recovered block for {} rejected: {}",
                    root.short_str(),
                    e
                );
            }
        },
        None => {
            debug!(
                target: LOG_TARGET,
                "No peer could supply block {}; giving up until the next trigger",
                root.short_str()
            );
        },
    }
}
