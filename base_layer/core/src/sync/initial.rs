// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use log::*;
use polaris_shutdown::{Shutdown, ShutdownSignal};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    chain::ChainInterface,
    network::{peer_directory::PeerDirectory, rpc::RpcClient},
    sync::{round_robin::RoundRobinSelector, strategy::SyncStrategy, SyncError},
    types::Slot,
};

const LOG_TARGET: &str = "p::sync::initial";
const BATCH_SIZE: u64 = 64;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Bulk historical catch-up: pulls block ranges from qualified peers in
/// round-robin order until the local head reaches the best slot advertised
/// by any peer. `start` completes when caught up, when no peer advertises a
/// target, or when stopped.
pub struct BatchSync {
    chain: Arc<dyn ChainInterface>,
    rpc: Arc<dyn RpcClient>,
    peers: PeerDirectory,
    running: AtomicBool,
    shutdown: Mutex<Option<Shutdown>>,
}

impl BatchSync {
    pub fn new(chain: Arc<dyn ChainInterface>, rpc: Arc<dyn RpcClient>, peers: PeerDirectory) -> Self {
        Self {
            chain,
            rpc,
            peers,
            running: AtomicBool::new(false),
            shutdown: Mutex::new(None),
        }
    }

    async fn run(&self, mut signal: ShutdownSignal) -> Result<(), SyncError> {
        info!(target: LOG_TARGET, "Starting batch sync");
        loop {
            if signal.is_triggered() {
                break;
            }
            let Some(target) = self.target_slot().await else {
                debug!(target: LOG_TARGET, "No qualified peer advertises a head; nothing to sync");
                break;
            };
            let local = self.chain.head_slot().await?;
            if local >= target {
                info!(target: LOG_TARGET, "Batch sync caught up at slot {}", local);
                break;
            }
            let count = (target - local).min(BATCH_SIZE);
            let advanced = self.fetch_batch(&mut signal, local, count).await?;
            if !advanced {
                // No peer served the range, or ingesting did not move the
                // head. Back off before retrying.
                tokio::select! {
                    _ = signal.wait() => break,
                    _ = sleep(RETRY_DELAY) => {},
                }
            }
        }
        Ok(())
    }

    /// Request `count` blocks after `local` from peers in round-robin order
    /// until one serves a non-empty batch. Returns whether the local head
    /// advanced.
    async fn fetch_batch(&self, signal: &mut ShutdownSignal, local: Slot, count: u64) -> Result<bool, SyncError> {
        let peer_ids = self
            .peers
            .qualified_peers()
            .await
            .into_iter()
            .map(|p| p.peer_id)
            .collect::<Vec<_>>();
        let mut selector = RoundRobinSelector::new(peer_ids);
        for _ in 0..selector.len() {
            let Some(peer) = selector.next().copied() else {
                break;
            };
            match self.rpc.blocks_by_range(peer, local + 1, count).await {
                Ok(blocks) if !blocks.is_empty() => {
                    debug!(
                        target: LOG_TARGET,
                        "Received {} blocks from {} starting at slot {}",
                        blocks.len(),
                        peer.short_str(),
                        local + 1
                    );
                    for block in blocks {
                        if signal.is_triggered() {
                            return Ok(true);
                        }
                        if let Err(e) = self.chain.receive_block(block).await {
                            debug!(target: LOG_TARGET, "Batch block rejected: {}", e);
                        }
                    }
                    return Ok(self.chain.head_slot().await? > local);
                },
                Ok(_) => {
                    trace!(target: LOG_TARGET, "Peer {} served an empty range", peer.short_str());
                },
                Err(e) => {
                    debug!(target: LOG_TARGET, "Skipping sync peer {}: {}", peer.short_str(), e);
                },
            }
        }
        Ok(false)
    }

    /// The best head slot advertised by any qualified peer.
    async fn target_slot(&self) -> Option<Slot> {
        self.peers
            .qualified_peers()
            .await
            .iter()
            .filter_map(|p| p.status.map(|s| s.head_slot))
            .max()
    }
}

#[async_trait]
impl SyncStrategy for BatchSync {
    async fn start(&self) -> Result<(), SyncError> {
        let signal = {
            let mut shutdown = self.shutdown.lock().await;
            if shutdown.is_some() {
                return Err(SyncError::AlreadyStarted);
            }
            let trigger = Shutdown::new();
            let signal = trigger.to_signal();
            *shutdown = Some(trigger);
            signal
        };
        self.running.store(true, Ordering::SeqCst);
        let result = self.run(signal).await;
        self.running.store(false, Ordering::SeqCst);
        *self.shutdown.lock().await = None;
        result
    }

    async fn stop(&self) -> Result<(), SyncError> {
        if let Some(shutdown) = self.shutdown.lock().await.take() {
            shutdown.trigger();
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
