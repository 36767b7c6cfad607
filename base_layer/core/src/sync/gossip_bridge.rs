// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::Arc;

use log::*;
use polaris_shutdown::Shutdown;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};

use crate::{
    chain::ChainInterface,
    network::gossip::{GossipHandler, GossipKind, GossipObject, GossipRouter, SubscriptionToken},
    pool::OperationPool,
    sync::SyncError,
};

const LOG_TARGET: &str = "p::sync::gossip_bridge";

const BRIDGED_KINDS: [GossipKind; 6] = [
    GossipKind::BeaconBlock,
    GossipKind::BeaconAggregateAndProof,
    GossipKind::BeaconAttestation,
    GossipKind::VoluntaryExit,
    GossipKind::ProposerSlashing,
    GossipKind::AttesterSlashing,
];

struct BridgeState {
    tokens: Vec<SubscriptionToken>,
    shutdown: Shutdown,
    forwarder: JoinHandle<()>,
}

/// Bridges fork-scoped gossip into the node: blocks go to the chain for
/// import, every other object kind goes to the operation pool. Subscribed
/// topics are bound to the fork digest current at `start`.
pub struct GossipBridge {
    router: Arc<GossipRouter>,
    chain: Arc<dyn ChainInterface>,
    pool: Arc<dyn OperationPool>,
    state: Mutex<Option<BridgeState>>,
}

impl GossipBridge {
    pub fn new(router: Arc<GossipRouter>, chain: Arc<dyn ChainInterface>, pool: Arc<dyn OperationPool>) -> Self {
        Self {
            router,
            chain,
            pool,
            state: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Err(SyncError::AlreadyStarted);
        }
        let fork_digest = self.router.current_fork_digest();
        let (object_tx, mut object_rx) = mpsc::unbounded_channel::<GossipObject>();
        let mut tokens = Vec::with_capacity(BRIDGED_KINDS.len());
        for kind in BRIDGED_KINDS {
            let object_tx = object_tx.clone();
            let handler: GossipHandler = Arc::new(move |object| {
                let _ = object_tx.send(object);
            });
            tokens.push(self.router.subscribe(fork_digest, kind, handler).await?);
        }

        let chain = self.chain.clone();
        let pool = self.pool.clone();
        let shutdown = Shutdown::new();
        let mut signal = shutdown.to_signal();
        let forwarder = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = signal.wait() => break,
                    object = object_rx.recv() => match object {
                        Some(object) => deliver(&*chain, &*pool, object).await,
                        None => break,
                    },
                }
            }
            debug!(target: LOG_TARGET, "Gossip bridge forwarder shut down");
        });
        *state = Some(BridgeState {
            tokens,
            shutdown,
            forwarder,
        });
        info!(
            target: LOG_TARGET,
            "Gossip bridge started for fork digest {}", fork_digest
        );
        Ok(())
    }

    /// Unsubscribe every bridged topic and stop forwarding. Safe to call
    /// when not started.
    pub async fn stop(&self) -> Result<(), SyncError> {
        let Some(BridgeState {
            tokens,
            shutdown,
            forwarder,
        }) = self.state.lock().await.take()
        else {
            return Ok(());
        };
        for token in tokens {
            self.router.unsubscribe(token).await?;
        }
        shutdown.trigger();
        let _ = forwarder.await;
        Ok(())
    }
}

async fn deliver(chain: &dyn ChainInterface, pool: &dyn OperationPool, object: GossipObject) {
    match object {
        GossipObject::Block(block) => {
            if let Err(e) = chain.receive_block(block).await {
                debug!(target: LOG_TARGET, "Gossip block rejected: {}", e);
            }
        },
        GossipObject::Attestation(attestation) => pool.insert_attestation(attestation),
        GossipObject::SubnetAttestation { attestation, .. } => pool.insert_attestation(attestation),
        GossipObject::AggregateAndProof(aggregate) => pool.insert_aggregate(aggregate),
        GossipObject::VoluntaryExit(exit) => pool.insert_voluntary_exit(exit),
        GossipObject::ProposerSlashing(slashing) => pool.insert_proposer_slashing(slashing),
        GossipObject::AttesterSlashing(slashing) => pool.insert_attester_slashing(slashing),
    }
}
