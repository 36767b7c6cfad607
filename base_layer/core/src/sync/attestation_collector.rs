// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::Arc;

use log::*;
use polaris_shutdown::Shutdown;
use tokio::{sync::Mutex, task::JoinHandle, time::sleep};

use crate::{
    config::ProtocolParams,
    consts::ATTESTATION_SUBNET_COUNT,
    network::gossip::{GossipHandler, GossipObject, GossipRouter},
    pool::OperationPool,
    sync::SyncError,
    types::Slot,
};

const LOG_TARGET: &str = "p::sync::attestation_collector";

/// Collects committee attestations on demand: each `collect` call joins the
/// committee's subnet for one slot duration, delivering received
/// attestations to the operation pool, then leaves the subnet again.
pub struct AttestationCollector {
    params: ProtocolParams,
    router: Arc<GossipRouter>,
    pool: Arc<dyn OperationPool>,
    shutdown: Mutex<Option<Shutdown>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AttestationCollector {
    pub fn new(params: ProtocolParams, router: Arc<GossipRouter>, pool: Arc<dyn OperationPool>) -> Self {
        Self {
            params,
            router,
            pool,
            shutdown: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub async fn start(&self) -> Result<(), SyncError> {
        let mut shutdown = self.shutdown.lock().await;
        if shutdown.is_some() {
            return Err(SyncError::AlreadyStarted);
        }
        *shutdown = Some(Shutdown::new());
        Ok(())
    }

    /// Cancel all open collection windows. Each window's unsubscribe runs
    /// before this returns.
    pub async fn stop(&self) -> Result<(), SyncError> {
        if let Some(shutdown) = self.shutdown.lock().await.take() {
            shutdown.trigger();
        }
        let mut tasks = self.tasks.lock().await;
        for handle in tasks.drain(..) {
            let _ = handle.await;
        }
        Ok(())
    }

    /// Join the subnet serving `committee_index` for the duration of one
    /// slot and feed its attestations to the pool.
    pub async fn collect(&self, slot: Slot, committee_index: u64) -> Result<(), SyncError> {
        let signal = self
            .shutdown
            .lock()
            .await
            .as_ref()
            .map(|s| s.to_signal())
            .ok_or(SyncError::NotStarted)?;
        let subnet = committee_index % ATTESTATION_SUBNET_COUNT;
        let fork_digest = self.router.current_fork_digest();

        let pool = self.pool.clone();
        let handler: GossipHandler = Arc::new(move |object| {
            if let GossipObject::SubnetAttestation { attestation, .. } = object {
                pool.insert_attestation(attestation);
            }
        });
        let token = self
            .router
            .subscribe_to_attestation_subnet(fork_digest, subnet, handler)
            .await?;
        debug!(
            target: LOG_TARGET,
            "Collecting attestations for committee {} on subnet {} at slot {}", committee_index, subnet, slot
        );

        let router = self.router.clone();
        let window = self.params.slot_duration();
        let mut signal = signal;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = signal.wait() => {},
                _ = sleep(window) => {},
            }
            if let Err(e) = router.unsubscribe_from_attestation_subnet(token).await {
                warn!(target: LOG_TARGET, "Failed to leave subnet {}: {}", subnet, e);
            }
        });
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
        Ok(())
    }
}
