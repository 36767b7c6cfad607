// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{sync::Arc, time::Duration};

use log::*;
use polaris_shutdown::{Shutdown, ShutdownSignal};
use rand::Rng;
use tokio::{sync::Mutex, task::JoinHandle, time::sleep};

use crate::{
    config::ProtocolParams,
    consts::ATTESTATION_SUBNET_COUNT,
    network::gossip::{GossipError, GossipHandler, GossipRouter, SubscriptionToken},
    types::ForkDigest,
};

const LOG_TARGET: &str = "p::tasks::subnet_rotation";

/// Holds a fixed number of randomized, time-limited attestation-subnet
/// subscriptions so the node's advertised subnets do not reveal its real
/// duties. Received attestations on these subnets are discarded.
///
/// `run` joins one random subnet per configured slot and schedules its
/// rotation; each rotation leaves the expiring subnet and joins a fresh
/// random one. `stop` cancels every pending rotation and awaits the slot
/// tasks, so no rotation side effect occurs after it returns.
pub struct SubnetRotationTask {
    params: ProtocolParams,
    router: Arc<GossipRouter>,
    shutdown: Mutex<Option<Shutdown>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SubnetRotationTask {
    pub fn new(params: ProtocolParams, router: Arc<GossipRouter>) -> Self {
        Self {
            params,
            router,
            shutdown: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub async fn run(&self) -> Result<(), GossipError> {
        let mut shutdown_slot = self.shutdown.lock().await;
        if shutdown_slot.is_some() {
            return Err(GossipError::AlreadyStarted);
        }
        let fork_digest = self.router.current_fork_digest();
        let shutdown = Shutdown::new();
        let mut tasks = self.tasks.lock().await;
        for _ in 0..self.params.random_subnets_per_validator {
            let subnet = random_subnet();
            let token = self
                .router
                .subscribe_to_attestation_subnet(fork_digest, subnet, discard_handler())
                .await?;
            info!(target: LOG_TARGET, "Joined random attestation subnet {}", subnet);
            tasks.push(tokio::spawn(rotation_loop(
                self.router.clone(),
                self.params,
                fork_digest,
                token,
                shutdown.to_signal(),
            )));
        }
        *shutdown_slot = Some(shutdown);
        Ok(())
    }

    /// Cancel every pending rotation. Guaranteed: no rotation fires after
    /// this returns.
    pub async fn stop(&self) {
        if let Some(shutdown) = self.shutdown.lock().await.take() {
            shutdown.trigger();
        }
        let mut tasks = self.tasks.lock().await;
        for handle in tasks.drain(..) {
            let _ = handle.await;
        }
    }
}

async fn rotation_loop(
    router: Arc<GossipRouter>,
    params: ProtocolParams,
    fork_digest: ForkDigest,
    mut token: SubscriptionToken,
    mut signal: ShutdownSignal,
) {
    loop {
        let lifetime = subscription_lifetime(&params);
        tokio::select! {
            _ = signal.wait() => break,
            _ = sleep(lifetime) => {
                if let Err(e) = router.unsubscribe_from_attestation_subnet(token).await {
                    warn!(target: LOG_TARGET, "Failed to leave expiring subnet: {}", e);
                    break;
                }
                let subnet = random_subnet();
                match router.subscribe_to_attestation_subnet(fork_digest, subnet, discard_handler()).await {
                    Ok(new_token) => {
                        debug!(target: LOG_TARGET, "Rotated random subnet subscription to {}", subnet);
                        token = new_token;
                    },
                    Err(e) => {
                        warn!(target: LOG_TARGET, "Failed to join replacement subnet {}: {}", subnet, e);
                        break;
                    },
                }
            },
        }
    }
}

fn discard_handler() -> GossipHandler {
    // Attestations on randomly held subnets are deliberately dropped.
    Arc::new(|_| {})
}

fn random_subnet() -> u64 {
    rand::thread_rng().gen_range(0..ATTESTATION_SUBNET_COUNT)
}

/// Uniform lifetime in `[n, 2n)` epochs, converted to wall-clock time.
fn subscription_lifetime(params: &ProtocolParams) -> Duration {
    let n = params.epochs_per_random_subnet_subscription;
    let epochs = rand::thread_rng().gen_range(n..2 * n);
    Duration::from_secs(epochs * params.slots_per_epoch * params.seconds_per_slot)
}
