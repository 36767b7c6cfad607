// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use log::*;
use polaris_shutdown::Shutdown;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    chain::{ChainEvent, ChainInterface},
    sync::{strategy::SyncStrategy, SyncError},
    types::Slot,
};

const LOG_TARGET: &str = "p::sync::regular";

/// Live-chain following: while the gossip bridge feeds incoming blocks to
/// the chain, this strategy observes processed-block events and tracks the
/// advancing head. `start` launches the observer and returns.
pub struct HeadFollowSync {
    chain: Arc<dyn ChainInterface>,
    running: Arc<AtomicBool>,
    last_slot: Arc<AtomicU64>,
    task: Mutex<Option<(Shutdown, JoinHandle<()>)>>,
}

impl HeadFollowSync {
    pub fn new(chain: Arc<dyn ChainInterface>) -> Self {
        Self {
            chain,
            running: Arc::new(AtomicBool::new(false)),
            last_slot: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    /// Slot of the most recent block observed since `start`.
    pub fn last_processed_slot(&self) -> Slot {
        self.last_slot.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncStrategy for HeadFollowSync {
    async fn start(&self) -> Result<(), SyncError> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(SyncError::AlreadyStarted);
        }
        let mut events = self.chain.event_stream();
        let running = self.running.clone();
        let last_slot = self.last_slot.clone();
        let shutdown = Shutdown::new();
        let mut signal = shutdown.to_signal();
        running.store(true, Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            info!(target: LOG_TARGET, "Following the live chain head");
            loop {
                tokio::select! {
                    _ = signal.wait() => break,
                    event = events.recv() => match event {
                        Ok(event) => {
                            if let ChainEvent::BlockProcessed(block) = &*event {
                                last_slot.store(block.slot(), Ordering::SeqCst);
                                trace!(target: LOG_TARGET, "Head advanced to slot {}", block.slot());
                            }
                        },
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!(target: LOG_TARGET, "Lagging behind {} chain event(s)", n);
                        },
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            running.store(false, Ordering::SeqCst);
            debug!(target: LOG_TARGET, "Regular sync stopped");
        });
        *task = Some((shutdown, handle));
        Ok(())
    }

    async fn stop(&self) -> Result<(), SyncError> {
        let mut task = self.task.lock().await;
        if let Some((shutdown, handle)) = task.take() {
            shutdown.trigger();
            let _ = handle.await;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
