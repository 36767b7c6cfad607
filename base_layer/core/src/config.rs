// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Epoch, Slot};

/// Protocol-level timing and subnet parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Number of slots per epoch (default: 32)
    pub slots_per_epoch: u64,
    /// Wall-clock duration of a slot in seconds (default: 12)
    pub seconds_per_slot: u64,
    /// Number of random attestation subnets each validator holds open for
    /// network-observation resistance (default: 1)
    pub random_subnets_per_validator: usize,
    /// Minimum lifetime of a random subnet subscription, in epochs; the
    /// actual lifetime is drawn uniformly from [n, 2n) (default: 256)
    pub epochs_per_random_subnet_subscription: u64,
}

impl ProtocolParams {
    pub fn epoch_at_slot(&self, slot: Slot) -> Epoch {
        slot / self.slots_per_epoch
    }

    pub fn slot_duration(&self) -> Duration {
        Duration::from_secs(self.seconds_per_slot)
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            slots_per_epoch: 32,
            seconds_per_slot: 12,
            random_subnets_per_validator: 1,
            epochs_per_random_subnet_subscription: 256,
        }
    }
}

/// Configuration for the sync coordinator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of status-qualified peers required before leaving the
    /// peer-wait state (default: 3)
    pub min_peers: usize,
    /// Interval at which the qualified-peer count is polled while waiting
    /// (default: 1s)
    pub peer_poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_peers: 3,
            peer_poll_interval: Duration::from_secs(1),
        }
    }
}
