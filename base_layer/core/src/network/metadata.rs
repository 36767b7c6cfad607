// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::Arc;

use log::*;
use tokio::sync::Mutex;

use crate::types::{NodeMetadata, SubnetBitfield};

const LOG_TARGET: &str = "p::net::metadata";

/// Single owner of the node's advertised capability record.
///
/// The attnets bitfield is mutated by both manual subnet subscriptions and
/// the rotation task; every mutation goes through one lock acquisition with
/// no suspension inside the critical section, so read-modify-write is a
/// single step with respect to all other mutators. Every effective bit flip
/// bumps the sequence number; writing an unchanged bit does not.
#[derive(Clone, Debug)]
pub struct MetadataStore {
    inner: Arc<Mutex<NodeMetadata>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::from_seed(None)
    }

    /// Seed from a previously persisted/advertised record, if any.
    pub fn from_seed(seed: Option<NodeMetadata>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(seed.unwrap_or_default())),
        }
    }

    pub async fn node_metadata(&self) -> NodeMetadata {
        *self.inner.lock().await
    }

    pub async fn attnets(&self) -> SubnetBitfield {
        self.inner.lock().await.attnets
    }

    pub async fn seq_number(&self) -> u64 {
        self.inner.lock().await.seq_number
    }

    /// Set or clear a subnet bit. Returns true if the bit changed.
    pub async fn set_attnet(&self, subnet: u64, value: bool) -> bool {
        let mut metadata = self.inner.lock().await;
        if metadata.attnets.get(subnet) == value {
            return false;
        }
        metadata.attnets.set(subnet, value);
        metadata.seq_number += 1;
        trace!(
            target: LOG_TARGET,
            "attnets[{}] = {}, seq_number = {}",
            subnet,
            value,
            metadata.seq_number
        );
        true
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}
