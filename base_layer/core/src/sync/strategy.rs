// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use async_trait::async_trait;

use crate::sync::SyncError;

/// A sync strategy sequenced by the coordinator. The initial (bulk) strategy
/// and the regular (gossip-driven) strategy are never both running; the
/// coordinator stops one before starting the other, in both directions.
#[async_trait]
pub trait SyncStrategy: Send + Sync {
    /// Begin syncing. The initial strategy completes this future when the
    /// bulk catch-up is done; the regular strategy launches its background
    /// work and returns promptly.
    async fn start(&self) -> Result<(), SyncError>;

    /// Stop syncing. Safe to call when not running, and safe to call
    /// concurrently with an in-flight `start`.
    async fn stop(&self) -> Result<(), SyncError>;

    fn is_running(&self) -> bool;
}
