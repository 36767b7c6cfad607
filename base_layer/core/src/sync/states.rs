// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::fmt::{Display, Error, Formatter};

/// The sync coordinator's state. Exactly one value is active at a time;
/// `Stopped` is terminal — a stopped coordinator never syncs again and a new
/// one must be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncMode {
    /// Polling until enough status-qualified peers are connected.
    WaitingPeers,
    /// Bulk historical catch-up is running.
    InitialSyncing,
    /// Following the live chain via gossip.
    RegularSyncing,
    /// Fully caught up. Reached via an external completeness signal; the
    /// coordinator itself drives no further than `RegularSyncing`.
    Synced,
    Stopped,
}

impl SyncMode {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncMode::Synced)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, SyncMode::Stopped)
    }
}

impl Display for SyncMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let s = match self {
            SyncMode::WaitingPeers => "Waiting for peers",
            SyncMode::InitialSyncing => "Initial syncing",
            SyncMode::RegularSyncing => "Regular syncing",
            SyncMode::Synced => "Synced",
            SyncMode::Stopped => "Stopped",
        };
        f.write_str(s)
    }
}
