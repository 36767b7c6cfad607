// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use crate::types::{PeerId, SubnetBitfield};

/// A record from the external discovery table. Records are gossiped around
/// the discovery overlay and may be stale; advertised subnets must be
/// confirmed against the peer directly before being relied upon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredPeer {
    pub peer_id: PeerId,
    /// Attnets bitfield from the record, absent when the peer does not
    /// advertise one.
    pub attnets: Option<SubnetBitfield>,
}

impl DiscoveredPeer {
    pub fn advertises_subnet(&self, subnet: u64) -> bool {
        self.attnets.map(|bits| bits.get(subnet)).unwrap_or(false)
    }
}

/// Read access to the discovery table. External collaborator; only a
/// snapshot of the current records is consumed.
pub trait DiscoveryTable: Send + Sync {
    fn table_records(&self) -> Vec<DiscoveredPeer>;
}
