// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! Canonical gossip topic identifiers.
//!
//! Topics serialize as `/<namespace>/<fork-digest-hex>/<event>/<encoding>`.
//! Serialization is deterministic: the same logical topic always produces
//! the same string, across restarts. Parsing is intentionally unsupported;
//! inbound topics are matched against strings built locally.

use std::fmt::{Display, Error, Formatter};

use crate::{consts::GOSSIP_TOPIC_NAMESPACE, types::ForkDigest};

/// The kinds of objects carried over fork-scoped gossip topics. Committee
/// attestations embed their subnet in the event segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GossipKind {
    BeaconBlock,
    BeaconAggregateAndProof,
    BeaconAttestation,
    VoluntaryExit,
    ProposerSlashing,
    AttesterSlashing,
    CommitteeAttestation(u64),
}

impl GossipKind {
    fn event_segment(&self) -> String {
        use GossipKind::*;
        match self {
            BeaconBlock => "beacon_block".to_string(),
            BeaconAggregateAndProof => "beacon_aggregate_and_proof".to_string(),
            BeaconAttestation => "beacon_attestation".to_string(),
            VoluntaryExit => "voluntary_exit".to_string(),
            ProposerSlashing => "proposer_slashing".to_string(),
            AttesterSlashing => "attester_slashing".to_string(),
            CommitteeAttestation(subnet) => format!("committee_index{}_beacon_attestation", subnet),
        }
    }
}

impl Display for GossipKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.write_str(&self.event_segment())
    }
}

/// Payload encoding advertised in the topic identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GossipEncoding {
    #[default]
    Ssz,
}

impl Display for GossipEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            GossipEncoding::Ssz => f.write_str("ssz"),
        }
    }
}

/// A fully-scoped gossip topic. Two topics differing only in fork digest are
/// distinct channels; a fork transition invalidates previously built topic
/// strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GossipTopic {
    pub kind: GossipKind,
    pub fork_digest: ForkDigest,
    pub encoding: GossipEncoding,
}

impl GossipTopic {
    pub fn new(kind: GossipKind, fork_digest: ForkDigest) -> Self {
        Self {
            kind,
            fork_digest,
            encoding: GossipEncoding::default(),
        }
    }

    /// The canonical topic string used on the wire.
    pub fn encode(&self) -> String {
        format!(
            "/{}/{}/{}/{}",
            GOSSIP_TOPIC_NAMESPACE,
            self.fork_digest.to_hex(),
            self.kind,
            self.encoding
        )
    }
}

impl Display for GossipTopic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonical_encoding() {
        let digest = ForkDigest([0xb5, 0x30, 0x3f, 0x2a]);
        assert_eq!(
            GossipTopic::new(GossipKind::BeaconBlock, digest).encode(),
            "/eth2/b5303f2a/beacon_block/ssz"
        );
        assert_eq!(
            GossipTopic::new(GossipKind::CommitteeAttestation(5), digest).encode(),
            "/eth2/b5303f2a/committee_index5_beacon_attestation/ssz"
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let digest = ForkDigest([1, 2, 3, 4]);
        let a = GossipTopic::new(GossipKind::VoluntaryExit, digest);
        let b = GossipTopic::new(GossipKind::VoluntaryExit, digest);
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn fork_digest_scopes_topics() {
        let a = GossipTopic::new(GossipKind::BeaconBlock, ForkDigest([1, 2, 3, 4]));
        let b = GossipTopic::new(GossipKind::BeaconBlock, ForkDigest([1, 2, 3, 5]));
        assert_ne!(a.encode(), b.encode());
    }
}
