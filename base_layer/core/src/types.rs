// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! Primitive identifiers and chain objects carried over gossip and rpc.
//!
//! Byte-level wire encoding of these objects is out of scope for this crate;
//! bodies and signatures are opaque byte vectors.

use std::fmt::{Display, Error, Formatter};

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::consts::{ATTESTATION_SUBNET_COUNT, SUBNET_BITFIELD_BYTES};

pub type Slot = u64;
pub type Epoch = u64;
pub type ForkVersion = [u8; 4];

/// 4-byte digest identifying the active protocol version on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForkDigest(pub [u8; 4]);

impl ForkDigest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for ForkDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.write_str(&self.to_hex())
    }
}

/// 32-byte hash tree root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Root(pub [u8; 32]);

impl Root {
    pub fn short_str(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl Display for Root {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.write_str(&hex::encode(self.0))
    }
}

/// Network-level peer identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId([u8; 16]);

impl PeerId {
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn short_str(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.write_str(&hex::encode(self.0))
    }
}

/// Fixed-size bit vector advertising attestation-subnet interest.
///
/// Bit `i` corresponds to subnet `i`; out-of-range subnets read as unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetBitfield {
    bits: [u8; SUBNET_BITFIELD_BYTES],
}

impl SubnetBitfield {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, subnet: u64) -> bool {
        if subnet >= ATTESTATION_SUBNET_COUNT {
            return false;
        }
        self.bits[(subnet / 8) as usize] & (1 << (subnet % 8)) != 0
    }

    pub fn set(&mut self, subnet: u64, value: bool) {
        if subnet >= ATTESTATION_SUBNET_COUNT {
            return;
        }
        let mask = 1 << (subnet % 8);
        if value {
            self.bits[(subnet / 8) as usize] |= mask;
        } else {
            self.bits[(subnet / 8) as usize] &= !mask;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = u64> + '_ {
        (0..ATTESTATION_SUBNET_COUNT).filter(|s| self.get(*s))
    }
}

impl Display for SubnetBitfield {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.write_str(&hex::encode(self.bits))
    }
}

/// The capability record a node advertises to its peers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub seq_number: u64,
    pub attnets: SubnetBitfield,
}

/// Latest chain status claimed by a peer. Presence of this record is what
/// qualifies a peer for sync operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStatus {
    pub fork_digest: ForkDigest,
    pub finalized_root: Root,
    pub finalized_epoch: Epoch,
    pub head_root: Root,
    pub head_slot: Slot,
}

/// Scheduled fork information from the head state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
    pub previous_version: ForkVersion,
    pub current_version: ForkVersion,
    pub epoch: Epoch,
}

impl Fork {
    /// The fork version in force at `epoch`: the previous version before the
    /// fork epoch, the current version from the fork epoch onwards.
    pub fn version_at(&self, epoch: Epoch) -> ForkVersion {
        if epoch < self.epoch {
            self.previous_version
        } else {
            self.current_version
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlock {
    pub slot: Slot,
    pub proposer_index: u64,
    pub parent_root: Root,
    pub state_root: Root,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
    pub signature: Vec<u8>,
}

impl SignedBeaconBlock {
    pub fn slot(&self) -> Slot {
        self.message.slot
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub proposer_index: u64,
    pub parent_root: Root,
    pub state_root: Root,
    pub body_root: Root,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    pub signature: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationData {
    pub slot: Slot,
    pub committee_index: u64,
    pub beacon_block_root: Root,
    pub source_epoch: Epoch,
    pub target_epoch: Epoch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub aggregation_bits: Vec<u8>,
    pub data: AttestationData,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedAttestation {
    pub attesting_indices: Vec<u64>,
    pub data: AttestationData,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateAndProof {
    pub aggregator_index: u64,
    pub aggregate: Attestation,
    pub selection_proof: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAggregateAndProof {
    pub message: AggregateAndProof,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerSlashing {
    pub signed_header_1: SignedBeaconBlockHeader,
    pub signed_header_2: SignedBeaconBlockHeader,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttesterSlashing {
    pub attestation_1: IndexedAttestation,
    pub attestation_2: IndexedAttestation,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoluntaryExit {
    pub epoch: Epoch,
    pub validator_index: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedVoluntaryExit {
    pub message: VoluntaryExit,
    pub signature: Vec<u8>,
}
