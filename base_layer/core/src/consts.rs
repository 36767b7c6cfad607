// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

/// Number of attestation gossip subnets the network is partitioned into.
pub const ATTESTATION_SUBNET_COUNT: u64 = 64;

/// Size in bytes of the attnets capability bitfield.
pub const SUBNET_BITFIELD_BYTES: usize = (ATTESTATION_SUBNET_COUNT / 8) as usize;

/// First segment of every gossip topic identifier.
pub const GOSSIP_TOPIC_NAMESPACE: &str = "eth2";

/// Maximum number of confirmed candidates per subnet-peer discovery scan.
pub const MAX_SUBNET_PEERS: usize = 10;
