// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use crate::types::{
    Attestation,
    AttesterSlashing,
    ProposerSlashing,
    SignedAggregateAndProof,
    SignedVoluntaryExit,
};

/// Destination for non-block objects received over gossip. The pool decides
/// retention and inclusion; this crate only delivers.
pub trait OperationPool: Send + Sync {
    fn insert_attestation(&self, attestation: Attestation);

    fn insert_aggregate(&self, aggregate: SignedAggregateAndProof);

    fn insert_voluntary_exit(&self, exit: SignedVoluntaryExit);

    fn insert_proposer_slashing(&self, slashing: ProposerSlashing);

    fn insert_attester_slashing(&self, slashing: AttesterSlashing);
}
