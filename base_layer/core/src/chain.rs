// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! The consumed surface of the chain collaborator.
//!
//! Block validation, state transition and fork-digest hashing live outside
//! this crate; the networking core only reads head information, hands over
//! recovered blocks and observes chain events.

use std::{
    fmt::{Display, Error, Formatter},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::types::{Fork, ForkDigest, ForkVersion, Root, SignedBeaconBlock, Slot};

/// The subset of head-state fields the networking core reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeadState {
    pub fork: Fork,
    pub genesis_validators_root: Root,
    pub slot: Slot,
}

#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// A gossip or rpc message referenced a block root the chain cannot
    /// resolve; the sync layer is expected to repair it.
    UnknownBlockRoot(Root),
    /// A block was fully processed and extends the known chain.
    BlockProcessed(SignedBeaconBlock),
}

impl Display for ChainEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            ChainEvent::UnknownBlockRoot(root) => write!(f, "UnknownBlockRoot({})", root.short_str()),
            ChainEvent::BlockProcessed(block) => write!(f, "BlockProcessed(#{})", block.slot()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("head state is not available")]
    HeadStateUnavailable,
    #[error("block rejected: {0}")]
    BlockRejected(String),
}

#[async_trait]
pub trait ChainInterface: Send + Sync {
    async fn head_state(&self) -> Result<HeadState, ChainError>;

    async fn head_slot(&self) -> Result<Slot, ChainError>;

    /// The fork digest in force at the current head.
    fn current_fork_digest(&self) -> ForkDigest;

    /// Black-box digest of `(fork_version, genesis_validators_root)`.
    fn compute_fork_digest(&self, version: ForkVersion, genesis_validators_root: Root) -> ForkDigest;

    /// Hand a block to the chain for validation and import.
    async fn receive_block(&self, block: SignedBeaconBlock) -> Result<(), ChainError>;

    /// Look up a known block by its root, serving rpc queries from peers.
    async fn block_by_root(&self, root: Root) -> Result<Option<SignedBeaconBlock>, ChainError>;

    fn event_stream(&self) -> broadcast::Receiver<Arc<ChainEvent>>;
}
