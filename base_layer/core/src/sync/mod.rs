// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! Chain synchronization: the coordinator state machine, the two
//! mutually-exclusive sync strategies and their supporting services.

pub mod attestation_collector;
pub mod coordinator;
pub mod gossip_bridge;
pub mod initial;
pub mod regular;
pub mod round_robin;
pub mod states;
pub mod strategy;

pub use attestation_collector::AttestationCollector;
pub use coordinator::SyncCoordinator;
pub use gossip_bridge::GossipBridge;
pub use initial::BatchSync;
pub use regular::HeadFollowSync;
pub use round_robin::RoundRobinSelector;
pub use states::SyncMode;
pub use strategy::SyncStrategy;

use crate::{
    chain::ChainError,
    network::{gossip::GossipError, rpc::RpcError},
};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("gossip error: {0}")]
    Gossip(#[from] GossipError),
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
    #[error("sync component is already started")]
    AlreadyStarted,
    #[error("sync component is not started")]
    NotStarted,
}
