// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! Peer-to-peer networking and chain synchronization core for the Polaris
//! beacon node.
//!
//! The crate covers the gossip topic manager, peer and subnet discovery,
//! the node's advertised metadata, the random-subnet rotation task and the
//! sync coordinator that takes a node from "no peers" to following the live
//! chain head. The chain itself, storage, signature verification and the
//! raw transport are external collaborators behind the traits in [`chain`],
//! [`pool`] and [`network`].

pub mod chain;
pub mod config;
pub mod consts;
pub mod network;
pub mod pool;
pub mod sync;
pub mod tasks;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
