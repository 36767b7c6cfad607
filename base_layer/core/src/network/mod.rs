// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

pub mod discovery;
pub mod gossip;
pub mod metadata;
pub mod peer_directory;
pub mod rpc;

pub use discovery::{DiscoveredPeer, DiscoveryTable};
pub use metadata::MetadataStore;
pub use peer_directory::{ConnectionDirection, Peer, PeerDirectory, PeerEvent};
pub use rpc::{InboundRpcRequest, RpcClient, RpcError, RpcService};
