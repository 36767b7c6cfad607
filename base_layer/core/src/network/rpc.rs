// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! Point-to-point request/response: the client surface consumed by sync and
//! discovery, and the inbound service answering the same queries for peers.

use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use polaris_shutdown::Shutdown;
use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
};

use crate::{
    chain::ChainInterface,
    network::metadata::MetadataStore,
    types::{NodeMetadata, PeerId, Root, SignedBeaconBlock, Slot},
};

const LOG_TARGET: &str = "p::net::rpc";

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("request to peer {0} failed: {1}")]
    RequestFailed(PeerId, String),
    #[error("rpc service is already started")]
    AlreadyStarted,
}

/// Outbound request/response calls. The transport-level stream handling is
/// an external collaborator; responses may contain fewer items than
/// requested, including none.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn blocks_by_root(&self, peer: PeerId, roots: &[Root]) -> Result<Vec<SignedBeaconBlock>, RpcError>;

    async fn blocks_by_range(&self, peer: PeerId, start_slot: Slot, count: u64)
        -> Result<Vec<SignedBeaconBlock>, RpcError>;

    async fn metadata(&self, peer: PeerId) -> Result<NodeMetadata, RpcError>;
}

/// An inbound query delivered by the transport, answered over a oneshot
/// reply channel.
#[derive(Debug)]
pub enum InboundRpcRequest {
    BlocksByRoot {
        peer: PeerId,
        roots: Vec<Root>,
        reply: oneshot::Sender<Vec<SignedBeaconBlock>>,
    },
    Metadata {
        peer: PeerId,
        reply: oneshot::Sender<NodeMetadata>,
    },
}

/// Serves inbound queries from the chain and the metadata store.
pub struct RpcService {
    chain: Arc<dyn ChainInterface>,
    metadata: MetadataStore,
    inbound: Mutex<Option<mpsc::Receiver<InboundRpcRequest>>>,
    task: Mutex<Option<(Shutdown, JoinHandle<()>)>>,
}

impl RpcService {
    pub fn new(chain: Arc<dyn ChainInterface>, metadata: MetadataStore, inbound: mpsc::Receiver<InboundRpcRequest>) -> Self {
        Self {
            chain,
            metadata,
            inbound: Mutex::new(Some(inbound)),
            task: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<(), RpcError> {
        let mut task = self.task.lock().await;
        let Some(mut inbound) = self.inbound.lock().await.take() else {
            return Err(RpcError::AlreadyStarted);
        };
        let chain = self.chain.clone();
        let metadata = self.metadata.clone();
        let shutdown = Shutdown::new();
        let mut signal = shutdown.to_signal();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = signal.wait() => break,
                    request = inbound.recv() => match request {
                        Some(request) => handle_request(&*chain, &metadata, request).await,
                        None => break,
                    },
                }
            }
            debug!(target: LOG_TARGET, "Rpc service shut down");
        });
        *task = Some((shutdown, handle));
        Ok(())
    }

    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        if let Some((shutdown, handle)) = task.take() {
            shutdown.trigger();
            let _ = handle.await;
        }
    }
}

async fn handle_request(chain: &dyn ChainInterface, metadata: &MetadataStore, request: InboundRpcRequest) {
    match request {
        InboundRpcRequest::BlocksByRoot { peer, roots, reply } => {
            let mut blocks = Vec::new();
            for root in roots {
                match chain.block_by_root(root).await {
                    Ok(Some(block)) => blocks.push(block),
                    Ok(None) => {},
                    Err(e) => {
                        debug!(
                            target: LOG_TARGET,
                            "Failed to look up block {} for {}: {}",
                            root.short_str(),
                            peer.short_str(),
                            e
                        );
                    },
                }
            }
            let _ = reply.send(blocks);
        },
        InboundRpcRequest::Metadata { peer, reply } => {
            trace!(target: LOG_TARGET, "Serving metadata to {}", peer.short_str());
            let _ = reply.send(metadata.node_metadata().await);
        },
    }
}
