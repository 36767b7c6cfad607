// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

//! Hand-written mock collaborators shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;

use crate::{
    chain::{ChainError, ChainEvent, ChainInterface, HeadState},
    network::{
        discovery::{DiscoveredPeer, DiscoveryTable},
        gossip::{GossipError, MessageValidator, PubsubTransport, ValidationOutcome},
        rpc::{RpcClient, RpcError},
    },
    pool::OperationPool,
    sync::{strategy::SyncStrategy, SyncError},
    types::{
        Attestation,
        AttestationData,
        AttesterSlashing,
        BeaconBlock,
        Fork,
        ForkDigest,
        ForkVersion,
        NodeMetadata,
        PeerId,
        ProposerSlashing,
        Root,
        SignedAggregateAndProof,
        SignedBeaconBlock,
        SignedVoluntaryExit,
        Slot,
        SubnetBitfield,
    },
};

pub fn sample_block(slot: Slot) -> SignedBeaconBlock {
    SignedBeaconBlock {
        message: BeaconBlock {
            slot,
            proposer_index: slot % 7,
            parent_root: Root([slot as u8; 32]),
            state_root: Root([(slot + 1) as u8; 32]),
            body: vec![0xb0; 8],
        },
        signature: vec![0xc0; 96],
    }
}

pub fn sample_attestation(slot: Slot, committee_index: u64) -> Attestation {
    Attestation {
        aggregation_bits: vec![0b0000_0001],
        data: AttestationData {
            slot,
            committee_index,
            beacon_block_root: Root([slot as u8; 32]),
            source_epoch: 0,
            target_epoch: 1,
        },
        signature: vec![0xd0; 96],
    }
}

pub fn subnet_bitfield(subnets: &[u64]) -> SubnetBitfield {
    let mut bits = SubnetBitfield::new();
    for subnet in subnets {
        bits.set(*subnet, true);
    }
    bits
}

#[derive(Debug)]
struct MockChainState {
    head: HeadState,
    received: Vec<SignedBeaconBlock>,
    blocks: HashMap<Root, SignedBeaconBlock>,
}

/// Chain collaborator with scripted head state, a block store for rpc
/// lookups and a record of every ingested block. The fork digest is a
/// deterministic xor of version and genesis root.
pub struct MockChain {
    state: Mutex<MockChainState>,
    head_slot: AtomicU64,
    events: broadcast::Sender<Arc<ChainEvent>>,
}

impl MockChain {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(MockChainState {
                head: HeadState {
                    fork: Fork {
                        previous_version: [0, 0, 0, 1],
                        current_version: [0, 0, 0, 2],
                        epoch: 0,
                    },
                    genesis_validators_root: Root([7u8; 32]),
                    slot: 0,
                },
                received: Vec::new(),
                blocks: HashMap::new(),
            }),
            head_slot: AtomicU64::new(0),
            events,
        }
    }

    pub async fn set_fork(&self, fork: Fork) {
        self.state.lock().unwrap().head.fork = fork;
    }

    pub async fn insert_block(&self, root: Root, block: SignedBeaconBlock) {
        self.state.lock().unwrap().blocks.insert(root, block);
    }

    pub async fn received_blocks(&self) -> Vec<SignedBeaconBlock> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn emit(&self, event: ChainEvent) {
        let _ = self.events.send(Arc::new(event));
    }
}

#[async_trait]
impl ChainInterface for MockChain {
    async fn head_state(&self) -> Result<HeadState, ChainError> {
        Ok(self.state.lock().unwrap().head)
    }

    async fn head_slot(&self) -> Result<Slot, ChainError> {
        Ok(self.head_slot.load(Ordering::SeqCst))
    }

    fn current_fork_digest(&self) -> ForkDigest {
        let state = self.state.lock().unwrap();
        self.compute_fork_digest(state.head.fork.current_version, state.head.genesis_validators_root)
    }

    fn compute_fork_digest(&self, version: ForkVersion, genesis_validators_root: Root) -> ForkDigest {
        let mut digest = [0u8; 4];
        for (i, byte) in digest.iter_mut().enumerate() {
            *byte = version[i] ^ genesis_validators_root.0[i];
        }
        ForkDigest(digest)
    }

    async fn receive_block(&self, block: SignedBeaconBlock) -> Result<(), ChainError> {
        self.head_slot.fetch_max(block.slot(), Ordering::SeqCst);
        self.state.lock().unwrap().received.push(block.clone());
        self.emit(ChainEvent::BlockProcessed(block));
        Ok(())
    }

    async fn block_by_root(&self, root: Root) -> Result<Option<SignedBeaconBlock>, ChainError> {
        Ok(self.state.lock().unwrap().blocks.get(&root).cloned())
    }

    fn event_stream(&self) -> broadcast::Receiver<Arc<ChainEvent>> {
        self.events.subscribe()
    }
}

#[derive(Debug, Default)]
struct PubsubCalls {
    subscribes: Vec<String>,
    unsubscribes: Vec<String>,
    published: Vec<(String, Bytes)>,
}

/// Transport mock recording every subscribe/unsubscribe/publish call.
#[derive(Debug, Default)]
pub struct MockPubsub {
    calls: Mutex<PubsubCalls>,
}

impl MockPubsub {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn subscribe_calls(&self, topic: &str) -> usize {
        self.calls.lock().unwrap().subscribes.iter().filter(|t| *t == topic).count()
    }

    pub fn unsubscribe_calls(&self, topic: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .unsubscribes
            .iter()
            .filter(|t| *t == topic)
            .count()
    }

    pub fn total_subscribes(&self) -> usize {
        self.calls.lock().unwrap().subscribes.len()
    }

    pub fn total_unsubscribes(&self) -> usize {
        self.calls.lock().unwrap().unsubscribes.len()
    }

    pub fn published(&self) -> Vec<(String, Bytes)> {
        self.calls.lock().unwrap().published.clone()
    }
}

#[async_trait]
impl PubsubTransport for MockPubsub {
    async fn subscribe(&self, topic: &str) -> Result<(), GossipError> {
        self.calls.lock().unwrap().subscribes.push(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), GossipError> {
        self.calls.lock().unwrap().unsubscribes.push(topic.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, data: Bytes) -> Result<(), GossipError> {
        self.calls.lock().unwrap().published.push((topic.to_string(), data));
        Ok(())
    }
}

pub struct AcceptAllValidator;

impl MessageValidator for AcceptAllValidator {
    fn validate(&self, _topic: &str, _data: &[u8]) -> ValidationOutcome {
        ValidationOutcome::Accept
    }
}

pub struct RejectAllValidator;

impl MessageValidator for RejectAllValidator {
    fn validate(&self, _topic: &str, _data: &[u8]) -> ValidationOutcome {
        ValidationOutcome::Reject
    }
}

#[derive(Debug, Default)]
struct RpcState {
    metadata: HashMap<PeerId, NodeMetadata>,
    root_blocks: HashMap<PeerId, Vec<SignedBeaconBlock>>,
    range_blocks: HashMap<PeerId, Vec<SignedBeaconBlock>>,
    failing: HashSet<PeerId>,
    metadata_queries: Vec<PeerId>,
    root_queries: Vec<PeerId>,
}

/// Rpc client mock with per-peer scripted responses. Unscripted peers serve
/// empty block responses and fail metadata queries; `fail_peer` makes every
/// call to that peer error.
#[derive(Clone, Debug, Default)]
pub struct MockRpcClient {
    state: Arc<Mutex<RpcState>>,
}

impl MockRpcClient {
    pub fn set_metadata(&mut self, peer: PeerId, metadata: NodeMetadata) {
        self.state.lock().unwrap().metadata.insert(peer, metadata);
    }

    pub fn set_root_blocks(&mut self, peer: PeerId, blocks: Vec<SignedBeaconBlock>) {
        self.state.lock().unwrap().root_blocks.insert(peer, blocks);
    }

    pub fn set_range_blocks(&mut self, peer: PeerId, blocks: Vec<SignedBeaconBlock>) {
        self.state.lock().unwrap().range_blocks.insert(peer, blocks);
    }

    pub fn fail_peer(&mut self, peer: PeerId) {
        self.state.lock().unwrap().failing.insert(peer);
    }

    pub fn metadata_queries(&self) -> Vec<PeerId> {
        self.state.lock().unwrap().metadata_queries.clone()
    }

    pub fn root_queries(&self) -> Vec<PeerId> {
        self.state.lock().unwrap().root_queries.clone()
    }
}

#[async_trait]
impl RpcClient for MockRpcClient {
    async fn blocks_by_root(&self, peer: PeerId, _roots: &[Root]) -> Result<Vec<SignedBeaconBlock>, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.root_queries.push(peer);
        if state.failing.contains(&peer) {
            return Err(RpcError::RequestFailed(peer, "scripted failure".to_string()));
        }
        Ok(state.root_blocks.get(&peer).cloned().unwrap_or_default())
    }

    async fn blocks_by_range(&self, peer: PeerId, start_slot: Slot, count: u64) -> Result<Vec<SignedBeaconBlock>, RpcError> {
        let state = self.state.lock().unwrap();
        if state.failing.contains(&peer) {
            return Err(RpcError::RequestFailed(peer, "scripted failure".to_string()));
        }
        Ok(state
            .range_blocks
            .get(&peer)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.slot() >= start_slot && b.slot() < start_slot + count)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn metadata(&self, peer: PeerId) -> Result<NodeMetadata, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.metadata_queries.push(peer);
        if state.failing.contains(&peer) {
            return Err(RpcError::RequestFailed(peer, "scripted failure".to_string()));
        }
        state
            .metadata
            .get(&peer)
            .copied()
            .ok_or_else(|| RpcError::RequestFailed(peer, "no scripted metadata".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct MockDiscovery {
    records: Vec<DiscoveredPeer>,
}

impl MockDiscovery {
    pub fn add_record(&mut self, peer_id: PeerId, attnets: Option<SubnetBitfield>) {
        self.records.push(DiscoveredPeer { peer_id, attnets });
    }
}

impl DiscoveryTable for MockDiscovery {
    fn table_records(&self) -> Vec<DiscoveredPeer> {
        self.records.clone()
    }
}

/// Operation pool mock recording every inserted object.
#[derive(Debug, Default)]
pub struct MockPool {
    attestations: Mutex<Vec<Attestation>>,
    aggregates: Mutex<Vec<SignedAggregateAndProof>>,
    exits: Mutex<Vec<SignedVoluntaryExit>>,
    proposer_slashings: Mutex<Vec<ProposerSlashing>>,
    attester_slashings: Mutex<Vec<AttesterSlashing>>,
}

impl MockPool {
    pub fn attestations(&self) -> Vec<Attestation> {
        self.attestations.lock().unwrap().clone()
    }

    pub fn aggregates(&self) -> Vec<SignedAggregateAndProof> {
        self.aggregates.lock().unwrap().clone()
    }

    pub fn exits(&self) -> Vec<SignedVoluntaryExit> {
        self.exits.lock().unwrap().clone()
    }
}

impl OperationPool for MockPool {
    fn insert_attestation(&self, attestation: Attestation) {
        self.attestations.lock().unwrap().push(attestation);
    }

    fn insert_aggregate(&self, aggregate: SignedAggregateAndProof) {
        self.aggregates.lock().unwrap().push(aggregate);
    }

    fn insert_voluntary_exit(&self, exit: SignedVoluntaryExit) {
        self.exits.lock().unwrap().push(exit);
    }

    fn insert_proposer_slashing(&self, slashing: ProposerSlashing) {
        self.proposer_slashings.lock().unwrap().push(slashing);
    }

    fn insert_attester_slashing(&self, slashing: AttesterSlashing) {
        self.attester_slashings.lock().unwrap().push(slashing);
    }
}

/// Shared ordered log of strategy lifecycle calls.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// Strategy mock that records start/stop ordering and detects overlap with
/// a peer strategy's running flag.
pub struct RecordingStrategy {
    name: &'static str,
    log: EventLog,
    running: Arc<AtomicBool>,
    other_running: Mutex<Option<Arc<AtomicBool>>>,
    conflict: AtomicBool,
}

impl RecordingStrategy {
    pub fn new(name: &'static str, log: EventLog) -> Self {
        Self {
            name,
            log,
            running: Arc::new(AtomicBool::new(false)),
            other_running: Mutex::new(None),
            conflict: AtomicBool::new(false),
        }
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Record a conflict if `other` is running when this strategy starts.
    pub fn conflicts_with(&self, other: Arc<AtomicBool>) {
        *self.other_running.lock().unwrap() = Some(other);
    }

    pub fn saw_conflict(&self) -> bool {
        self.conflict.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncStrategy for RecordingStrategy {
    async fn start(&self) -> Result<(), SyncError> {
        if let Some(other) = &*self.other_running.lock().unwrap() {
            if other.load(Ordering::SeqCst) {
                self.conflict.store(true, Ordering::SeqCst);
            }
        }
        self.log.push(format!("{}:start", self.name));
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), SyncError> {
        self.log.push(format!("{}:stop", self.name));
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
