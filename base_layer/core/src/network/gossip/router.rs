// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{collections::HashMap, sync::Arc};

use log::*;
use polaris_shutdown::Shutdown;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};

use crate::{
    chain::ChainInterface,
    config::ProtocolParams,
    consts::ATTESTATION_SUBNET_COUNT,
    network::{
        gossip::{
            decode_payload,
            encode_payload,
            GossipError,
            GossipKind,
            GossipTopic,
            MessageValidator,
            PubsubTransport,
            RawGossipMessage,
            SubscriptionLedger,
            ValidationOutcome,
        },
        metadata::MetadataStore,
    },
    types::{
        Attestation,
        AttesterSlashing,
        Epoch,
        ForkDigest,
        ProposerSlashing,
        SignedAggregateAndProof,
        SignedBeaconBlock,
        SignedVoluntaryExit,
        Slot,
    },
};

const LOG_TARGET: &str = "p::net::gossip";

/// A decoded object delivered to topic handlers.
#[derive(Debug, Clone)]
pub enum GossipObject {
    Block(SignedBeaconBlock),
    AggregateAndProof(SignedAggregateAndProof),
    Attestation(Attestation),
    VoluntaryExit(SignedVoluntaryExit),
    ProposerSlashing(ProposerSlashing),
    AttesterSlashing(AttesterSlashing),
    SubnetAttestation { subnet: u64, attestation: Attestation },
}

pub type GossipHandler = Arc<dyn Fn(GossipObject) + Send + Sync>;

/// Proof of a single logical subscription. Required to unsubscribe; the
/// token pins the exact topic (kind + fork digest) it was created for.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionToken {
    id: u64,
    topic: GossipTopic,
}

impl SubscriptionToken {
    pub fn kind(&self) -> GossipKind {
        self.topic.kind
    }
}

#[derive(Default)]
struct RouterState {
    ledger: SubscriptionLedger,
    handlers: HashMap<String, Vec<(u64, GossipHandler)>>,
    next_id: u64,
}

/// Routes typed gossip between the pub/sub transport and local handlers.
///
/// Subscriptions are reference counted per topic through the
/// [`SubscriptionLedger`]; the transport sees exactly one subscribe per 0→1
/// edge and one unsubscribe per 1→0 edge. Attestation-subnet subscriptions
/// additionally maintain the advertised attnets bit, gated on the bit's own
/// current value, independent of the ledger count. These are two separate
/// state machines and are kept that way deliberately.
///
/// Handler decode tables are built once at `start` for the fork digest
/// current at that moment; resubscribing after a fork transition is the
/// caller's responsibility.
pub struct GossipRouter {
    params: ProtocolParams,
    transport: Arc<dyn PubsubTransport>,
    validator: Arc<dyn MessageValidator>,
    chain: Arc<dyn ChainInterface>,
    metadata: MetadataStore,
    state: Arc<Mutex<RouterState>>,
    dispatch: Mutex<Option<(Shutdown, JoinHandle<()>)>>,
}

impl GossipRouter {
    pub fn new(
        params: ProtocolParams,
        transport: Arc<dyn PubsubTransport>,
        validator: Arc<dyn MessageValidator>,
        chain: Arc<dyn ChainInterface>,
        metadata: MetadataStore,
    ) -> Self {
        Self {
            params,
            transport,
            validator,
            chain,
            metadata,
            state: Arc::new(Mutex::new(RouterState::default())),
            dispatch: Mutex::new(None),
        }
    }

    /// Start the dispatch task bridging `inbound` transport messages to the
    /// registered handlers. The decode table is bound to the fork digest
    /// current at this call.
    pub async fn start(&self, inbound: mpsc::Receiver<RawGossipMessage>) -> Result<(), GossipError> {
        let mut dispatch = self.dispatch.lock().await;
        if dispatch.is_some() {
            return Err(GossipError::AlreadyStarted);
        }
        let fork_digest = self.chain.current_fork_digest();
        let decode_table = build_decode_table(fork_digest);
        let state = self.state.clone();
        let validator = self.validator.clone();
        let shutdown = Shutdown::new();
        let mut signal = shutdown.to_signal();
        let handle = tokio::spawn(async move {
            let mut inbound = inbound;
            loop {
                tokio::select! {
                    _ = signal.wait() => break,
                    msg = inbound.recv() => match msg {
                        Some(msg) => dispatch_message(&state, &*validator, &decode_table, msg).await,
                        None => break,
                    },
                }
            }
            debug!(target: LOG_TARGET, "Gossip dispatch task shut down");
        });
        *dispatch = Some((shutdown, handle));
        info!(
            target: LOG_TARGET,
            "Gossip router started for fork digest {}", fork_digest
        );
        Ok(())
    }

    /// Stop the dispatch task and drop every registered handler. No message
    /// is delivered after this returns.
    pub async fn stop(&self) {
        let mut dispatch = self.dispatch.lock().await;
        if let Some((shutdown, handle)) = dispatch.take() {
            shutdown.trigger();
            let _ = handle.await;
        }
        self.state.lock().await.handlers.clear();
    }

    /// Register `handler` for `kind` on the given fork digest. The transport
    /// is subscribed only when this is the topic's first subscriber.
    pub async fn subscribe(
        &self,
        fork_digest: ForkDigest,
        kind: GossipKind,
        handler: GossipHandler,
    ) -> Result<SubscriptionToken, GossipError> {
        let topic = GossipTopic::new(kind, fork_digest);
        let topic_str = topic.encode();
        let (id, activated) = {
            let mut state = self.state.lock().await;
            let id = state.next_id;
            state.next_id += 1;
            state.handlers.entry(topic_str.clone()).or_default().push((id, handler));
            (id, state.ledger.increment(&topic_str))
        };
        if activated {
            debug!(target: LOG_TARGET, "Subscribing transport to {}", topic_str);
            self.transport.subscribe(&topic_str).await?;
        }
        Ok(SubscriptionToken { id, topic })
    }

    /// Remove the token's handler and decrement the topic's count. The
    /// transport is unsubscribed only when this was the last subscriber.
    pub async fn unsubscribe(&self, token: SubscriptionToken) -> Result<(), GossipError> {
        let topic_str = token.topic.encode();
        let deactivated = {
            let mut state = self.state.lock().await;
            if let Some(list) = state.handlers.get_mut(&topic_str) {
                list.retain(|(id, _)| *id != token.id);
                if list.is_empty() {
                    state.handlers.remove(&topic_str);
                }
            }
            state.ledger.decrement(&topic_str)
        };
        if deactivated {
            debug!(target: LOG_TARGET, "Unsubscribing transport from {}", topic_str);
            self.transport.unsubscribe(&topic_str).await?;
        }
        Ok(())
    }

    /// Subscribe to a committee attestation subnet. Besides the ledger
    /// bookkeeping this sets the advertised attnets bit if it is currently
    /// unset — the bit is gated on its own value, not on the ledger edge.
    pub async fn subscribe_to_attestation_subnet(
        &self,
        fork_digest: ForkDigest,
        subnet: u64,
        handler: GossipHandler,
    ) -> Result<SubscriptionToken, GossipError> {
        let token = self
            .subscribe(fork_digest, GossipKind::CommitteeAttestation(subnet), handler)
            .await?;
        self.metadata.set_attnet(subnet, true).await;
        Ok(token)
    }

    /// Counterpart of [`subscribe_to_attestation_subnet`]: clears the
    /// advertised bit if it is currently set, independent of the ledger.
    ///
    /// [`subscribe_to_attestation_subnet`]: GossipRouter::subscribe_to_attestation_subnet
    pub async fn unsubscribe_from_attestation_subnet(&self, token: SubscriptionToken) -> Result<(), GossipError> {
        self.unsubscribe(token).await?;
        match token.kind() {
            GossipKind::CommitteeAttestation(subnet) => {
                self.metadata.set_attnet(subnet, false).await;
            },
            kind => warn!(
                target: LOG_TARGET,
                "Attestation subnet unsubscribe called with a {} token", kind
            ),
        }
        Ok(())
    }

    pub async fn publish_block(&self, block: &SignedBeaconBlock) -> Result<(), GossipError> {
        self.publish(GossipKind::BeaconBlock, encode_payload(block)?).await
    }

    pub async fn publish_committee_attestation(&self, subnet: u64, attestation: &Attestation) -> Result<(), GossipError> {
        self.publish(GossipKind::CommitteeAttestation(subnet), encode_payload(attestation)?)
            .await
    }

    pub async fn publish_aggregate_and_proof(&self, aggregate: &SignedAggregateAndProof) -> Result<(), GossipError> {
        self.publish(GossipKind::BeaconAggregateAndProof, encode_payload(aggregate)?)
            .await
    }

    pub async fn publish_voluntary_exit(&self, exit: &SignedVoluntaryExit) -> Result<(), GossipError> {
        self.publish(GossipKind::VoluntaryExit, encode_payload(exit)?).await
    }

    pub async fn publish_proposer_slashing(&self, slashing: &ProposerSlashing) -> Result<(), GossipError> {
        self.publish(GossipKind::ProposerSlashing, encode_payload(slashing)?).await
    }

    pub async fn publish_attester_slashing(&self, slashing: &AttesterSlashing) -> Result<(), GossipError> {
        self.publish(GossipKind::AttesterSlashing, encode_payload(slashing)?).await
    }

    /// The fork digest in force at the current head.
    pub fn current_fork_digest(&self) -> ForkDigest {
        self.chain.current_fork_digest()
    }

    /// Fork digest for an arbitrary epoch: the previous fork version before
    /// the scheduled fork epoch, the current version from it onwards.
    pub async fn fork_digest_by_epoch(&self, epoch: Epoch) -> Result<ForkDigest, GossipError> {
        let head = self
            .chain
            .head_state()
            .await
            .map_err(|e| GossipError::HeadUnavailable(e.to_string()))?;
        let version = head.fork.version_at(epoch);
        Ok(self.chain.compute_fork_digest(version, head.genesis_validators_root))
    }

    pub async fn fork_digest_by_slot(&self, slot: Slot) -> Result<ForkDigest, GossipError> {
        self.fork_digest_by_epoch(self.params.epoch_at_slot(slot)).await
    }

    async fn publish(&self, kind: GossipKind, data: bytes::Bytes) -> Result<(), GossipError> {
        let topic = GossipTopic::new(kind, self.chain.current_fork_digest()).encode();
        trace!(target: LOG_TARGET, "Publishing {} bytes to {}", data.len(), topic);
        self.transport.publish(&topic, data).await
    }
}

fn build_decode_table(fork_digest: ForkDigest) -> HashMap<String, GossipKind> {
    let mut table = HashMap::new();
    let kinds = [
        GossipKind::BeaconBlock,
        GossipKind::BeaconAggregateAndProof,
        GossipKind::BeaconAttestation,
        GossipKind::VoluntaryExit,
        GossipKind::ProposerSlashing,
        GossipKind::AttesterSlashing,
    ];
    for kind in kinds {
        table.insert(GossipTopic::new(kind, fork_digest).encode(), kind);
    }
    for subnet in 0..ATTESTATION_SUBNET_COUNT {
        let kind = GossipKind::CommitteeAttestation(subnet);
        table.insert(GossipTopic::new(kind, fork_digest).encode(), kind);
    }
    table
}

async fn dispatch_message(
    state: &Mutex<RouterState>,
    validator: &dyn MessageValidator,
    decode_table: &HashMap<String, GossipKind>,
    msg: RawGossipMessage,
) {
    match validator.validate(&msg.topic, &msg.data) {
        ValidationOutcome::Accept => {},
        ValidationOutcome::Ignore => {
            trace!(target: LOG_TARGET, "Ignoring gossip message on {}", msg.topic);
            return;
        },
        ValidationOutcome::Reject => {
            warn!(target: LOG_TARGET, "Rejected gossip message on {}", msg.topic);
            return;
        },
    }
    let Some(kind) = decode_table.get(&msg.topic) else {
        trace!(target: LOG_TARGET, "Message on unhandled topic {}", msg.topic);
        return;
    };
    let Some(object) = decode_object(*kind, &msg.data) else {
        debug!(target: LOG_TARGET, "Undecodable payload on {}", msg.topic);
        return;
    };
    let handlers = state
        .lock()
        .await
        .handlers
        .get(&msg.topic)
        .cloned()
        .unwrap_or_default();
    for (_, handler) in handlers {
        handler(object.clone());
    }
}

fn decode_object(kind: GossipKind, data: &[u8]) -> Option<GossipObject> {
    use GossipKind::*;
    let object = match kind {
        BeaconBlock => GossipObject::Block(decode_payload(data)?),
        BeaconAggregateAndProof => GossipObject::AggregateAndProof(decode_payload(data)?),
        BeaconAttestation => GossipObject::Attestation(decode_payload(data)?),
        VoluntaryExit => GossipObject::VoluntaryExit(decode_payload(data)?),
        ProposerSlashing => GossipObject::ProposerSlashing(decode_payload(data)?),
        AttesterSlashing => GossipObject::AttesterSlashing(decode_payload(data)?),
        CommitteeAttestation(subnet) => GossipObject::SubnetAttestation {
            subnet,
            attestation: decode_payload(data)?,
        },
    };
    Some(object)
}
