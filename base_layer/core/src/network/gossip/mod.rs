// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

mod ledger;
mod router;
mod topic;

pub use ledger::SubscriptionLedger;
pub use router::{GossipHandler, GossipObject, GossipRouter, SubscriptionToken};
pub use topic::{GossipEncoding, GossipKind, GossipTopic};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

/// A message delivered by the pub/sub transport, prior to validation and
/// decoding.
#[derive(Debug, Clone)]
pub struct RawGossipMessage {
    pub topic: String,
    pub data: Bytes,
}

/// Decision made by the injected message validator before a payload reaches
/// any typed handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accept,
    Ignore,
    Reject,
}

/// Cryptographic/semantic validation of raw gossip payloads. External
/// collaborator; the router only honours its verdicts.
pub trait MessageValidator: Send + Sync {
    fn validate(&self, topic: &str, data: &[u8]) -> ValidationOutcome;
}

/// The underlying pub/sub transport. Subscribe/unsubscribe are assumed to
/// succeed or fail fatally; the router performs no retries.
#[async_trait]
pub trait PubsubTransport: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), GossipError>;

    async fn unsubscribe(&self, topic: &str) -> Result<(), GossipError>;

    async fn publish(&self, topic: &str, data: Bytes) -> Result<(), GossipError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GossipError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to encode gossip payload: {0}")]
    Encode(String),
    #[error("chain head unavailable: {0}")]
    HeadUnavailable(String),
    #[error("already started")]
    AlreadyStarted,
}

pub(crate) fn encode_payload<T: Serialize>(value: &T) -> Result<Bytes, GossipError> {
    bincode::serialize(value)
        .map(Bytes::from)
        .map_err(|e| GossipError::Encode(e.to_string()))
}

pub(crate) fn decode_payload<T: DeserializeOwned>(data: &[u8]) -> Option<T> {
    bincode::deserialize(data).ok()
}
