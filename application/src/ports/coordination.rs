//! Coordination port
//!
//! Pub-sub used for interactive plan approval. The orchestrator publishes a
//! proposed plan on `plan/{id}/proposed` and waits for one message on
//! `plan/{id}/decision`.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinationError {
    #[error("Coordinator unavailable")]
    Unavailable,

    #[error("Publish failed: {0}")]
    PublishFailed(String),
}

/// Message filter for [`Coordinator::subscribe_once`]
pub type MessagePredicate = dyn Fn(&Value) -> bool + Send + Sync;

#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Whether this coordinator can deliver messages at all
    fn is_available(&self) -> bool {
        true
    }

    async fn publish(&self, topic: &str, payload: Value, ttl: Duration)
    -> Result<(), CoordinationError>;

    /// First message on `topic` matching `predicate`, or `None` on timeout
    async fn subscribe_once(
        &self,
        topic: &str,
        predicate: &MessagePredicate,
        timeout: Duration,
    ) -> Option<Value>;
}

/// Coordinator that is never available
pub struct NoCoordination;

#[async_trait]
impl Coordinator for NoCoordination {
    fn is_available(&self) -> bool {
        false
    }

    async fn publish(
        &self,
        _topic: &str,
        _payload: Value,
        _ttl: Duration,
    ) -> Result<(), CoordinationError> {
        Err(CoordinationError::Unavailable)
    }

    async fn subscribe_once(
        &self,
        _topic: &str,
        _predicate: &MessagePredicate,
        _timeout: Duration,
    ) -> Option<Value> {
        None
    }
}
