//! In-process pub-sub coordinator.
//!
//! Messages are broadcast to live subscribers and also retained per topic
//! until their TTL runs out, so a subscriber that arrives after the
//! publish still sees the message.

use async_trait::async_trait;
use conductor_application::ports::coordination::{
    CoordinationError, Coordinator, MessagePredicate,
};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
struct Envelope {
    topic: String,
    payload: Value,
}

struct Retained {
    payload: Value,
    expires: Instant,
}

pub struct InProcessCoordinator {
    sender: broadcast::Sender<Envelope>,
    retained: Mutex<HashMap<String, Vec<Retained>>>,
}

impl Default for InProcessCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessCoordinator {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            retained: Mutex::new(HashMap::new()),
        }
    }

    async fn retained_match(&self, topic: &str, predicate: &MessagePredicate) -> Option<Value> {
        let now = Instant::now();
        let mut retained = self.retained.lock().await;
        let messages = retained.get_mut(topic)?;
        messages.retain(|m| m.expires > now);
        messages
            .iter()
            .find(|m| predicate(&m.payload))
            .map(|m| m.payload.clone())
    }
}

#[async_trait]
impl Coordinator for InProcessCoordinator {
    async fn publish(
        &self,
        topic: &str,
        payload: Value,
        ttl: Duration,
    ) -> Result<(), CoordinationError> {
        {
            let now = Instant::now();
            let mut retained = self.retained.lock().await;
            retained.retain(|_, messages| {
                messages.retain(|m| m.expires > now);
                !messages.is_empty()
            });
            if !ttl.is_zero() {
                retained.entry(topic.to_string()).or_default().push(Retained {
                    payload: payload.clone(),
                    expires: now + ttl,
                });
            }
        }

        debug!("Published on {}", topic);
        // No live subscribers is not an error
        let _ = self.sender.send(Envelope {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }

    async fn subscribe_once(
        &self,
        topic: &str,
        predicate: &MessagePredicate,
        timeout: Duration,
    ) -> Option<Value> {
        // Subscribe before checking retained messages so nothing slips between
        let mut receiver = self.sender.subscribe();
        if let Some(found) = self.retained_match(topic, predicate).await {
            return Some(found);
        }

        let wait = async {
            loop {
                match receiver.recv().await {
                    Ok(envelope) if envelope.topic == topic && predicate(&envelope.payload) => {
                        return Some(envelope.payload);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Coordinator subscriber lagged by {} messages", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        };

        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn any(_: &Value) -> bool {
        true
    }

    #[tokio::test]
    async fn test_live_subscriber_receives_matching_message() {
        let coordinator = Arc::new(InProcessCoordinator::new());
        let publisher = Arc::clone(&coordinator);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher
                .publish("plan/p1/decision", json!({"decision": "skip"}), Duration::ZERO)
                .await
                .unwrap();
            publisher
                .publish("plan/p1/decision", json!({"decision": "approve"}), Duration::ZERO)
                .await
                .unwrap();
        });

        let is_approve = |v: &Value| v["decision"] == "approve";
        let message = coordinator
            .subscribe_once("plan/p1/decision", &is_approve, Duration::from_secs(2))
            .await;
        handle.await.unwrap();

        assert_eq!(message, Some(json!({"decision": "approve"})));
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_retained_message() {
        let coordinator = InProcessCoordinator::new();
        coordinator
            .publish("plan/p2/decision", json!({"decision": "reject"}), Duration::from_secs(60))
            .await
            .unwrap();

        let message = coordinator
            .subscribe_once("plan/p2/decision", &any, Duration::from_millis(10))
            .await;
        assert_eq!(message, Some(json!({"decision": "reject"})));
    }

    #[tokio::test]
    async fn test_timeout_and_topic_isolation() {
        let coordinator = InProcessCoordinator::new();
        coordinator
            .publish("plan/other/decision", json!({"decision": "reject"}), Duration::from_secs(60))
            .await
            .unwrap();

        let message = coordinator
            .subscribe_once("plan/p3/decision", &any, Duration::from_millis(30))
            .await;
        assert!(message.is_none());
    }

    #[tokio::test]
    async fn test_retained_message_expires() {
        let coordinator = InProcessCoordinator::new();
        coordinator
            .publish("t", json!(1), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(coordinator.subscribe_once("t", &any, Duration::from_millis(10)).await.is_none());
    }
}
