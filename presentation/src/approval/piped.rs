//! Plan approval from piped input.
//!
//! When stdin is not a terminal there is nobody to prompt. Each proposed
//! plan consumes one line of input instead, either a terminal-style answer
//! (`approve`, `reject too costly`) or a JSON decision object, and the
//! decision is published on the plan's decision topic of the wrapped
//! coordinator.
//!
//! ```text
//! printf 'approve\n' | conductor -i "Review this PR"
//! printf '{"decision":"reject","reason":"budget"}\n' | conductor -i "..."
//! ```

use super::console::parse_decision;
use async_trait::async_trait;
use conductor_application::{CoordinationError, Coordinator, MessagePredicate};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::Mutex;
use tracing::warn;

/// Coordinator decorator that answers proposals from a line reader
pub struct PipedApproval<R> {
    inner: Arc<dyn Coordinator>,
    lines: Mutex<Lines<R>>,
}

impl<R: AsyncBufRead + Unpin + Send> PipedApproval<R> {
    pub fn new(inner: Arc<dyn Coordinator>, reader: R) -> Self {
        Self {
            inner,
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Next non-blank line that reads as a decision; `None` at end of input
    async fn next_decision(&self) -> Option<Value> {
        let mut lines = self.lines.lock().await;
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(decision) = parse_line(&line) {
                return Some(decision);
            }
            warn!("Ignoring unrecognized approval input: {}", line.trim());
        }
        None
    }
}

/// JSON decision objects pass through; anything else is a terminal answer
fn parse_line(line: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(line) {
        Ok(value) if value.get("decision").and_then(Value::as_str).is_some() => Some(value),
        _ => parse_decision(line),
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Coordinator for PipedApproval<R> {
    async fn publish(
        &self,
        topic: &str,
        payload: Value,
        ttl: Duration,
    ) -> Result<(), CoordinationError> {
        let plan_id = topic
            .strip_suffix("/proposed")
            .and_then(|t| t.strip_prefix("plan/"))
            .map(str::to_string);
        self.inner.publish(topic, payload, ttl).await?;

        let Some(plan_id) = plan_id else {
            return Ok(());
        };
        match tokio::time::timeout(ttl, self.next_decision()).await {
            Ok(Some(decision)) => {
                let topic = format!("plan/{}/decision", plan_id);
                self.inner.publish(&topic, decision, ttl).await
            }
            Ok(None) | Err(_) => Ok(()),
        }
    }

    async fn subscribe_once(
        &self,
        topic: &str,
        predicate: &MessagePredicate,
        timeout: Duration,
    ) -> Option<Value> {
        self.inner.subscribe_once(topic, predicate, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// Keeps the last message per topic
    #[derive(Default)]
    struct LastMessage(StdMutex<HashMap<String, Value>>);

    #[async_trait]
    impl Coordinator for LastMessage {
        async fn publish(&self, topic: &str, payload: Value, _ttl: Duration) -> Result<(), CoordinationError> {
            self.0.lock().unwrap().insert(topic.to_string(), payload);
            Ok(())
        }

        async fn subscribe_once(
            &self,
            topic: &str,
            predicate: &MessagePredicate,
            _timeout: Duration,
        ) -> Option<Value> {
            self.0.lock().unwrap().get(topic).cloned().filter(|v| predicate(v))
        }
    }

    fn any(_: &Value) -> bool {
        true
    }

    const TTL: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_each_proposal_consumes_one_answer() {
        let bus = Arc::new(LastMessage::default());
        let input: &[u8] = b"\nmaybe\napprove\n{\"decision\":\"reject\",\"reason\":\"budget\"}\n";
        let piped = PipedApproval::new(bus.clone(), input);

        piped.publish("plan/p1/proposed", serde_json::json!({}), TTL).await.unwrap();
        let first = piped.subscribe_once("plan/p1/decision", &any, TTL).await.unwrap();
        assert_eq!(first["decision"], "approve");

        piped.publish("plan/p2/proposed", serde_json::json!({}), TTL).await.unwrap();
        let second = piped.subscribe_once("plan/p2/decision", &any, TTL).await.unwrap();
        assert_eq!(second["decision"], "reject");
        assert_eq!(second["reason"], "budget");
    }

    #[tokio::test]
    async fn test_exhausted_input_leaves_no_decision() {
        let bus = Arc::new(LastMessage::default());
        let piped = PipedApproval::new(bus.clone(), &b""[..]);

        piped.publish("plan/p1/proposed", serde_json::json!({}), TTL).await.unwrap();
        assert!(piped.subscribe_once("plan/p1/decision", &any, TTL).await.is_none());
        assert!(bus.0.lock().unwrap().contains_key("plan/p1/proposed"));
    }

    #[tokio::test]
    async fn test_other_topics_pass_through_untouched() {
        let bus = Arc::new(LastMessage::default());
        let piped = PipedApproval::new(bus.clone(), &b"approve\n"[..]);

        piped.publish("status", serde_json::json!(1), TTL).await.unwrap();
        assert_eq!(bus.0.lock().unwrap().len(), 1);
        // The answer is still there for the next proposal
        piped.publish("plan/p9/proposed", serde_json::json!({}), TTL).await.unwrap();
        assert!(bus.0.lock().unwrap().contains_key("plan/p9/decision"));
    }
}
