//! Plan approval from the terminal.
//!
//! Implements the coordination port for a single local user: a proposed
//! plan is printed to stderr and the decision is read from stdin.
//!
//! ```text
//! ───────────────────────────────────────────────
//!   Plan awaiting approval: security:moderate
//! ───────────────────────────────────────────────
//!   strategy: parallel
//!   1. security_scanner (capable)
//!   2. vulnerability_analyst (capable)
//!
//! approve [Y/n, or "reject <reason>"]>
//! ```

use async_trait::async_trait;
use colored::Colorize;
use conductor_application::{CoordinationError, Coordinator, MessagePredicate};
use serde_json::{Value, json};
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Coordinator that asks the person at the terminal
pub struct ConsoleApproval;

impl ConsoleApproval {
    pub fn new() -> Self {
        Self
    }

    fn display_plan(payload: &Value) {
        let rule = "───────────────────────────────────────────────".yellow();
        let pattern = payload
            .get("task_pattern")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        eprintln!();
        eprintln!("{}", rule);
        eprintln!("  {} {}", "Plan awaiting approval:".yellow().bold(), pattern);
        eprintln!("{}", rule);
        if let Some(strategy) = payload.get("strategy").and_then(Value::as_str) {
            eprintln!("  strategy: {}", strategy.cyan());
        }
        let agents = payload
            .get("agents")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (i, agent) in agents.iter().enumerate() {
            let template = agent.get("template_id").and_then(Value::as_str).unwrap_or("?");
            let tier = agent.get("tier").and_then(Value::as_str).unwrap_or("?");
            eprintln!("  {}. {} ({})", i + 1, template, tier.dimmed());
        }
        eprintln!();
    }

    fn prompt() {
        eprint!("{} ", "approve [Y/n, or \"reject <reason>\"]>".magenta().bold());
        let _ = io::stderr().flush();
    }
}

impl Default for ConsoleApproval {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn one line of user input into a decision message.
///
/// Returns `None` for input that is neither an approval nor a rejection.
pub fn parse_decision(input: &str) -> Option<Value> {
    let input = input.trim();
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    match command.to_lowercase().as_str() {
        "" | "y" | "yes" | "a" | "approve" | "/approve" => Some(json!({ "decision": "approve" })),
        "n" | "no" | "r" | "q" | "reject" | "/reject" => {
            let reason = if rest.is_empty() { "rejected at the terminal" } else { rest };
            Some(json!({ "decision": "reject", "reason": reason }))
        }
        _ => None,
    }
}

#[async_trait]
impl Coordinator for ConsoleApproval {
    async fn publish(
        &self,
        topic: &str,
        payload: Value,
        _ttl: Duration,
    ) -> Result<(), CoordinationError> {
        if topic.ends_with("/proposed") {
            Self::display_plan(&payload);
        }
        Ok(())
    }

    async fn subscribe_once(
        &self,
        topic: &str,
        predicate: &MessagePredicate,
        timeout: Duration,
    ) -> Option<Value> {
        if !topic.ends_with("/decision") {
            return None;
        }

        let read = async {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                Self::prompt();
                let Ok(Some(line)) = lines.next_line().await else {
                    return None;
                };
                match parse_decision(&line) {
                    Some(decision) if predicate(&decision) => return Some(decision),
                    Some(_) => return None,
                    None => eprintln!("{} {}", "Unknown answer:".yellow(), line.trim().red()),
                }
            }
        };

        match tokio::time::timeout(timeout, read).await {
            Ok(decision) => decision,
            Err(_) => {
                eprintln!();
                eprintln!("{}", "No answer before the approval timeout; proceeding".yellow());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision_approvals() {
        for input in ["", "y", "YES", "a", "/approve", "  approve  "] {
            let decision = parse_decision(input).unwrap();
            assert_eq!(decision["decision"], "approve", "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_decision_rejections_keep_reason() {
        let decision = parse_decision("reject too expensive").unwrap();
        assert_eq!(decision["decision"], "reject");
        assert_eq!(decision["reason"], "too expensive");

        let decision = parse_decision("n").unwrap();
        assert_eq!(decision["reason"], "rejected at the terminal");
    }

    #[test]
    fn test_parse_decision_unknown_input() {
        assert!(parse_decision("maybe").is_none());
        assert!(parse_decision("/edit").is_none());
    }

    #[tokio::test]
    async fn test_other_topics_are_ignored() {
        let approval = ConsoleApproval::new();
        assert!(approval
            .publish("plan/p1/progress", json!({}), Duration::from_secs(1))
            .await
            .is_ok());

        let any = |_: &Value| true;
        let message = approval
            .subscribe_once("plan/p1/proposed", &any, Duration::from_millis(10))
            .await;
        assert!(message.is_none());
    }
}
