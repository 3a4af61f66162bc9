//! Task requirements value objects

use crate::util::digest_hex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::TaskContext;

/// Capability tag added to complex tasks
pub const CAP_SYNTHESIS: &str = "synthesis";
/// Capability tag for tasks that ask for multiple perspectives
pub const CAP_CONSENSUS: &str = "consensus";
/// Capability tag for draft-review-polish tasks
pub const CAP_REFINEMENT: &str = "refinement";
/// Capability tag for tasks that ask to minimize spend
pub const CAP_COST_OPTIMIZATION: &str = "cost_optimization";

/// Domain tag for tasks no keyword table matched
pub const GENERAL_DOMAIN: &str = "general";

/// Capability tags that steer strategy selection rather than call for an agent
pub const CONTROL_CAPABILITIES: [&str; 3] = [CAP_CONSENSUS, CAP_REFINEMENT, CAP_COST_OPTIMIZATION];

/// Estimated reasoning budget of a task
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "low" | "easy" => Ok(Complexity::Simple),
            "moderate" | "medium" => Ok(Complexity::Moderate),
            "complex" | "high" | "hard" => Ok(Complexity::Complex),
            other => Err(format!("unknown complexity: {}", other)),
        }
    }
}

/// Structured requirements for one orchestration request (Value Object)
///
/// Created once by the task analyzer and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequirements {
    /// The task as the caller described it
    pub description: String,
    pub complexity: Complexity,
    /// Free-form domain tag ("security", "testing", ..., "general")
    pub domain: String,
    pub needed_capabilities: BTreeSet<String>,
    /// Monetary ceiling per agent call in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
    /// Floor in [0, 1] for routed model success rates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_success_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_latency_ms: Option<u64>,
    pub interactive: bool,
    /// Exact-match key for this description + context
    pub signature: String,
}

impl TaskRequirements {
    /// Normalized key shared by similar tasks: `"{domain}:{complexity}"`
    pub fn task_pattern(&self) -> String {
        format!("{}:{}", self.domain, self.complexity)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.needed_capabilities.contains(capability)
    }

    /// Capabilities that need an agent (excludes strategy-steering tags)
    pub fn agent_capabilities(&self) -> impl Iterator<Item = &str> {
        self.needed_capabilities
            .iter()
            .map(String::as_str)
            .filter(|c| !CONTROL_CAPABILITIES.contains(c))
    }

    /// Whether the caller signalled cost sensitivity
    pub fn is_cost_sensitive(&self) -> bool {
        self.max_cost.is_some() || self.has_capability(CAP_COST_OPTIMIZATION)
    }
}

/// Compute the exact-match signature of a task.
///
/// Whitespace and case in the description are normalized; the context is
/// serialized in key order.
pub fn task_signature(description: &str, context: &TaskContext) -> String {
    let normalized = description
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");
    let context_json = serde_json::to_string(context).unwrap_or_default();
    digest_hex(&[&normalized, &context_json])
}
