//! Agent template value object

use crate::core::tier::Tier;
use crate::quality::QualityGates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reusable archetype from which agents are instantiated (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTemplate {
    /// Unique identifier within the catalog
    pub id: String,
    /// Human label (e.g. "Security Scanner")
    pub role: String,
    pub capabilities: BTreeSet<String>,
    pub tier_preference: Tier,
    pub tools: Vec<String>,
    /// Instruction text with `{{placeholder}}` markers
    pub default_instructions: String,
    pub quality_gates: QualityGates,
    /// Per-call timeout override in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AgentTemplate {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        tier_preference: Tier,
        default_instructions: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            capabilities: BTreeSet::new(),
            tier_preference,
            tools: Vec::new(),
            default_instructions: default_instructions.into(),
            quality_gates: QualityGates::new(),
            timeout_secs: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.capabilities
            .extend(capabilities.iter().map(|c| c.to_string()));
        self
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools.extend(tools.iter().map(|t| t.to_string()));
        self
    }

    pub fn with_gate(mut self, name: &str, threshold: f64) -> Self {
        self.quality_gates = self.quality_gates.with_gate(name, threshold);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}
