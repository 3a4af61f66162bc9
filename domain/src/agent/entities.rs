//! Agent entity

use crate::composition::AgentSpec;
use crate::core::tier::Tier;
use crate::quality::QualityGates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A concrete call target spawned for one execution plan (Entity)
///
/// Owned by the plan that created it and dropped with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// `"{template_id}-{suffix}"`
    pub id: String,
    pub template_id: String,
    pub role: String,
    pub tier: Tier,
    pub capabilities: BTreeSet<String>,
    /// Instructions rendered with the task context
    pub instructions: String,
    /// Unrendered instruction template, kept for composition reuse
    pub instructions_template: String,
    pub tools: Vec<String>,
    pub quality_gates: QualityGates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Set when instruction rendering degraded to the raw template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_warning: Option<String>,
}

impl Agent {
    /// Generate a unique instance id for a template
    pub fn instance_id(template_id: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", template_id, &suffix[..8])
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Same agent routed one tier higher (saturating at Premium)
    pub fn escalated(&self) -> Agent {
        Agent {
            tier: self.tier.escalated(),
            ..self.clone()
        }
    }

    /// Persistable description of this agent
    pub fn to_spec(&self) -> AgentSpec {
        AgentSpec {
            template_id: self.template_id.clone(),
            role: self.role.clone(),
            tier: self.tier,
            capabilities: self.capabilities.clone(),
            tools: self.tools.clone(),
            instructions_template: self.instructions_template.clone(),
            quality_gates: self.quality_gates.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Highest-tier agent in a slice; ties keep the earliest
pub fn highest_tier(agents: &[Agent]) -> Option<&Agent> {
    agents
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.tier.cmp(&b.tier).then(ib.cmp(ia)))
        .map(|(_, a)| a)
}

/// Lowest-tier agent in a slice; ties keep the earliest
pub fn lowest_tier(agents: &[Agent]) -> Option<&Agent> {
    agents
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| a.tier.cmp(&b.tier).then(ia.cmp(ib)))
        .map(|(_, a)| a)
}
