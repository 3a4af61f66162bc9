//! Execution plan entity

use super::strategy::Strategy;
use crate::agent::entities::Agent;
use crate::core::error::DomainError;
use crate::quality::QualityGates;
use serde::{Deserialize, Serialize};

/// Where a plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    /// Composed for this request
    Fresh,
    /// Hydrated from a stored composition
    Reused,
}

impl std::fmt::Display for PlanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanSource::Fresh => write!(f, "fresh"),
            PlanSource::Reused => write!(f, "reused"),
        }
    }
}

/// Agents plus the strategy that composes them (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub id: String,
    pub agents: Vec<Agent>,
    pub strategy: Strategy,
    /// Plan-wide gates; agent gates of the same name take precedence
    pub quality_gates: QualityGates,
    pub source: PlanSource,
    pub task_pattern: String,
    /// Stored composition this plan was hydrated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition_id: Option<String>,
}

impl ExecutionPlan {
    pub fn new(
        agents: Vec<Agent>,
        strategy: Strategy,
        task_pattern: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if agents.is_empty() {
            return Err(DomainError::InvalidPlan(format!(
                "{} plan has no agents",
                strategy
            )));
        }
        Ok(Self {
            id: plan_id(),
            agents,
            strategy,
            quality_gates: QualityGates::new(),
            source: PlanSource::Fresh,
            task_pattern: task_pattern.into(),
            composition_id: None,
        })
    }

    pub fn with_quality_gates(mut self, gates: QualityGates) -> Self {
        self.quality_gates = gates;
        self
    }

    pub fn reused_from(mut self, composition_id: impl Into<String>) -> Self {
        self.source = PlanSource::Reused;
        self.composition_id = Some(composition_id.into());
        self
    }

    /// Effective gates for one agent
    pub fn gates_for(&self, agent: &Agent) -> QualityGates {
        agent.quality_gates.merged_over(&self.quality_gates)
    }

    pub fn template_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.template_id.as_str()).collect()
    }
}

fn plan_id() -> String {
    format!("plan-{}", uuid::Uuid::new_v4().simple())
}
