//! Agent outputs and orchestration results

use super::entities::PlanSource;
use super::strategy::Strategy;
use crate::core::tier::Tier;
use serde::{Deserialize, Serialize};

/// Output of one agent call (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub agent_id: String,
    pub template_id: String,
    pub role: String,
    /// Tier the call was actually routed at
    pub tier: Tier,
    pub model_id: String,
    pub content: String,
    pub quality_score: f64,
    pub confidence: f64,
    pub cost: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
    pub cache_hit: bool,
    /// Routed above the agent's stored tier by the upgrade check
    pub escalated: bool,
}

/// What a strategy hands back after a successful run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Final answer
    pub output: String,
    /// Every output contributing to the result, in execution order
    pub outputs: Vec<AgentOutput>,
    /// Degradations the strategy tolerated
    pub warnings: Vec<String>,
    pub quality_score: f64,
}

impl AggregatedResult {
    /// Result whose final answer is one agent's output
    pub fn from_final(final_output: &AgentOutput, outputs: Vec<AgentOutput>, warnings: Vec<String>) -> Self {
        Self {
            output: final_output.content.clone(),
            quality_score: final_output.quality_score,
            outputs,
            warnings,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.outputs.iter().map(|o| o.cost).sum()
    }
}

/// Category of an orchestration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Classification,
    NoTemplateFound,
    AgentExecution,
    PlanTimeout,
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Classification => "classification",
            FailureKind::NoTemplateFound => "no_template_found",
            FailureKind::AgentExecution => "agent_execution",
            FailureKind::PlanTimeout => "plan_timeout",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured description of why an orchestration did not succeed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationFailure {
    pub kind: FailureKind,
    /// Template id of the stage that failed, when one is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub message: String,
    /// Last good output produced before the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_output: Option<String>,
}

impl OrchestrationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            message: message.into(),
            partial_output: None,
        }
    }

    pub fn at_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_partial_output(mut self, output: Option<String>) -> Self {
        self.partial_output = output;
        self
    }
}

impl std::fmt::Display for OrchestrationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.stage {
            Some(stage) => write!(f, "{} at {}: {}", self.kind, stage, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Final success or failure of an orchestration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Success { output: String, quality_score: f64 },
    Failure(OrchestrationFailure),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    pub fn quality_score(&self) -> f64 {
        match self {
            ExecutionOutcome::Success { quality_score, .. } => *quality_score,
            ExecutionOutcome::Failure(_) => 0.0,
        }
    }
}

/// Everything `orchestrate` reports back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Absent when the run failed before a plan existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub task_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PlanSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition_id: Option<String>,
    pub outcome: ExecutionOutcome,
    pub agent_outputs: Vec<AgentOutput>,
    pub warnings: Vec<String>,
    pub total_cost: f64,
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Result for a run that failed before any plan was built
    pub fn without_plan(task_pattern: impl Into<String>, failure: OrchestrationFailure) -> Self {
        Self {
            plan_id: None,
            task_pattern: task_pattern.into(),
            strategy: None,
            source: None,
            composition_id: None,
            outcome: ExecutionOutcome::Failure(failure),
            agent_outputs: Vec::new(),
            warnings: Vec::new(),
            total_cost: 0.0,
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn output(&self) -> Option<&str> {
        match &self.outcome {
            ExecutionOutcome::Success { output, .. } => Some(output),
            ExecutionOutcome::Failure(failure) => failure.partial_output.as_deref(),
        }
    }

    pub fn failure(&self) -> Option<&OrchestrationFailure> {
        match &self.outcome {
            ExecutionOutcome::Failure(failure) => Some(failure),
            ExecutionOutcome::Success { .. } => None,
        }
    }
}
