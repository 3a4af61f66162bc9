//! Progress notification port
//!
//! Defines the interface for reporting progress during orchestration.

use conductor_domain::{Agent, AgentOutput, ExecutionPlan, ExecutionResult, Tier};

/// Callback for progress updates during orchestration
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called once the plan is known, before any agent runs
    fn on_plan_ready(&self, plan: &ExecutionPlan);

    /// Called right before an agent's executor call
    fn on_agent_start(&self, agent: &Agent, tier: Tier, model_id: &str);

    /// Called after every agent call, successful or not
    fn on_agent_complete(&self, agent: &Agent, output: Option<&AgentOutput>);

    fn on_warning(&self, _message: &str) {}

    fn on_finished(&self, _result: &ExecutionResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_plan_ready(&self, _plan: &ExecutionPlan) {}
    fn on_agent_start(&self, _agent: &Agent, _tier: Tier, _model_id: &str) {}
    fn on_agent_complete(&self, _agent: &Agent, _output: Option<&AgentOutput>) {}
}
