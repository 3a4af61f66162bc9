//! Refinement strategy: draft, review, polish.
//!
//! Stages run in tier order (stable for equal tiers) and each receives the
//! full previous output. Any failure halts the chain and reports the last
//! good output alongside the failure.

use super::{StrategyError, prompt_for};
use crate::ports::executor::Executor;
use crate::use_cases::agent_runner::{AgentRunner, RunContext};
use conductor_domain::{Agent, AgentOutput, AggregatedResult, FailureKind};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub(super) async fn execute<E: Executor + 'static>(
    runner: &Arc<AgentRunner<E>>,
    agents: &[Agent],
    task: &str,
    ctx: &RunContext,
) -> Result<AggregatedResult, StrategyError> {
    let mut stages: Vec<&Agent> = agents.iter().collect();
    stages.sort_by_key(|a| a.tier);

    let mut by_stage: BTreeMap<String, String> = BTreeMap::new();
    let mut accepted: Vec<AgentOutput> = Vec::new();

    for agent in stages {
        let previous = accepted.last().map(|o| o.content.clone());
        debug!("Refinement stage {} ({})", agent.template_id, agent.tier);
        let prompt = prompt_for(agent, task, &by_stage, previous.as_deref());

        match runner.run(agent, prompt, ctx).await {
            Ok(output) => {
                by_stage.insert(agent.template_id.clone(), output.content.clone());
                accepted.push(output);
            }
            Err(e) => {
                return Err(StrategyError::from_agent(agent, e).with_progress(accepted, Vec::new()));
            }
        }
    }

    match accepted.last().cloned() {
        Some(last) => Ok(AggregatedResult::from_final(&last, accepted, Vec::new())),
        None => Err(StrategyError::new(
            FailureKind::AgentExecution,
            "refinement plan produced no output",
        )),
    }
}
