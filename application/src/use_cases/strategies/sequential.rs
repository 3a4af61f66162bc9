//! Sequential strategy: plan order, each stage sees every earlier output.
//!
//! A gate failure is retried once at the same tier; a second gate failure,
//! or any hard failure, aborts with the outputs accepted so far.

use super::{StrategyError, prompt_for};
use crate::ports::executor::Executor;
use crate::use_cases::agent_runner::{AgentRunner, RunContext};
use conductor_domain::{Agent, AggregatedResult, FailureKind};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

pub(super) async fn execute<E: Executor + 'static>(
    runner: &Arc<AgentRunner<E>>,
    agents: &[Agent],
    task: &str,
    ctx: &RunContext,
) -> Result<AggregatedResult, StrategyError> {
    let mut by_stage: BTreeMap<String, String> = BTreeMap::new();
    let mut previous: Option<String> = None;
    let mut accepted = Vec::new();
    let mut warnings = Vec::new();

    for agent in agents {
        let prompt = prompt_for(agent, task, &by_stage, previous.as_deref());

        let result = match runner.run(agent, prompt.clone(), ctx).await {
            Err(e) if e.is_quality_gate() => {
                let warning = format!("{} retried after gate failure: {}", agent.template_id, e);
                warn!("{}", warning);
                warnings.push(warning);
                runner.run(agent, prompt, ctx).await
            }
            other => other,
        };

        match result {
            Ok(output) => {
                by_stage.insert(agent.template_id.clone(), output.content.clone());
                previous = Some(output.content.clone());
                accepted.push(output);
            }
            Err(e) => {
                return Err(StrategyError::from_agent(agent, e).with_progress(accepted, warnings));
            }
        }
    }

    match accepted.last().cloned() {
        Some(last) => Ok(AggregatedResult::from_final(&last, accepted, warnings)),
        None => Err(StrategyError::new(
            FailureKind::AgentExecution,
            "sequential plan produced no output",
        )),
    }
}
