//! Parallel strategy: every agent at once.
//!
//! Agents that fail, miss their gates or time out are excluded with a
//! warning; at least one success is required. Output is assembled in plan
//! order regardless of completion order.

use super::{StrategyError, assemble_sections, fan_out, mean_quality, prompt_for};
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
    let no_outputs = BTreeMap::new();
    let calls = agents
        .iter()
        .map(|a| (a.clone(), prompt_for(a, task, &no_outputs, None)))
        .collect();

    let mut accepted = Vec::new();
    let mut warnings = Vec::new();
    let mut cancelled = 0;

    for (agent, result) in fan_out(runner, calls, ctx).await {
        match result {
            Ok(output) => accepted.push(output),
            Err(e) => {
                if e.is_cancelled() {
                    cancelled += 1;
                }
                let warning = format!("{} excluded: {}", agent.template_id, e);
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    if accepted.is_empty() {
        let kind = if cancelled == agents.len() {
            FailureKind::Cancelled
        } else {
            FailureKind::AgentExecution
        };
        return Err(StrategyError::new(
            kind,
            format!("all {} parallel agents failed", agents.len()),
        )
        .with_progress(Vec::new(), warnings));
    }

    Ok(AggregatedResult {
        output: assemble_sections(&accepted),
        quality_score: mean_quality(&accepted),
        outputs: accepted,
        warnings,
    })
}
