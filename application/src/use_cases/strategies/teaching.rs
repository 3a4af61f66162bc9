//! Teaching strategy: the cheapest agent attempts first.
//!
//! When an attempt fails, the next higher-tier agent in the plan takes
//! over (or the failing agent itself one tier up), seeing the failed
//! attempt. The expert's answer supersedes the junior's. Escalation stops
//! after a Premium attempt.

use super::{StrategyError, prompt_for};
use crate::ports::executor::Executor;
use crate::use_cases::agent_runner::{AgentError, AgentPrompt, AgentRunner, RunContext};
use conductor_domain::{Agent, AggregatedResult, FailureKind, Tier, lowest_tier};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub(super) async fn execute<E: Executor + 'static>(
    runner: &Arc<AgentRunner<E>>,
    agents: &[Agent],
    task: &str,
    ctx: &RunContext,
) -> Result<AggregatedResult, StrategyError> {
    let mut current = lowest_tier(agents)
        .ok_or_else(|| StrategyError::new(FailureKind::AgentExecution, "teaching plan has no agents"))?
        .clone();
    let mut prompt = prompt_for(&current, task, &BTreeMap::new(), None);
    let mut warnings = Vec::new();
    let mut last_attempt: Option<String> = None;

    loop {
        match runner.run(&current, prompt.clone(), ctx).await {
            Ok(output) => {
                return Ok(AggregatedResult::from_final(&output, vec![output.clone()], warnings));
            }
            Err(e) if e.is_cancelled() => {
                return Err(StrategyError::from_agent(&current, e)
                    .with_progress(Vec::new(), warnings)
                    .with_partial_output(last_attempt));
            }
            Err(e) => {
                if let Some(output) = e.output() {
                    last_attempt = Some(output.content.clone());
                }
                if current.tier == Tier::Premium {
                    return Err(StrategyError::from_agent(&current, e)
                        .with_progress(Vec::new(), warnings)
                        .with_partial_output(last_attempt));
                }

                let expert = next_expert(agents, &current);
                let warning = format!(
                    "{} ({}) failed, handing over to {} ({}): {}",
                    current.template_id, current.tier, expert.template_id, expert.tier, e
                );
                warn!("{}", warning);
                warnings.push(warning);
                info!("Teaching: escalating to {}", expert.id);

                prompt = expert_prompt(&expert, task, last_attempt.as_deref(), &e);
                current = expert;
            }
        }
    }
}

/// Lowest-tier plan agent above `current`, else `current` one tier up
fn next_expert(agents: &[Agent], current: &Agent) -> Agent {
    let above: Vec<Agent> = agents
        .iter()
        .filter(|a| a.tier > current.tier)
        .cloned()
        .collect();
    lowest_tier(&above)
        .cloned()
        .unwrap_or_else(|| current.escalated())
}

fn expert_prompt(expert: &Agent, task: &str, attempt: Option<&str>, error: &AgentError) -> AgentPrompt {
    let mut prompt = prompt_for(expert, task, &BTreeMap::new(), None);
    match attempt {
        Some(attempt) => prompt.user.push_str(&format!(
            "\n\n## Earlier attempt (rejected: {})\n\n{}\n\nProvide a corrected, complete answer.",
            error, attempt
        )),
        None => prompt.user.push_str(&format!(
            "\n\nAn earlier attempt failed ({}). Provide a complete answer.",
            error
        )),
    }
    prompt
}
