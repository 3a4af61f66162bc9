//! Debate strategy: independent positions, then one synthesis.
//!
//! Round one runs every agent except the synthesizer concurrently. The
//! synthesizer is the highest-tier agent providing `synthesis` (else the
//! highest-tier agent overall). There is no voting: the synthesis is the
//! answer. A synthesis gate failure is retried once, one tier higher.

use super::{StrategyError, fan_out, prompt_for};
use crate::ports::executor::Executor;
use crate::use_cases::agent_runner::{AgentPrompt, AgentRunner, RunContext};
use conductor_domain::task::requirements::CAP_SYNTHESIS;
use conductor_domain::{Agent, AgentOutput, AggregatedResult, FailureKind, highest_tier};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub(super) async fn execute<E: Executor + 'static>(
    runner: &Arc<AgentRunner<E>>,
    agents: &[Agent],
    task: &str,
    ctx: &RunContext,
) -> Result<AggregatedResult, StrategyError> {
    let synthesizer = pick_synthesizer(agents)
        .ok_or_else(|| StrategyError::new(FailureKind::AgentExecution, "debate has no agents"))?
        .clone();
    let debaters: Vec<Agent> = agents
        .iter()
        .filter(|a| a.id != synthesizer.id)
        .cloned()
        .collect();

    let mut warnings = Vec::new();
    let mut positions: Vec<AgentOutput> = Vec::new();

    if !debaters.is_empty() {
        info!("Debate round 1: {} positions", debaters.len());
        let no_outputs = BTreeMap::new();
        let calls = debaters
            .iter()
            .map(|a| (a.clone(), prompt_for(a, task, &no_outputs, None)))
            .collect();
        for (agent, result) in fan_out(runner, calls, ctx).await {
            match result {
                Ok(output) => positions.push(output),
                Err(e) => {
                    let warning = format!("{} sat out the debate: {}", agent.template_id, e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        if positions.is_empty() {
            return Err(StrategyError::new(
                FailureKind::AgentExecution,
                "no debate position was produced",
            )
            .with_progress(Vec::new(), warnings));
        }
    }

    info!("Debate round 2: synthesis by {}", synthesizer.id);
    let prompt = synthesis_prompt(&synthesizer, task, &positions);

    let result = match runner.run(&synthesizer, prompt.clone(), ctx).await {
        Err(e) if e.is_quality_gate() => {
            let escalated = synthesizer.escalated();
            let warning = format!(
                "synthesis by {} failed gates, retrying at {}: {}",
                synthesizer.template_id, escalated.tier, e
            );
            warn!("{}", warning);
            warnings.push(warning);
            runner.run(&escalated, prompt, ctx).await
        }
        other => other,
    };

    match result {
        Ok(synthesis) => {
            let mut outputs = positions;
            outputs.push(synthesis.clone());
            Ok(AggregatedResult::from_final(&synthesis, outputs, warnings))
        }
        Err(e) => {
            let best_position = positions
                .iter()
                .max_by(|a, b| a.quality_score.total_cmp(&b.quality_score))
                .map(|o| o.content.clone());
            Err(StrategyError::from_agent(&synthesizer, e)
                .with_progress(positions, warnings)
                .with_partial_output(best_position))
        }
    }
}

/// Highest tier wins; among equals the first `synthesis`-capable agent does
fn pick_synthesizer(agents: &[Agent]) -> Option<&Agent> {
    let top = highest_tier(agents)?.tier;
    agents
        .iter()
        .filter(|a| a.tier == top)
        .find(|a| a.has_capability(CAP_SYNTHESIS))
        .or_else(|| agents.iter().find(|a| a.tier == top))
}

fn synthesis_prompt(synthesizer: &Agent, task: &str, positions: &[AgentOutput]) -> AgentPrompt {
    let by_stage: BTreeMap<String, String> = positions
        .iter()
        .map(|p| (p.template_id.clone(), p.content.clone()))
        .collect();
    let mut prompt = prompt_for(synthesizer, task, &by_stage, None);

    if !positions.is_empty() {
        prompt.user.push_str("\n\n## Panel positions\n");
        for position in positions {
            prompt.user.push_str(&format!(
                "\n### {}\n\n{}\n",
                position.role,
                position.content.trim()
            ));
        }
        prompt
            .user
            .push_str("\nWeigh the positions and produce one final answer.");
    }
    prompt
}
