//! Execution strategies
//!
//! One execution function per [`Strategy`] variant, dispatched by `match`.
//! Every strategy receives the plan's agents in plan order and returns an
//! [`AggregatedResult`] or a [`StrategyError`] carrying whatever was
//! produced before the failure.
//!
//! | Strategy   | Flow                                             |
//! |------------|--------------------------------------------------|
//! | Sequential | plan order, each stage sees earlier outputs      |
//! | Parallel   | all at once, failures excluded                   |
//! | Debate     | positions in parallel, then one synthesis        |
//! | Teaching   | cheapest first, escalate on failure              |
//! | Refinement | draft, review, polish in tier order              |
//! | Adaptive   | classifier picks one specialist                  |

mod adaptive;
mod debate;
mod parallel;
mod refinement;
mod sequential;
mod teaching;

pub use adaptive::{Classification, parse_classification};

use crate::ports::executor::Executor;
use crate::use_cases::agent_runner::{AgentError, AgentPrompt, AgentRunner, RunContext};
use conductor_domain::agent::render::{OUTPUTS_PREFIX, PREVIOUS_OUTPUT};
use conductor_domain::{
    Agent, AgentOutput, AggregatedResult, ExecutionPlan, FailureKind, OrchestrationFailure,
    Strategy, render_outputs,
};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// A strategy run that did not produce an accepted result
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StrategyError {
    pub kind: FailureKind,
    /// Template id of the failing stage
    pub stage: Option<String>,
    pub message: String,
    /// Outputs accepted before the failure
    pub outputs: Vec<AgentOutput>,
    /// Last good output, if any
    pub partial_output: Option<String>,
    pub warnings: Vec<String>,
}

impl StrategyError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            message: message.into(),
            outputs: Vec::new(),
            partial_output: None,
            warnings: Vec::new(),
        }
    }

    /// Failure of one agent call
    pub fn from_agent(agent: &Agent, error: AgentError) -> Self {
        let kind = if error.is_cancelled() {
            FailureKind::Cancelled
        } else {
            FailureKind::AgentExecution
        };
        Self::new(kind, error.to_string()).at_stage(&agent.template_id)
    }

    pub fn at_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Attach what was produced so far; the last output becomes the partial
    pub fn with_progress(mut self, outputs: Vec<AgentOutput>, warnings: Vec<String>) -> Self {
        self.partial_output = outputs.last().map(|o| o.content.clone());
        self.outputs = outputs;
        self.warnings = warnings;
        self
    }

    pub fn with_partial_output(mut self, partial: Option<String>) -> Self {
        self.partial_output = partial;
        self
    }

    pub fn to_failure(&self) -> OrchestrationFailure {
        let failure = OrchestrationFailure::new(self.kind, self.message.clone())
            .with_partial_output(self.partial_output.clone());
        match &self.stage {
            Some(stage) => failure.at_stage(stage.clone()),
            None => failure,
        }
    }
}

/// Run a plan with its strategy
pub async fn execute<E: Executor + 'static>(
    runner: &Arc<AgentRunner<E>>,
    plan: &ExecutionPlan,
    task: &str,
    ctx: &RunContext,
) -> Result<AggregatedResult, StrategyError> {
    if plan.agents.is_empty() {
        return Err(StrategyError::new(
            FailureKind::AgentExecution,
            format!("{} plan {} has no agents", plan.strategy, plan.id),
        ));
    }

    info!(
        "Executing plan {} ({}, {} agents)",
        plan.id,
        plan.strategy,
        plan.agents.len()
    );

    match plan.strategy {
        Strategy::Sequential => sequential::execute(runner, &plan.agents, task, ctx).await,
        Strategy::Parallel => parallel::execute(runner, &plan.agents, task, ctx).await,
        Strategy::Debate => debate::execute(runner, &plan.agents, task, ctx).await,
        Strategy::Teaching => teaching::execute(runner, &plan.agents, task, ctx).await,
        Strategy::Refinement => refinement::execute(runner, &plan.agents, task, ctx).await,
        Strategy::Adaptive => adaptive::execute(runner, &plan.agents, task, ctx).await,
    }
}

/// Build the prompt for one stage.
///
/// Deferred placeholders in the instructions are filled from earlier
/// outputs; when the instructions do not reference the previous stage, its
/// output is appended to the user message instead.
pub(crate) fn prompt_for(
    agent: &Agent,
    task: &str,
    outputs: &BTreeMap<String, String>,
    previous: Option<&str>,
) -> AgentPrompt {
    let references_outputs = agent.instructions.contains(PREVIOUS_OUTPUT)
        || agent.instructions.contains(OUTPUTS_PREFIX);
    let system = render_outputs(&agent.instructions, outputs, previous);

    let mut user = task.to_string();
    if let Some(previous) = previous
        && !references_outputs
    {
        user.push_str("\n\n## Previous stage output\n\n");
        user.push_str(previous);
    }

    AgentPrompt { system, user }
}

/// Run agents concurrently, one spawned task each; results in input order.
///
/// Dropping the returned future leaves the spawned calls running to
/// completion; they are never aborted.
pub(crate) async fn fan_out<E: Executor + 'static>(
    runner: &Arc<AgentRunner<E>>,
    calls: Vec<(Agent, AgentPrompt)>,
    ctx: &RunContext,
) -> Vec<(Agent, Result<AgentOutput, AgentError>)> {
    let handles: Vec<_> = calls
        .into_iter()
        .map(|(agent, prompt)| {
            let runner = Arc::clone(runner);
            let ctx = ctx.clone();
            let fallback = agent.clone();
            let handle = tokio::spawn(async move {
                let result = runner.run(&agent, prompt, &ctx).await;
                (agent, result)
            });
            (fallback, handle)
        })
        .collect();

    let (agents, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    join_all(handles)
        .await
        .into_iter()
        .zip(agents)
        .map(|(joined, agent)| match joined {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Task join error for {}: {}", agent.id, e);
                let error = AgentError::Executor {
                    agent: agent.id.clone(),
                    source: crate::ports::executor::ExecutorError::Other(e.to_string()),
                };
                (agent, Err(error))
            }
        })
        .collect()
}

/// Join several outputs into one document, one section per role
pub(crate) fn assemble_sections(outputs: &[AgentOutput]) -> String {
    match outputs {
        [single] => single.content.clone(),
        _ => outputs
            .iter()
            .map(|o| format!("## {}\n\n{}", o.role, o.content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

pub(crate) fn mean_quality(outputs: &[AgentOutput]) -> f64 {
    if outputs.is_empty() {
        return 0.0;
    }
    outputs.iter().map(|o| o.quality_score).sum::<f64>() / outputs.len() as f64
}

#[cfg(test)]
pub(crate) mod test_support {
    use conductor_domain::{Agent, QualityGates, Tier};
    use std::collections::BTreeSet;

    /// Agent whose instructions name it, so scripted executors can match
    pub fn agent(template_id: &str, tier: Tier) -> Agent {
        Agent {
            id: format!("{}-00000000", template_id),
            template_id: template_id.into(),
            role: template_id.replace('_', " "),
            tier,
            capabilities: BTreeSet::new(),
            instructions: format!("You are the {} agent.", template_id),
            instructions_template: format!("You are the {} agent.", template_id),
            tools: vec![],
            quality_gates: QualityGates::new().with_gate("min_quality", 0.55),
            timeout_secs: None,
            render_warning: None,
        }
    }

    pub fn with_capability(mut agent: Agent, capability: &str) -> Agent {
        agent.capabilities.insert(capability.to_string());
        agent
    }

    pub fn with_instructions(mut agent: Agent, instructions: &str) -> Agent {
        agent.instructions = instructions.to_string();
        agent
    }
}
