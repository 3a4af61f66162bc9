//! Meta-orchestration use case
//!
//! `orchestrate` runs the whole loop for one task:
//!
//! | Step | What happens                                                  |
//! |------|---------------------------------------------------------------|
//! | 1    | analyze the description into requirements                     |
//! | 2    | reuse a stored composition, or compose a fresh plan           |
//! | 3    | interactive runs wait for approval through the coordinator    |
//! | 4    | run the strategy under the plan deadline                      |
//! | 5    | fold the outcome into the composition store                   |
//!
//! It never returns an error: failures are reported inside the
//! [`ExecutionResult`].

use crate::config::OrchestratorConfig;
use crate::ports::coordination::{Coordinator, NoCoordination};
use crate::ports::executor::Executor;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::agent_runner::{AgentRunner, RunContext};
use crate::use_cases::composition_store::CompositionStore;
use crate::use_cases::strategies::{self, StrategyError};
use conductor_domain::agent::catalog::{
    CLASSIFIER_TEMPLATE_ID, DRAFTER_TEMPLATE_ID, POLISHER_TEMPLATE_ID, REVIEWER_TEMPLATE_ID,
    SYNTHESIZER_TEMPLATE_ID,
};
use conductor_domain::task::requirements::CAP_SYNTHESIS;
use conductor_domain::{
    Agent, AgentComposition, AgentFactory, AggregatedResult, CompositionOutcome, DomainError,
    ExecutionOutcome, ExecutionPlan, ExecutionResult, FailureKind, OrchestrationFailure,
    RouteConstraints, SpawnedTeam, Strategy, TaskAnalyzer, TaskContext, TaskRequirements, Tier,
    select_strategy,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A plan ready to run, with the requirements it was built for
#[derive(Debug, Clone)]
pub struct PreparedPlan {
    pub requirements: TaskRequirements,
    pub plan: ExecutionPlan,
    pub warnings: Vec<String>,
}

pub struct MetaOrchestrator<E: Executor + 'static> {
    runner: Arc<AgentRunner<E>>,
    factory: AgentFactory,
    store: Arc<CompositionStore>,
    coordinator: Arc<dyn Coordinator>,
    progress: Arc<dyn ProgressNotifier>,
    config: OrchestratorConfig,
    cancellation: Option<CancellationToken>,
    coordinator_warned: AtomicBool,
}

impl<E: Executor + 'static> MetaOrchestrator<E> {
    pub fn new(runner: Arc<AgentRunner<E>>, factory: AgentFactory, store: Arc<CompositionStore>) -> Self {
        Self {
            runner,
            factory,
            store,
            coordinator: Arc::new(NoCoordination),
            progress: Arc::new(NoProgress),
            config: OrchestratorConfig::default(),
            cancellation: None,
            coordinator_warned: AtomicBool::new(false),
        }
    }

    pub fn with_coordinator(mut self, coordinator: Arc<dyn Coordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one task end to end
    pub async fn orchestrate(
        &self,
        description: &str,
        context: &TaskContext,
        interactive: bool,
    ) -> ExecutionResult {
        let started = Instant::now();

        let prepared = match self.prepare(description, context, interactive).await {
            Ok(prepared) => prepared,
            Err((task_pattern, failure)) => {
                warn!("Orchestration failed before execution: {}", failure);
                let result = ExecutionResult::without_plan(task_pattern, failure);
                self.progress.on_finished(&result);
                return result;
            }
        };
        let PreparedPlan {
            requirements,
            plan,
            mut warnings,
        } = prepared;
        self.progress.on_plan_ready(&plan);

        if requirements.interactive
            && let Err(failure) = self.await_approval(&plan).await
        {
            let result = Self::result_for(&plan, ExecutionOutcome::Failure(failure), None, warnings, started);
            self.progress.on_finished(&result);
            return result;
        }

        let run = self.run_plan(&plan, &requirements).await;

        let (outcome, outputs, learned) = match run {
            Ok(aggregated) => {
                let AggregatedResult {
                    output,
                    outputs,
                    warnings: run_warnings,
                    quality_score,
                } = aggregated;
                warnings.extend(run_warnings);
                let learned = CompositionOutcome::success(quality_score)
                    .for_signature(requirements.signature.clone());
                (
                    ExecutionOutcome::Success {
                        output,
                        quality_score,
                    },
                    outputs,
                    Some(learned),
                )
            }
            Err(error) => {
                let failure = error.to_failure();
                warn!("Plan {} failed: {}", plan.id, failure);
                let learned = (failure.kind != FailureKind::Cancelled).then(|| {
                    CompositionOutcome::failure().for_signature(requirements.signature.clone())
                });
                let StrategyError {
                    outputs,
                    warnings: run_warnings,
                    ..
                } = error;
                warnings.extend(run_warnings);
                (ExecutionOutcome::Failure(failure), outputs, learned)
            }
        };

        let composition_id = match learned {
            Some(learned) => self.learn(&plan, &learned).await,
            None => None,
        };

        let mut result = Self::result_for(&plan, outcome, composition_id, warnings, started);
        result.total_cost = outputs.iter().map(|o| o.cost).sum();
        result.agent_outputs = outputs;

        info!(
            "Plan {} finished: {} ({} agents, ${:.4}, {}ms)",
            plan.id,
            if result.is_success() { "success" } else { "failure" },
            result.agent_outputs.len(),
            result.total_cost,
            result.duration_ms
        );
        self.progress.on_finished(&result);
        result
    }

    /// Analyze and plan without executing.
    ///
    /// On failure returns the task pattern alongside the reason.
    pub async fn prepare(
        &self,
        description: &str,
        context: &TaskContext,
        interactive: bool,
    ) -> Result<PreparedPlan, (String, OrchestrationFailure)> {
        let requirements = TaskAnalyzer::analyze_with(description, context, interactive);
        let task_pattern = requirements.task_pattern();
        debug!(
            "Task analyzed: pattern={}, capabilities={:?}",
            task_pattern, requirements.needed_capabilities
        );

        if let Some(composition) = self.find_reusable(&requirements).await {
            info!(
                "Reusing composition {} for {} (used {} times, success rate {:.2})",
                composition.id,
                task_pattern,
                composition.usage_count,
                composition.success_rate
            );
            let (plan, warnings) = self
                .hydrate(&composition, &requirements, context)
                .map_err(|e| (task_pattern.clone(), domain_failure(e)))?;
            return Ok(PreparedPlan {
                requirements,
                plan,
                warnings,
            });
        }

        let (plan, warnings) = self
            .compose(&requirements, context)
            .map_err(|e| (task_pattern.clone(), domain_failure(e)))?;
        info!(
            "Composed fresh {} plan for {} with {} agents",
            plan.strategy,
            task_pattern,
            plan.agents.len()
        );
        Ok(PreparedPlan {
            requirements,
            plan,
            warnings,
        })
    }

    async fn find_reusable(&self, requirements: &TaskRequirements) -> Option<AgentComposition> {
        let task_pattern = requirements.task_pattern();
        match self
            .store
            .load_exact(&task_pattern, &requirements.signature)
            .await
        {
            Some(exact) => Some(exact),
            None => self.store.load(&task_pattern).await,
        }
    }

    /// Build a fresh plan: spawn a team, pick a strategy, shape the team
    pub fn compose(
        &self,
        requirements: &TaskRequirements,
        context: &TaskContext,
    ) -> Result<(ExecutionPlan, Vec<String>), DomainError> {
        let SpawnedTeam {
            agents,
            mut warnings,
        } = self.factory.spawn_team(requirements, context)?;
        let strategy = select_strategy(requirements, agents.len());
        let agents = self.shape_team(strategy, agents, requirements, context, &mut warnings);

        for warning in &warnings {
            warn!("{}", warning);
            self.progress.on_warning(warning);
        }

        let plan = ExecutionPlan::new(agents, strategy, requirements.task_pattern())?
            .with_quality_gates(self.config.quality_gates.clone());
        Ok((plan, warnings))
    }

    fn hydrate(
        &self,
        composition: &AgentComposition,
        requirements: &TaskRequirements,
        context: &TaskContext,
    ) -> Result<(ExecutionPlan, Vec<String>), DomainError> {
        let agents: Vec<Agent> = composition
            .agents
            .iter()
            .map(|spec| self.factory.hydrate(spec, requirements, context))
            .collect();
        let warnings: Vec<String> = agents
            .iter()
            .filter_map(|a| a.render_warning.clone())
            .collect();
        for warning in &warnings {
            warn!("{}", warning);
            self.progress.on_warning(warning);
        }
        let plan = ExecutionPlan::new(agents, composition.strategy, requirements.task_pattern())?
            .with_quality_gates(composition.quality_gates.clone())
            .reused_from(composition.id.clone());
        Ok((plan, warnings))
    }

    /// Adjust the spawned team to what the strategy needs
    fn shape_team(
        &self,
        strategy: Strategy,
        mut agents: Vec<Agent>,
        requirements: &TaskRequirements,
        context: &TaskContext,
        warnings: &mut Vec<String>,
    ) -> Vec<Agent> {
        let spawn = |id: &str, warnings: &mut Vec<String>| match self.factory.template(id) {
            Some(template) => Some(self.factory.spawn_in(template, requirements, context)),
            None => {
                warnings.push(format!("Template {} missing; {} plan degraded", id, strategy));
                None
            }
        };

        match strategy {
            Strategy::Debate => {
                if !agents.iter().any(|a| a.has_capability(CAP_SYNTHESIS))
                    && let Some(synthesizer) = spawn(SYNTHESIZER_TEMPLATE_ID, warnings)
                {
                    agents.push(synthesizer);
                }
                agents
            }
            Strategy::Refinement => {
                let chain: Vec<Agent> = [DRAFTER_TEMPLATE_ID, REVIEWER_TEMPLATE_ID, POLISHER_TEMPLATE_ID]
                    .iter()
                    .filter_map(|id| spawn(id, warnings))
                    .collect();
                if chain.is_empty() { agents } else { chain }
            }
            Strategy::Adaptive => {
                let Some(primary) = agents.first().and_then(|a| self.factory.template(&a.template_id)) else {
                    return agents;
                };
                let mut shaped: Vec<Agent> = spawn(CLASSIFIER_TEMPLATE_ID, warnings).into_iter().collect();
                let mut tiers = Vec::new();
                for ceiling in Tier::ALL.into_iter().filter(|t| *t <= primary.tier_preference) {
                    let variant = self.factory.spawn_capped(primary, requirements, context, ceiling);
                    if !tiers.contains(&variant.tier) {
                        tiers.push(variant.tier);
                        shaped.push(variant);
                    }
                }
                shaped
            }
            Strategy::Teaching => {
                let Some(primary) = agents.first().cloned() else {
                    return agents;
                };
                match self.factory.template(&primary.template_id) {
                    Some(template) if primary.tier > Tier::Cheap => {
                        let junior = self.factory.spawn_capped(template, requirements, context, Tier::Cheap);
                        vec![junior, primary]
                    }
                    _ => vec![primary],
                }
            }
            Strategy::Sequential => {
                let (synthesis, mut rest): (Vec<Agent>, Vec<Agent>) = agents
                    .into_iter()
                    .partition(|a| a.has_capability(CAP_SYNTHESIS));
                rest.extend(synthesis);
                rest
            }
            Strategy::Parallel => agents,
        }
    }

    /// Publish the plan and wait for a decision; only `reject` stops it
    async fn await_approval(&self, plan: &ExecutionPlan) -> Result<(), OrchestrationFailure> {
        if !self.coordinator.is_available() {
            if !self.coordinator_warned.swap(true, Ordering::Relaxed) {
                warn!("Interactive approval requested but no coordinator is available; proceeding");
            }
            return Ok(());
        }

        let payload = json!({
            "plan_id": plan.id,
            "task_pattern": plan.task_pattern,
            "strategy": plan.strategy,
            "source": plan.source,
            "agents": plan
                .agents
                .iter()
                .map(|a| json!({ "template_id": a.template_id, "role": a.role, "tier": a.tier }))
                .collect::<Vec<_>>(),
        });
        let proposed = format!("plan/{}/proposed", plan.id);
        if let Err(e) = self
            .coordinator
            .publish(&proposed, payload, self.config.approval_timeout)
            .await
        {
            warn!("Could not publish plan for approval: {}; proceeding", e);
            return Ok(());
        }

        let topic = format!("plan/{}/decision", plan.id);
        let has_decision = |v: &Value| v.get("decision").and_then(Value::as_str).is_some();
        let message = self
            .coordinator
            .subscribe_once(&topic, &has_decision, self.config.approval_timeout)
            .await;

        let decision = message
            .as_ref()
            .and_then(|m| m.get("decision"))
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase);
        match decision.as_deref() {
            Some("reject") => {
                let reason = message
                    .as_ref()
                    .and_then(|m| m.get("reason"))
                    .and_then(Value::as_str)
                    .unwrap_or("no reason given");
                info!("Plan {} rejected: {}", plan.id, reason);
                Err(OrchestrationFailure::new(
                    FailureKind::Cancelled,
                    format!("plan rejected: {}", reason),
                ))
            }
            Some(other) => {
                debug!("Plan {} decision: {}", plan.id, other);
                Ok(())
            }
            None => {
                info!("No decision for plan {} within approval timeout; proceeding", plan.id);
                Ok(())
            }
        }
    }

    /// Run the strategy; on deadline, cancel and collect what was produced
    async fn run_plan(
        &self,
        plan: &ExecutionPlan,
        requirements: &TaskRequirements,
    ) -> Result<AggregatedResult, StrategyError> {
        let token = self
            .cancellation
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let ctx = RunContext::new(requirements.domain.clone())
            .with_constraints(RouteConstraints {
                max_cost: requirements.max_cost,
                max_latency_ms: requirements.max_latency_ms,
                min_success_rate: requirements.min_success_rate,
            })
            .with_plan_gates(plan.quality_gates.clone())
            .with_cancellation(token.clone());
        let abandon = ctx.abandon.clone();

        let deadline = self.config.plan_timeout;
        let run = strategies::execute(&self.runner, plan, &requirements.description, &ctx);
        tokio::pin!(run);

        tokio::select! {
            result = &mut run => result,
            _ = tokio::time::sleep(deadline) => {
                warn!("Plan {} exceeded {}s deadline; cancelling", plan.id, deadline.as_secs());
                token.cancel();
                abandon.cancel();
                let mut error = match run.await {
                    Err(error) => error,
                    Ok(partial) => StrategyError::new(FailureKind::PlanTimeout, String::new())
                        .with_progress(partial.outputs, partial.warnings)
                        .with_partial_output(Some(partial.output)),
                };
                error.kind = FailureKind::PlanTimeout;
                error.message = format!("plan exceeded {}s deadline", deadline.as_secs());
                Err(error)
            }
        }
    }

    async fn learn(&self, plan: &ExecutionPlan, outcome: &CompositionOutcome) -> Option<String> {
        let composition = AgentComposition::new(
            plan.task_pattern.clone(),
            plan.agents.iter().map(Agent::to_spec).collect(),
            plan.strategy,
            plan.quality_gates.clone(),
        );
        self.store.save(composition, outcome).await.map(|c| c.id)
    }

    fn result_for(
        plan: &ExecutionPlan,
        outcome: ExecutionOutcome,
        composition_id: Option<String>,
        warnings: Vec<String>,
        started: Instant,
    ) -> ExecutionResult {
        ExecutionResult {
            plan_id: Some(plan.id.clone()),
            task_pattern: plan.task_pattern.clone(),
            strategy: Some(plan.strategy),
            source: Some(plan.source),
            composition_id: composition_id.or_else(|| plan.composition_id.clone()),
            outcome,
            agent_outputs: Vec::new(),
            warnings,
            total_cost: 0.0,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

fn domain_failure(error: DomainError) -> OrchestrationFailure {
    let kind = match error {
        DomainError::NoTemplateFound(_) => FailureKind::NoTemplateFound,
        _ => FailureKind::Classification,
    };
    OrchestrationFailure::new(kind, error.to_string())
}
