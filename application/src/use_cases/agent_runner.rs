//! Agent runner
//!
//! Runs one agent call end to end: cancellation check, tier upgrade check,
//! model choice, cache lookup, the executor call on a detached task under
//! the per-call timeout, telemetry, and quality gates.
//!
//! Cancellation only stops new calls: a call already in flight runs to
//! completion (or its timeout) and is recorded. The executor call is
//! spawned so that abandoning it at the plan deadline or on timeout never
//! aborts the request itself; its result is then discarded.

use crate::ports::cache::{CacheRequest, NoCache, ResponseCache};
use crate::ports::executor::{Executor, ExecutorError, ExecutorRequest, ExecutorResponse};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::telemetry::{NoTelemetry, TelemetryStore};
use crate::use_cases::route_model::AdaptiveModelRouter;
use conductor_domain::util::now_millis;
use conductor_domain::{
    Agent, AgentOutput, ModelRegistry, QualityGates, RouteConstraints, RoutingRecord, Tier,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors from a single agent call
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent {agent} timed out after {secs}s")]
    Timeout { agent: String, secs: u64 },

    #[error("Agent {agent} failed: {source}")]
    Executor {
        agent: String,
        #[source]
        source: ExecutorError,
    },

    #[error("Agent {agent} failed quality gates: {summary}")]
    QualityGate {
        agent: String,
        summary: String,
        output: Box<AgentOutput>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl AgentError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }

    pub fn is_quality_gate(&self) -> bool {
        matches!(self, AgentError::QualityGate { .. })
    }

    /// Output produced despite the failure (gate failures only)
    pub fn output(&self) -> Option<&AgentOutput> {
        match self {
            AgentError::QualityGate { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Per-plan settings shared by every call of a run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Telemetry workflow key
    pub workflow: String,
    pub constraints: RouteConstraints,
    pub plan_gates: QualityGates,
    /// Stops new calls; in-flight calls still complete
    pub cancellation: CancellationToken,
    /// Fired at the plan deadline: in-flight calls are abandoned
    pub abandon: CancellationToken,
}

impl RunContext {
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            constraints: RouteConstraints::default(),
            plan_gates: QualityGates::new(),
            cancellation: CancellationToken::new(),
            abandon: CancellationToken::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: RouteConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_plan_gates(mut self, gates: QualityGates) -> Self {
        self.plan_gates = gates;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_abandon(mut self, token: CancellationToken) -> Self {
        self.abandon = token;
        self
    }

    fn stopped(&self) -> bool {
        self.cancellation.is_cancelled() || self.abandon.is_cancelled()
    }
}

/// System prompt and user message for one call
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPrompt {
    pub system: String,
    pub user: String,
}

/// What an executor call produced: fresh or from cache
struct CallResult {
    response: ExecutorResponse,
    cache_hit: bool,
}

pub struct AgentRunner<E: Executor + 'static> {
    executor: Arc<E>,
    router: Arc<AdaptiveModelRouter>,
    registry: Arc<ModelRegistry>,
    cache: Arc<dyn ResponseCache>,
    telemetry: Arc<dyn TelemetryStore>,
    progress: Arc<dyn ProgressNotifier>,
    default_timeout: Duration,
    cache_ttl: Duration,
}

impl<E: Executor + 'static> AgentRunner<E> {
    pub fn new(executor: Arc<E>, router: Arc<AdaptiveModelRouter>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            executor,
            router,
            registry,
            cache: Arc::new(NoCache),
            telemetry: Arc::new(NoTelemetry),
            progress: Arc::new(NoProgress),
            default_timeout: Duration::from_secs(120),
            cache_ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>, ttl: Duration) -> Self {
        self.cache = cache;
        self.cache_ttl = ttl;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryStore>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn progress(&self) -> &dyn ProgressNotifier {
        self.progress.as_ref()
    }

    fn timeout_for(&self, agent: &Agent) -> Duration {
        agent
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
    }

    /// Run one agent call
    pub async fn run(
        &self,
        agent: &Agent,
        prompt: AgentPrompt,
        ctx: &RunContext,
    ) -> Result<AgentOutput, AgentError> {
        if ctx.stopped() {
            return Err(AgentError::Cancelled);
        }

        let stage = agent.template_id.as_str();
        let upgrade = self
            .router
            .recommend_tier_upgrade(&ctx.workflow, stage, agent.tier)
            .await;
        let tier = if upgrade.recommended {
            info!("Escalating {} to {}: {}", agent.id, upgrade.target, upgrade.reason);
            upgrade.target
        } else {
            agent.tier
        };

        let model_id = self
            .router
            .get_best_model(&ctx.workflow, stage, tier, &ctx.constraints)
            .await;
        self.progress.on_agent_start(agent, tier, &model_id);

        let started = Instant::now();
        let result = self.call(agent, &model_id, tier, &prompt, ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let call = match result {
            Ok(call) => call,
            Err(e) => {
                if !e.is_cancelled() {
                    self.record(ctx, agent, tier, &model_id, None, elapsed_ms, false).await;
                }
                warn!("{}", e);
                self.progress.on_agent_complete(agent, None);
                return Err(e);
            }
        };

        let response = call.response;
        let cost = if response.cost > 0.0 {
            response.cost
        } else {
            self.registry
                .get(&model_id)
                .map(|m| m.cost_for(response.input_tokens, response.output_tokens))
                .unwrap_or(0.0)
        };
        let cost = if call.cache_hit { 0.0 } else { cost };
        let duration_ms = if response.duration_ms > 0 {
            response.duration_ms
        } else {
            elapsed_ms
        };

        let verdict = agent
            .quality_gates
            .merged_over(&ctx.plan_gates)
            .evaluate(&response.content);

        let output = AgentOutput {
            agent_id: agent.id.clone(),
            template_id: agent.template_id.clone(),
            role: agent.role.clone(),
            tier,
            model_id: model_id.clone(),
            content: response.content,
            quality_score: verdict.assessment.quality,
            confidence: verdict.assessment.effective_confidence(),
            cost,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            duration_ms,
            cache_hit: call.cache_hit,
            escalated: tier != agent.tier,
        };

        self.record(ctx, agent, tier, &model_id, Some(&output), duration_ms, verdict.passed())
            .await;

        if !verdict.passed() {
            let summary = verdict.summary();
            warn!("{} failed quality gates: {}", agent.id, summary);
            self.progress.on_agent_complete(agent, None);
            return Err(AgentError::QualityGate {
                agent: agent.id.clone(),
                summary,
                output: Box::new(output),
            });
        }

        if !call.cache_hit {
            let request = CacheRequest::new(&model_id, &prompt.system, &prompt.user);
            self.cache.set(&request, &output.content, self.cache_ttl).await;
        }

        debug!(
            "{} completed on {} (quality {:.2}, cost ${:.4})",
            agent.id, model_id, output.quality_score, output.cost
        );
        self.progress.on_agent_complete(agent, Some(&output));
        Ok(output)
    }

    async fn call(
        &self,
        agent: &Agent,
        model_id: &str,
        tier: Tier,
        prompt: &AgentPrompt,
        ctx: &RunContext,
    ) -> Result<CallResult, AgentError> {
        let cache_request = CacheRequest::new(model_id, &prompt.system, &prompt.user);
        if let Some(content) = self.cache.get(&cache_request).await {
            debug!("Cache hit for {} on {}", agent.id, model_id);
            return Ok(CallResult {
                response: ExecutorResponse::new(content),
                cache_hit: true,
            });
        }

        let request = ExecutorRequest {
            model_id: model_id.to_string(),
            system_prompt: prompt.system.clone(),
            user_message: prompt.user.clone(),
            tier,
        };
        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(async move { executor.call(&request).await });

        let timeout = self.timeout_for(agent);
        let joined = tokio::select! {
            joined = tokio::time::timeout(timeout, handle) => joined,
            _ = ctx.abandon.cancelled() => return Err(AgentError::Cancelled),
        };

        match joined {
            Err(_) => Err(AgentError::Timeout {
                agent: agent.id.clone(),
                secs: timeout.as_secs(),
            }),
            Ok(Err(join_error)) => Err(AgentError::Executor {
                agent: agent.id.clone(),
                source: ExecutorError::Other(format!("executor task failed: {}", join_error)),
            }),
            Ok(Ok(Err(source))) => Err(AgentError::Executor {
                agent: agent.id.clone(),
                source,
            }),
            Ok(Ok(Ok(response))) => Ok(CallResult {
                response,
                cache_hit: false,
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        ctx: &RunContext,
        agent: &Agent,
        tier: Tier,
        model_id: &str,
        output: Option<&AgentOutput>,
        duration_ms: u64,
        success: bool,
    ) {
        let record = RoutingRecord {
            workflow: ctx.workflow.clone(),
            stage: agent.template_id.clone(),
            tier,
            model_id: model_id.to_string(),
            provider: self.registry.provider_of(model_id),
            cost: output.map(|o| o.cost).unwrap_or(0.0),
            input_tokens: output.map(|o| o.input_tokens).unwrap_or(0),
            output_tokens: output.map(|o| o.output_tokens).unwrap_or(0),
            cache_hit: output.is_some_and(|o| o.cache_hit),
            duration_ms,
            success,
            timestamp: now_millis(),
        };
        if let Err(e) = self.telemetry.append(record).await {
            warn!("Failed to record routing telemetry: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted executor shared by use case tests

    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Response script for one template: popped in order, last one repeats
    #[derive(Clone)]
    pub enum Scripted {
        Reply(String),
        Fail(String),
        Delay(Duration, String),
    }

    pub fn reply(text: &str) -> Scripted {
        Scripted::Reply(text.to_string())
    }

    /// A reply long and structured enough to clear default gates
    pub fn good(label: &str) -> Scripted {
        Scripted::Reply(good_text(label))
    }

    pub fn good_text(label: &str) -> String {
        format!(
            "## Findings from {label}\n\n- The change touches request handling and input \
             validation paths that deserve a careful look.\n- Session tokens are compared \
             with a constant-time routine, which is correct.\n- One query is built by string \
             concatenation and should use bound parameters instead.\n\nCONFIDENCE: 0.8"
        )
    }

    #[derive(Default)]
    pub struct ScriptedExecutor {
        scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
        pub requests: Mutex<Vec<ExecutorRequest>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script responses for agents whose first instruction line contains `marker`
        pub fn script(self, marker: &str, responses: Vec<Scripted>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(marker.to_string(), responses.into());
            self
        }

        pub fn requests(&self) -> Vec<ExecutorRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn next_for(&self, request: &ExecutorRequest) -> Scripted {
            let mut scripts = self.scripts.lock().unwrap();
            let mut markers: Vec<_> = scripts.keys().cloned().collect();
            markers.sort_by_key(|m| std::cmp::Reverse(m.len()));
            let headline = request.system_prompt.lines().next().unwrap_or_default();
            for marker in markers {
                if headline.contains(&marker) {
                    let queue = scripts.get_mut(&marker).unwrap();
                    return if queue.len() > 1 {
                        queue.pop_front().unwrap()
                    } else {
                        queue.front().cloned().unwrap()
                    };
                }
            }
            Scripted::Reply(good_text("default"))
        }
    }

    #[async_trait]
    impl Executor for ScriptedExecutor {
        async fn call(&self, request: &ExecutorRequest) -> Result<ExecutorResponse, ExecutorError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.next_for(request) {
                Scripted::Reply(text) => Ok(ExecutorResponse::new(text).with_tokens(500, 200)),
                Scripted::Fail(message) => Err(ExecutorError::RequestFailed(message)),
                Scripted::Delay(delay, text) => {
                    tokio::time::sleep(delay).await;
                    Ok(ExecutorResponse::new(text).with_tokens(500, 200))
                }
            }
        }
    }

    pub fn runner(executor: Arc<ScriptedExecutor>) -> Arc<AgentRunner<ScriptedExecutor>> {
        let registry = Arc::new(ModelRegistry::default());
        let router = Arc::new(AdaptiveModelRouter::new(Arc::new(NoTelemetry), Arc::clone(&registry)));
        Arc::new(AgentRunner::new(executor, router, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::ports::telemetry::TelemetryError;
    use async_trait::async_trait;
    use conductor_domain::TelemetryQuery;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn agent(template_id: &str, tier: Tier) -> Agent {
        Agent {
            id: format!("{}-0001", template_id),
            template_id: template_id.into(),
            role: template_id.into(),
            tier,
            capabilities: Default::default(),
            instructions: format!("You are {}", template_id),
            instructions_template: format!("You are {}", template_id),
            tools: vec![],
            quality_gates: QualityGates::new().with_gate("min_quality", 0.55),
            timeout_secs: None,
            render_warning: None,
        }
    }

    fn prompt(agent: &Agent) -> AgentPrompt {
        AgentPrompt {
            system: agent.instructions.clone(),
            user: "review the change".into(),
        }
    }

    #[derive(Default)]
    struct MemoryTelemetry {
        records: Mutex<Vec<RoutingRecord>>,
    }

    #[async_trait]
    impl TelemetryStore for MemoryTelemetry {
        async fn append(&self, record: RoutingRecord) -> Result<(), TelemetryError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }

        async fn query(&self, query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
            Ok(query.apply(self.records.lock().unwrap().iter()))
        }
    }

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl ResponseCache for MapCache {
        async fn get(&self, request: &CacheRequest) -> Option<String> {
            self.entries.lock().unwrap().get(&request.fingerprint()).cloned()
        }

        async fn set(&self, request: &CacheRequest, value: &str, _ttl: Duration) {
            self.entries
                .lock()
                .unwrap()
                .insert(request.fingerprint(), value.to_string());
        }
    }

    #[tokio::test]
    async fn test_successful_call_records_telemetry() {
        let executor = Arc::new(ScriptedExecutor::new().script("scanner", vec![good("scanner")]));
        let telemetry = Arc::new(MemoryTelemetry::default());
        let registry = Arc::new(ModelRegistry::default());
        let router = Arc::new(AdaptiveModelRouter::new(telemetry.clone(), registry.clone()));
        let runner = AgentRunner::new(executor, router, registry.clone()).with_telemetry(telemetry.clone());

        let a = agent("scanner", Tier::Capable);
        let output = runner.run(&a, prompt(&a), &RunContext::new("security")).await.unwrap();

        assert_eq!(output.model_id, registry.default_model_id(Tier::Capable));
        assert!(output.cost > 0.0);
        assert!(!output.escalated);
        let records = telemetry.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].success);
        assert_eq!(records[0].stage, "scanner");
        assert_eq!(records[0].workflow, "security");
    }

    #[tokio::test]
    async fn test_gate_failure_carries_output() {
        let executor = Arc::new(ScriptedExecutor::new().script("scanner", vec![reply("no")]));
        let runner = runner(executor);
        let a = agent("scanner", Tier::Cheap);

        let err = runner.run(&a, prompt(&a), &RunContext::new("w")).await.unwrap_err();
        assert!(err.is_quality_gate());
        assert_eq!(err.output().map(|o| o.content.as_str()), Some("no"));
    }

    #[tokio::test]
    async fn test_executor_error() {
        let executor = Arc::new(
            ScriptedExecutor::new().script("scanner", vec![Scripted::Fail("rate limited".into())]),
        );
        let runner = runner(executor);
        let a = agent("scanner", Tier::Cheap);
        let err = runner.run(&a, prompt(&a), &RunContext::new("w")).await.unwrap_err();
        assert!(matches!(err, AgentError::Executor { .. }));
    }

    #[tokio::test]
    async fn test_timeout_uses_template_override() {
        let executor = Arc::new(ScriptedExecutor::new().script(
            "slow",
            vec![Scripted::Delay(Duration::from_secs(5), good_text("slow"))],
        ));
        let runner = runner(executor);
        let mut a = agent("slow", Tier::Cheap);
        a.timeout_secs = Some(0);

        let err = runner.run(&a, prompt(&a), &RunContext::new("w")).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let executor = Arc::new(ScriptedExecutor::new());
        let runner = runner(executor.clone());
        let ctx = RunContext::new("w");
        ctx.cancellation.cancel();
        let a = agent("scanner", Tier::Cheap);

        let err = runner.run(&a, prompt(&a), &ctx).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(executor.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_lets_in_flight_call_finish_and_record() {
        let executor = Arc::new(ScriptedExecutor::new().script(
            "scanner",
            vec![Scripted::Delay(Duration::from_millis(300), good_text("scanner"))],
        ));
        let telemetry = Arc::new(MemoryTelemetry::default());
        let registry = Arc::new(ModelRegistry::default());
        let router = Arc::new(AdaptiveModelRouter::new(telemetry.clone(), registry.clone()));
        let runner = AgentRunner::new(executor.clone(), router, registry).with_telemetry(telemetry.clone());

        let ctx = RunContext::new("security");
        let token = ctx.cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let a = agent("scanner", Tier::Capable);
        let output = runner.run(&a, prompt(&a), &ctx).await.unwrap();
        assert!(output.content.contains("Findings from scanner"));
        assert_eq!(telemetry.records.lock().unwrap().len(), 1);

        // No new call starts once cancelled
        let err = runner.run(&a, prompt(&a), &ctx).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(executor.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_abandon_discards_in_flight_call() {
        let executor = Arc::new(ScriptedExecutor::new().script(
            "scanner",
            vec![Scripted::Delay(Duration::from_secs(5), good_text("scanner"))],
        ));
        let telemetry = Arc::new(MemoryTelemetry::default());
        let registry = Arc::new(ModelRegistry::default());
        let router = Arc::new(AdaptiveModelRouter::new(telemetry.clone(), registry.clone()));
        let runner = AgentRunner::new(executor, router, registry).with_telemetry(telemetry.clone());

        let ctx = RunContext::new("security");
        let abandon = ctx.abandon.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            abandon.cancel();
        });

        let a = agent("scanner", Tier::Capable);
        let err = runner.run(&a, prompt(&a), &ctx).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(telemetry.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_executor() {
        let executor = Arc::new(ScriptedExecutor::new().script("scanner", vec![good("scanner")]));
        let registry = Arc::new(ModelRegistry::default());
        let router = Arc::new(AdaptiveModelRouter::new(Arc::new(NoTelemetry), registry.clone()));
        let runner = AgentRunner::new(executor.clone(), router, registry)
            .with_cache(Arc::new(MapCache::default()), Duration::from_secs(60));
        let a = agent("scanner", Tier::Capable);

        let first = runner.run(&a, prompt(&a), &RunContext::new("w")).await.unwrap();
        let second = runner.run(&a, prompt(&a), &RunContext::new("w")).await.unwrap();
        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(second.cost, 0.0);
        assert_eq!(first.content, second.content);
        assert_eq!(executor.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_tier_is_escalated_at_call_time() {
        let telemetry = Arc::new(MemoryTelemetry::default());
        for i in 0..20 {
            telemetry.records.lock().unwrap().push(RoutingRecord {
                workflow: "w".into(),
                stage: "scanner".into(),
                tier: Tier::Cheap,
                model_id: "claude-haiku-4.5".into(),
                provider: "anthropic".into(),
                cost: 0.0,
                input_tokens: 0,
                output_tokens: 0,
                cache_hit: false,
                duration_ms: 10,
                success: i % 2 == 0,
                timestamp: now_millis(),
            });
        }
        let executor = Arc::new(ScriptedExecutor::new().script("scanner", vec![good("scanner")]));
        let registry = Arc::new(ModelRegistry::default());
        let router = Arc::new(AdaptiveModelRouter::new(telemetry.clone(), registry.clone()));
        let runner = AgentRunner::new(executor.clone(), router, registry).with_telemetry(telemetry);
        let a = agent("scanner", Tier::Cheap);

        let output = runner.run(&a, prompt(&a), &RunContext::new("w")).await.unwrap();
        assert_eq!(output.tier, Tier::Capable);
        assert!(output.escalated);
        assert_eq!(executor.requests()[0].tier, Tier::Capable);
    }
}
