//! End-to-end orchestration through the public API with in-memory adapters.

use async_trait::async_trait;
use conductor_application::{
    AdaptiveModelRouter, AgentRunner, CompositionRepository, CompositionStore, Executor,
    ExecutorError, ExecutorRequest, ExecutorResponse, MetaOrchestrator, PersistenceError,
    TelemetryError, TelemetryStore,
};
use conductor_domain::{
    AgentComposition, AgentFactory, ModelRegistry, PatternContribution, PlanSource, RoutingRecord,
    Strategy, TaskContext, TelemetryQuery, TemplateCatalog,
};
use std::sync::{Arc, Mutex};

/// Replies with a well-formed report naming the agent it answered for
#[derive(Default)]
struct ReportingExecutor {
    requests: Mutex<Vec<ExecutorRequest>>,
}

impl ReportingExecutor {
    fn requests(&self) -> Vec<ExecutorRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ReportingExecutor {
    async fn call(&self, request: &ExecutorRequest) -> Result<ExecutorResponse, ExecutorError> {
        self.requests.lock().unwrap().push(request.clone());
        let headline = request.system_prompt.lines().next().unwrap_or_default();
        let content = format!(
            "## Report: {headline}\n\n- The request handling path validates its inputs before \
             use, which keeps malformed payloads out.\n- One query is assembled by string \
             concatenation and should switch to bound parameters.\n- Error messages leak \
             internal paths and should be trimmed.\n\nCONFIDENCE: 0.8"
        );
        Ok(ExecutorResponse::new(content).with_tokens(400, 150))
    }
}

#[derive(Default)]
struct Records {
    compositions: Mutex<Vec<AgentComposition>>,
    contributions: Mutex<Vec<PatternContribution>>,
}

#[async_trait]
impl CompositionRepository for Records {
    async fn find_by_pattern(
        &self,
        task_pattern: &str,
    ) -> Result<Vec<AgentComposition>, PersistenceError> {
        let all = self.compositions.lock().unwrap();
        Ok(all.iter().filter(|c| c.task_pattern == task_pattern).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<AgentComposition>, PersistenceError> {
        let all = self.compositions.lock().unwrap();
        Ok(all.iter().find(|c| c.id == id).cloned())
    }

    async fn upsert(&self, composition: &AgentComposition) -> Result<(), PersistenceError> {
        let mut all = self.compositions.lock().unwrap();
        all.retain(|c| c.id != composition.id);
        all.push(composition.clone());
        Ok(())
    }

    async fn append_contribution(
        &self,
        contribution: &PatternContribution,
    ) -> Result<(), PersistenceError> {
        self.contributions.lock().unwrap().push(contribution.clone());
        Ok(())
    }

    async fn contributions(
        &self,
        task_pattern: &str,
    ) -> Result<Vec<PatternContribution>, PersistenceError> {
        let all = self.contributions.lock().unwrap();
        Ok(all.iter().filter(|c| c.task_pattern == task_pattern).cloned().collect())
    }
}

#[derive(Default)]
struct RecordLog {
    records: Mutex<Vec<RoutingRecord>>,
}

#[async_trait]
impl TelemetryStore for RecordLog {
    async fn append(&self, record: RoutingRecord) -> Result<(), TelemetryError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn query(&self, query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
        Ok(query.apply(self.records.lock().unwrap().iter()))
    }
}

struct Harness {
    orchestrator: MetaOrchestrator<ReportingExecutor>,
    executor: Arc<ReportingExecutor>,
    router: Arc<AdaptiveModelRouter>,
    telemetry: Arc<RecordLog>,
}

fn harness() -> Harness {
    let executor = Arc::new(ReportingExecutor::default());
    let telemetry = Arc::new(RecordLog::default());
    let registry = Arc::new(ModelRegistry::default());
    let router = Arc::new(AdaptiveModelRouter::new(telemetry.clone(), registry.clone()));
    let runner = Arc::new(
        AgentRunner::new(executor.clone(), router.clone(), registry.clone())
            .with_telemetry(telemetry.clone()),
    );
    let factory = AgentFactory::new(TemplateCatalog::builtin(), registry);
    let store = Arc::new(CompositionStore::new(Arc::new(Records::default())));

    Harness {
        orchestrator: MetaOrchestrator::new(runner, factory, store),
        executor,
        router,
        telemetry,
    }
}

#[tokio::test]
async fn test_security_review_runs_security_specialists_in_parallel() {
    let h = harness();
    let result = h
        .orchestrator
        .orchestrate("Review this pull request for security issues", &TaskContext::new(), false)
        .await;

    assert!(result.is_success(), "{:?}", result.failure());
    assert_eq!(result.task_pattern, "security:moderate");
    assert_eq!(result.strategy, Some(Strategy::Parallel));
    assert_eq!(result.source, Some(PlanSource::Fresh));

    let templates: Vec<_> = result.agent_outputs.iter().map(|o| o.template_id.as_str()).collect();
    assert!(templates.contains(&"security_scanner"));
    assert!(templates.contains(&"vulnerability_analyst"));
    assert!(result.output().is_some_and(|o| !o.is_empty()));

    // One telemetry record per call, recorded under the task's domain
    let records = h.telemetry.records.lock().unwrap().clone();
    assert_eq!(records.len(), h.executor.requests().len());
    assert!(records.iter().all(|r| r.workflow == "security" && r.success));
}

#[tokio::test]
async fn test_identical_task_reuses_learned_composition() {
    let h = harness();
    let task = "Review this pull request for security issues";

    let first = h.orchestrator.orchestrate(task, &TaskContext::new(), false).await;
    assert_eq!(first.source, Some(PlanSource::Fresh));
    assert!(first.composition_id.is_some());

    let second = h.orchestrator.orchestrate(task, &TaskContext::new(), false).await;
    assert!(second.is_success());
    assert_eq!(second.source, Some(PlanSource::Reused));
    assert_eq!(second.composition_id, first.composition_id);
    assert_eq!(second.strategy, first.strategy);
}

#[tokio::test]
async fn test_sequential_design_passes_each_stage_forward() {
    let h = harness();
    let result = h
        .orchestrator
        .orchestrate("Design the architecture for a distributed event store", &TaskContext::new(), false)
        .await;

    assert!(result.is_success(), "{:?}", result.failure());
    assert_eq!(result.strategy, Some(Strategy::Sequential));

    let templates: Vec<_> = result.agent_outputs.iter().map(|o| o.template_id.as_str()).collect();
    assert_eq!(templates.first(), Some(&"architect"));
    assert_eq!(templates.last(), Some(&"synthesizer"));

    // The synthesizer is asked with the architect's report in hand
    let requests = h.executor.requests();
    let architect_report = &result.agent_outputs[0].content;
    assert!(requests.last().unwrap().user_message.contains(architect_report.as_str()));
    assert_eq!(result.output(), Some(result.agent_outputs.last().unwrap().content.as_str()));
}

#[tokio::test]
async fn test_routing_stats_reflect_completed_runs() {
    let h = harness();
    h.orchestrator
        .orchestrate("Review this pull request for security issues", &TaskContext::new(), false)
        .await;

    let stats = h.router.get_routing_stats("security", 7).await.unwrap();
    assert_eq!(stats.total_calls, h.executor.requests().len());
    assert_eq!(stats.success_rate, 1.0);
    assert!(!stats.models_used.is_empty());

    let empty = h.router.get_routing_stats("documentation", 7).await.unwrap();
    assert!(empty.is_empty());
}
