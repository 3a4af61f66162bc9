//! Application layer for agent-conductor
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{LearningConfig, OrchestratorConfig, RouterConfig};
pub use ports::{
    cache::{CacheRequest, NoCache, ResponseCache},
    composition_repository::{CompositionRepository, PersistenceError},
    coordination::{CoordinationError, Coordinator, MessagePredicate, NoCoordination},
    executor::{Executor, ExecutorError, ExecutorRequest, ExecutorResponse},
    progress::{NoProgress, ProgressNotifier},
    telemetry::{NoTelemetry, TelemetryError, TelemetryStore},
};
pub use use_cases::agent_runner::{AgentError, AgentPrompt, AgentRunner, RunContext};
pub use use_cases::composition_store::CompositionStore;
pub use use_cases::orchestrate::{MetaOrchestrator, PreparedPlan};
pub use use_cases::route_model::AdaptiveModelRouter;
pub use use_cases::strategies::StrategyError;
