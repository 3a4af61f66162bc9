//! Domain layer for agent-conductor
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns and no
//! async runtime: everything here is deterministic.
//!
//! # Core Concepts
//!
//! ## Tiers
//!
//! Every model call is made at a [`Tier`] (Cheap < Capable < Premium). Tiers
//! only ever go down when agents are spawned under a cost ceiling, and only
//! ever go up when the router recommends an upgrade at call time.
//!
//! ## Templates, agents and plans
//!
//! - **AgentTemplate**: reusable archetype with capabilities and a preferred tier
//! - **Agent**: a template instantiated for one task
//! - **ExecutionPlan**: agents plus the [`Strategy`] that composes them
//!
//! ## Learning
//!
//! Successful plans are stored as an [`AgentComposition`] keyed by task
//! pattern (`"{domain}:{complexity}"`), and [`RoutingRecord`]s feed the
//! per-model statistics the router ranks by.

pub mod agent;
pub mod composition;
pub mod core;
pub mod plan;
pub mod quality;
pub mod registry;
pub mod routing;
pub mod task;
pub mod util;

// Re-export commonly used types
pub use agent::{
    catalog::{CATALOG_VERSION, TemplateCatalog},
    entities::{Agent, highest_tier, lowest_tier},
    factory::{AgentFactory, SpawnedTeam},
    render::{render_outputs, render_task},
    template::AgentTemplate,
};
pub use composition::{
    AgentComposition, AgentSpec, CompositionOutcome, PatternContribution, best_for_pattern,
};
pub use core::{error::DomainError, tier::Tier};
pub use plan::{
    AgentOutput, AggregatedResult, ExecutionOutcome, ExecutionPlan, ExecutionResult, FailureKind,
    OrchestrationFailure, PlanSource, Strategy, select_strategy,
};
pub use quality::{GateVerdict, OutputAssessment, QualityGates};
pub use registry::{ModelRegistry, ModelSpec};
pub use routing::{
    ModelStats, RouteConstraints, RoutingRecord, RoutingStats, TelemetryQuery, TierUpgrade,
    choose_model, quality_score,
};
pub use task::{
    TaskContext,
    analyzer::TaskAnalyzer,
    requirements::{Complexity, TaskRequirements},
};
