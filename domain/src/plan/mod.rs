//! Execution plans, composition strategies and their results

pub mod entities;
pub mod result;
pub mod strategy;

pub use entities::{ExecutionPlan, PlanSource};
pub use result::{
    AgentOutput, AggregatedResult, ExecutionOutcome, ExecutionResult, FailureKind,
    OrchestrationFailure,
};
pub use strategy::{Strategy, select_strategy};
