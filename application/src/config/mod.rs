//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`OrchestratorConfig`]: timeouts, cache TTL, plan-wide gates
//! - [`RouterConfig`]: sample sizes and thresholds for model routing
//! - [`LearningConfig`]: when stored compositions are reused

pub mod learning;
pub mod orchestrator;
pub mod router;

pub use learning::LearningConfig;
pub use orchestrator::OrchestratorConfig;
pub use router::RouterConfig;
