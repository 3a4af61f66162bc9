//! Use cases (application services)
//!
//! [`orchestrate::MetaOrchestrator`] is the entry point; the rest are the
//! pieces it is assembled from.

pub mod agent_runner;
pub mod composition_store;
pub mod orchestrate;
pub mod route_model;
pub mod strategies;
