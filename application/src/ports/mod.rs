//! Port definitions (interfaces for external dependencies)
//!
//! Ports define the boundaries between the application and the outside
//! world. Adapters in the infrastructure layer implement these ports; each
//! optional collaborator has a no-op implementation here.

pub mod cache;
pub mod composition_repository;
pub mod coordination;
pub mod executor;
pub mod progress;
pub mod telemetry;
