//! Infrastructure layer for agent-conductor
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod cache;
pub mod config;
pub mod coordination;
pub mod executor;
pub mod persistence;
pub mod telemetry;

// Re-export commonly used types
pub use cache::MemoryResponseCache;
pub use config::{ConfigLoader, ConfigValidationError, FileConfig, FileOutputFormat};
pub use coordination::InProcessCoordinator;
pub use executor::{CommandExecutor, EchoExecutor};
pub use persistence::{JsonFileCompositionRepository, MemoryCompositionRepository};
pub use telemetry::{JsonlTelemetryStore, MemoryTelemetryStore};
