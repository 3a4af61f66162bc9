//! Telemetry infrastructure: routing record stores.
//!
//! Provides [`JsonlTelemetryStore`], an append-only JSONL file, and
//! [`MemoryTelemetryStore`] for tests and `--no-config` runs. Both
//! implement the [`TelemetryStore`](conductor_application::TelemetryStore)
//! port.

mod jsonl_store;
mod memory;

pub use jsonl_store::JsonlTelemetryStore;
pub use memory::MemoryTelemetryStore;
