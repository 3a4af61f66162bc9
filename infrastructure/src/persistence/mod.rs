//! Composition persistence adapters.
//!
//! - [`JsonFileCompositionRepository`]: `compositions.json` plus an
//!   append-only `patterns.jsonl` under the data directory
//! - [`MemoryCompositionRepository`]: process-local, for tests and
//!   `--no-config` runs

mod json_file;
mod memory;

pub use json_file::JsonFileCompositionRepository;
pub use memory::MemoryCompositionRepository;
