//! Presentation layer for agent-conductor
//!
//! This crate contains the CLI definition, the terminal approval prompt,
//! output formatters and progress reporters.

pub mod approval;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use approval::console::{ConsoleApproval, parse_decision};
pub use approval::piped::PipedApproval;
pub use cli::commands::{Cli, OutputFormat, parse_context};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ProgressReporter;
