//! Executor adapters.
//!
//! - [`CommandExecutor`]: pipes each request through an external command
//! - [`EchoExecutor`]: deterministic offline executor used by `--dry-run`

mod command;
mod echo;

pub use command::CommandExecutor;
pub use echo::EchoExecutor;
