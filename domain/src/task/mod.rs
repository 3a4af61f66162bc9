//! Task analysis domain
//!
//! Turns a task description and its context into structured
//! [`TaskRequirements`](requirements::TaskRequirements).

pub mod analyzer;
pub mod requirements;

use serde_json::Value;
use std::collections::BTreeMap;

/// Caller-supplied context accompanying a task description.
///
/// Ordered so that signatures derived from it are stable.
pub type TaskContext = BTreeMap<String, Value>;
