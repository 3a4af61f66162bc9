//! Quality gates and output assessment.
//!
//! A quality gate is a named threshold a stage's output must clear to be
//! accepted without retry or escalation. Outputs are scored by a
//! deterministic heuristic so that gate decisions are reproducible.

pub mod assessment;
pub mod gates;

pub use assessment::OutputAssessment;
pub use gates::{GateVerdict, QualityGates};
