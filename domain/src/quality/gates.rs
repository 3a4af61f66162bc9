//! Named quality thresholds

use super::assessment::OutputAssessment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gate on the heuristic quality score, threshold in [0, 1]
pub const GATE_MIN_QUALITY: &str = "min_quality";
/// Gate on self-reported (or heuristic) confidence, threshold in [0, 1]
pub const GATE_MIN_CONFIDENCE: &str = "min_confidence";
/// Gate on output length in characters
pub const GATE_MIN_LENGTH: &str = "min_length";

/// Mapping of gate name → threshold (Value Object)
///
/// Unknown gate names are carried along but never block an output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityGates(BTreeMap<String, f64>);

impl QualityGates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(mut self, name: impl Into<String>, threshold: f64) -> Self {
        self.0.insert(name.into(), threshold);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Combine with a fallback set; gates already present here win.
    pub fn merged_over(&self, fallback: &QualityGates) -> QualityGates {
        let mut merged = fallback.0.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), *v)));
        QualityGates(merged)
    }

    /// Evaluate an output against every known gate
    pub fn evaluate(&self, output: &str) -> GateVerdict {
        let assessment = OutputAssessment::of(output);
        let mut failures = Vec::new();

        for (name, threshold) in self.iter() {
            let measured = match name {
                GATE_MIN_QUALITY => assessment.quality,
                GATE_MIN_CONFIDENCE => assessment.effective_confidence(),
                GATE_MIN_LENGTH => assessment.length as f64,
                _ => continue,
            };
            if measured < threshold {
                failures.push(GateFailure {
                    gate: name.to_string(),
                    threshold,
                    measured,
                });
            }
        }

        GateVerdict {
            assessment,
            failures,
        }
    }
}

impl FromIterator<(String, f64)> for QualityGates {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single gate an output did not clear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateFailure {
    pub gate: String,
    pub threshold: f64,
    pub measured: f64,
}

impl std::fmt::Display for GateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:.2} below threshold {:.2}",
            self.gate, self.measured, self.threshold
        )
    }
}

/// Result of evaluating an output against a gate set
#[derive(Debug, Clone, PartialEq)]
pub struct GateVerdict {
    pub assessment: OutputAssessment,
    pub failures: Vec<GateFailure>,
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of failed gates
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
