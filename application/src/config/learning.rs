//! Composition learning parameters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Recorded uses before a composition is reused by pattern
    pub min_reuse_count: u64,
    /// Quality an outcome needs for its exact task to be reused
    pub reuse_quality_threshold: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_reuse_count: 3,
            reuse_quality_threshold: 0.6,
        }
    }
}

impl LearningConfig {
    pub fn with_min_reuse_count(mut self, count: u64) -> Self {
        self.min_reuse_count = count;
        self
    }

    pub fn with_reuse_quality_threshold(mut self, threshold: f64) -> Self {
        self.reuse_quality_threshold = threshold;
        self
    }
}
