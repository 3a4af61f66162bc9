//! Router parameters.

use serde::{Deserialize, Serialize};

/// Parameters of the adaptive model router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Calls a model needs in the lookback window before it is ranked
    pub min_sample_size: usize,
    /// Failure rate above which a tier upgrade is recommended
    pub failure_rate_threshold: f64,
    /// Most recent calls considered for an upgrade
    pub upgrade_window: usize,
    /// Calls needed in the window before an upgrade can be recommended
    pub upgrade_min_samples: usize,
    pub lookback_days: u32,
    /// Success-rate floor when the task sets none
    pub min_success_rate: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_sample_size: 10,
            failure_rate_threshold: 0.20,
            upgrade_window: 20,
            upgrade_min_samples: 10,
            lookback_days: 7,
            min_success_rate: 0.80,
        }
    }
}

impl RouterConfig {
    // ==================== Builder Methods ====================

    pub fn with_min_sample_size(mut self, n: usize) -> Self {
        self.min_sample_size = n;
        self
    }

    pub fn with_failure_rate_threshold(mut self, rate: f64) -> Self {
        self.failure_rate_threshold = rate;
        self
    }

    pub fn with_upgrade_window(mut self, window: usize, min_samples: usize) -> Self {
        self.upgrade_window = window;
        self.upgrade_min_samples = min_samples;
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_min_success_rate(mut self, rate: f64) -> Self {
        self.min_success_rate = rate;
        self
    }
}
