//! Tier upgrade recommendation

use super::record::RoutingRecord;
use crate::core::tier::Tier;
use serde::{Deserialize, Serialize};

/// Outcome of a tier upgrade check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierUpgrade {
    pub recommended: bool,
    pub reason: String,
    /// Tier to route at; equals the current tier when not recommended
    pub target: Tier,
}

impl TierUpgrade {
    fn stay(tier: Tier, reason: String) -> Self {
        Self {
            recommended: false,
            reason,
            target: tier,
        }
    }

    /// Evaluate the most recent calls made at `tier`.
    ///
    /// `recent` should already be limited to the upgrade window.
    pub fn evaluate(
        tier: Tier,
        recent: &[RoutingRecord],
        min_samples: usize,
        failure_rate_threshold: f64,
    ) -> Self {
        if recent.len() < min_samples {
            return Self::stay(
                tier,
                format!(
                    "Insufficient data: {} of {} calls required",
                    recent.len(),
                    min_samples
                ),
            );
        }

        let failures = recent.iter().filter(|r| !r.success).count();
        let rate = failures as f64 / recent.len() as f64;
        let percent = rate * 100.0;

        if rate <= failure_rate_threshold {
            return Self::stay(
                tier,
                format!("Performance acceptable: {:.1}% failure rate", percent),
            );
        }

        match tier.next() {
            Some(next) => Self {
                recommended: true,
                reason: format!(
                    "High failure rate: {:.1}% over last {} calls, upgrade to {}",
                    percent,
                    recent.len(),
                    next
                ),
                target: next,
            },
            None => Self::stay(
                tier,
                format!(
                    "High failure rate: {:.1}% but no tier above {} exists",
                    percent, tier
                ),
            ),
        }
    }
}
