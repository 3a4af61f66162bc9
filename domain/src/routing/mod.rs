//! Routing domain
//!
//! Call records, their aggregation into per-model statistics, and the pure
//! decision rules the adaptive router applies on top of them.

pub mod record;
pub mod stats;
pub mod upgrade;

pub use record::{RoutingRecord, TelemetryQuery};
pub use stats::{ModelStats, RouteConstraints, RoutingStats, choose_model, quality_score};
pub use upgrade::TierUpgrade;
