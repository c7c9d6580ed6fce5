//! Liquidity health: tier breakdown and projection metrics

mod evaluator;
mod tiers;

pub use evaluator::{DateRange, HealthMetrics, HealthMetricsEvaluator, SurvivalMonths};
pub use tiers::{AvailabilityBuckets, TierBreakdown, TierDetail};
