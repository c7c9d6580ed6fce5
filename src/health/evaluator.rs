//! Liquidity health metrics over a projection series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::tiers::TierBreakdown;
use crate::projection::ProjectionPoint;

/// Months of expenses the quick-liquidity capital covers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurvivalMonths {
    Months(f64),
    /// No positive expense baseline to divide by
    Unbounded,
}

impl fmt::Display for SurvivalMonths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurvivalMonths::Months(m) => write!(f, "{:.1} months", m),
            SurvivalMonths::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of days in the range, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Health metrics of one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub survival_months: SurvivalMonths,
    /// Lowest liquid amount; `None` for an empty series
    pub min_balance: Option<f64>,
    /// Runs of consecutive days with liquid amount below the baseline
    pub low_liquidity_ranges: Vec<DateRange>,
}

/// Derives health metrics from a projection and a monthly expense baseline
#[derive(Debug, Clone)]
pub struct HealthMetricsEvaluator {
    quick_liquidity: f64,
}

impl HealthMetricsEvaluator {
    pub fn new(tiers: &TierBreakdown) -> Self {
        Self {
            quick_liquidity: tiers.quick_liquidity(),
        }
    }

    pub fn evaluate(&self, series: &[ProjectionPoint], monthly_expense_baseline: f64) -> HealthMetrics {
        HealthMetrics {
            survival_months: self.survival_months(monthly_expense_baseline),
            min_balance: series
                .iter()
                .map(|p| p.liquid_amount)
                .fold(None, |min: Option<f64>, v| Some(min.map_or(v, |m| m.min(v)))),
            low_liquidity_ranges: low_liquidity_ranges(series, monthly_expense_baseline),
        }
    }

    pub fn survival_months(&self, monthly_expense_baseline: f64) -> SurvivalMonths {
        if !monthly_expense_baseline.is_finite() || monthly_expense_baseline <= 0.0 {
            return SurvivalMonths::Unbounded;
        }
        let months = self.quick_liquidity / monthly_expense_baseline;
        if months.is_finite() {
            SurvivalMonths::Months(months)
        } else {
            SurvivalMonths::Unbounded
        }
    }
}

/// Single forward scan collecting runs with `liquid < baseline`
fn low_liquidity_ranges(series: &[ProjectionPoint], baseline: f64) -> Vec<DateRange> {
    let mut ranges = Vec::new();
    let mut open: Option<DateRange> = None;

    for point in series {
        if point.liquid_amount < baseline {
            match open.as_mut() {
                Some(range) => range.end = point.date,
                None => {
                    open = Some(DateRange {
                        start: point.date,
                        end: point.date,
                    })
                }
            }
        } else if let Some(range) = open.take() {
            ranges.push(range);
        }
    }

    ranges.extend(open);
    ranges
}
