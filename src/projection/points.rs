//! Projection output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::portfolio::HoldingKey;

/// Why a holding's remaining value is not yet spendable on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockReason {
    WithinLockup { until: NaiveDate },
    NotYetOpen { open_day: u32 },
    SettlementInProgress { settlement_days: u32 },
    HeldToMaturity { until: NaiveDate },
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockReason::WithinLockup { until } => write!(f, "within lock-up (until {})", until),
            LockReason::NotYetOpen { open_day } => write!(f, "not yet open (opens day {})", open_day),
            LockReason::SettlementInProgress { settlement_days } => {
                write!(f, "settlement in progress (T+{})", settlement_days)
            }
            LockReason::HeldToMaturity { until } => write!(f, "held to maturity (until {})", until),
        }
    }
}

/// One still-locked holding on a projection day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedHolding {
    pub holding_key: HoldingKey,
    pub holding_name: String,
    pub value: f64,
    pub reason: LockReason,
}

/// A single day of projection output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub date: NaiveDate,

    /// Cash balance plus auto-unlocked holdings
    pub liquid_amount: f64,

    /// Remaining value of holdings not yet spendable
    pub locked_amount: f64,

    /// Per-holding attribution of `locked_amount`
    pub locked_breakdown: Vec<LockedHolding>,

    /// Signed sum of ledger entries landing on this day
    pub net_flow_that_day: f64,
}

impl ProjectionPoint {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            liquid_amount: 0.0,
            locked_amount: 0.0,
            locked_breakdown: Vec::new(),
            net_flow_that_day: 0.0,
        }
    }

    /// Liquid plus locked
    pub fn total(&self) -> f64 {
        self.liquid_amount + self.locked_amount
    }
}

/// Complete projection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Anchor date of the run
    pub today: NaiveDate,

    /// Daily points, day 0 first
    pub points: Vec<ProjectionPoint>,
}

impl ProjectionResult {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            points: Vec::new(),
        }
    }

    pub fn add_point(&mut self, point: ProjectionPoint) {
        self.points.push(point);
    }

    pub fn point_on(&self, date: NaiveDate) -> Option<&ProjectionPoint> {
        self.points.iter().find(|p| p.date == date)
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let min_liquid = self
            .points
            .iter()
            .map(|p| p.liquid_amount)
            .fold(f64::INFINITY, f64::min);
        let peak_locked = self
            .points
            .iter()
            .map(|p| p.locked_amount)
            .fold(0.0, f64::max);

        ProjectionSummary {
            total_days: self.points.len() as u32,
            starting_liquid: self.points.first().map(|p| p.liquid_amount).unwrap_or(0.0),
            final_liquid: self.points.last().map(|p| p.liquid_amount).unwrap_or(0.0),
            final_locked: self.points.last().map(|p| p.locked_amount).unwrap_or(0.0),
            min_liquid: if self.points.is_empty() { 0.0 } else { min_liquid },
            peak_locked,
            total_net_flow: self.points.iter().map(|p| p.net_flow_that_day).sum(),
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_days: u32,
    pub starting_liquid: f64,
    pub final_liquid: f64,
    pub final_locked: f64,
    pub min_liquid: f64,
    pub peak_locked: f64,
    pub total_net_flow: f64,
}
