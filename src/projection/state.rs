//! Running state of a liquidity projection

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::calendar::add_days;
use crate::cashflow::CashFlowEntry;
use crate::portfolio::{HoldingKey, ValuedHolding};

/// State of the portfolio on one projection day
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Anchor date (day 0)
    pub today: NaiveDate,

    /// Current projection day (0-indexed from today)
    pub day: u32,

    /// Calendar date of the current day
    pub date: NaiveDate,

    /// Running cash balance: starting cash plus every entry applied so far
    pub cash: f64,

    /// Signed sum of entries applied on the current day
    pub net_flow: f64,

    /// Value already redeemed out of each holding by landed redemption inflows
    redeemed: HashMap<HoldingKey, f64>,
}

impl ProjectionState {
    /// Initialize state at the start of the projection
    pub fn new(today: NaiveDate, starting_cash: f64) -> Self {
        Self {
            today,
            day: 0,
            date: today,
            cash: starting_cash,
            net_flow: 0.0,
            redeemed: HashMap::new(),
        }
    }

    /// Move to projection day `day`; per-day accumulators reset
    pub fn begin_day(&mut self, day: u32) {
        self.day = day;
        self.date = add_days(self.today, day);
        self.net_flow = 0.0;
    }

    /// Apply one ledger entry landing on the current day
    pub fn apply_entry(&mut self, entry: &CashFlowEntry) {
        let signed = entry.signed_amount();
        self.cash += signed;
        self.net_flow += signed;

        if let Some(key) = entry.redeemed_holding() {
            *self.redeemed.entry(key.clone()).or_insert(0.0) += entry.amount;
        }
    }

    /// Amount redeemed so far out of a holding
    pub fn redeemed(&self, key: &HoldingKey) -> f64 {
        self.redeemed.get(key).copied().unwrap_or(0.0)
    }

    /// Holding value not yet converted to cash by a redemption
    pub fn remaining_value(&self, holding: &ValuedHolding) -> f64 {
        (holding.value - self.redeemed(&holding.key)).max(0.0)
    }
}
