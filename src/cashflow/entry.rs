//! Dated cash-flow ledger entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::portfolio::HoldingKey;

/// Direction of a cash movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    /// Amount with the sign this direction applies to the cash balance
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            Direction::Inflow => amount,
            Direction::Outflow => -amount,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INFLOW" | "IN" => Some(Direction::Inflow),
            "OUTFLOW" | "OUT" => Some(Direction::Outflow),
            _ => None,
        }
    }
}

/// Groups the entries generated from one recurring request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurringRuleId(pub String);

impl fmt::Display for RecurringRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger-assigned identifier of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

/// A single dated cash movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowEntry {
    /// Date the cash actually moves
    pub date: NaiveDate,
    /// Positive amount; sign comes from `direction`
    pub amount: f64,
    pub direction: Direction,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_rule_id: Option<RecurringRuleId>,
    /// Holding this inflow redeems; its value stops counting as locked once the entry lands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_holding_key: Option<HoldingKey>,
}

impl CashFlowEntry {
    pub fn inflow(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            direction: Direction::Inflow,
            description: description.into(),
            recurring_rule_id: None,
            related_holding_key: None,
        }
    }

    pub fn outflow(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            direction: Direction::Outflow,
            ..Self::inflow(date, amount, description)
        }
    }

    /// Signed effect on the cash balance
    pub fn signed_amount(&self) -> f64 {
        self.direction.signed(self.amount)
    }

    /// Holding redeemed by this entry, if it is a completed redemption
    pub fn redeemed_holding(&self) -> Option<&HoldingKey> {
        match self.direction {
            Direction::Inflow => self.related_holding_key.as_ref(),
            Direction::Outflow => None,
        }
    }
}
