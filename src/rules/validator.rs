//! Legality check for a proposed redemption date

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

use super::RedemptionRule;
use crate::calendar::open_date_in_month;
use crate::portfolio::Holding;

/// Why a redemption is not allowed on the proposed date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockReason {
    WithinLockup { until: NaiveDate },
    BeforeMaturity { maturity: NaiveDate },
    NotAnOpenDay { open_day: u32 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::WithinLockup { .. } => f.write_str("within lock-up"),
            BlockReason::BeforeMaturity { .. } => f.write_str("before maturity"),
            BlockReason::NotAnOpenDay { .. } => f.write_str("not an open day"),
        }
    }
}

/// Outcome of validating a proposed redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Ok,
    Blocked(BlockReason),
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }

    pub fn reason(&self) -> Option<BlockReason> {
        match self {
            Verdict::Ok => None,
            Verdict::Blocked(reason) => Some(*reason),
        }
    }
}

/// Check whether `holding` may be redeemed on `proposed`.
///
/// Lock-up is checked first, then maturity, then the monthly open day.
/// Holdings without a rule can always be redeemed.
pub fn validate_redemption(proposed: NaiveDate, holding: &Holding) -> Verdict {
    let rule = match &holding.redemption_rule {
        Some(rule) => rule,
        None => return Verdict::Ok,
    };

    if let Some(until) = rule.lockup_end_date() {
        if proposed < until {
            return Verdict::Blocked(BlockReason::WithinLockup { until });
        }
    }

    match rule {
        RedemptionRule::FixedTerm { maturity_date, .. } if proposed < *maturity_date => {
            Verdict::Blocked(BlockReason::BeforeMaturity { maturity: *maturity_date })
        }
        RedemptionRule::Monthly { open_day, .. }
            if proposed.day() != open_date_in_month(proposed, *open_day).day() =>
        {
            Verdict::Blocked(BlockReason::NotAnOpenDay { open_day: *open_day })
        }
        _ => Verdict::Ok,
    }
}
