//! Redemption rule model
//!
//! A rule is a proper sum type: each variant carries only the fields that
//! apply to it. The loosely-typed wire shape (`RuleSpec`) is converted and
//! checked on deserialization, so a malformed rule never reaches the
//! resolver or the projector.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Discriminant of a redemption rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Redeemable any business day
    Daily,
    /// Redeemable only on a fixed day of each month
    Monthly,
    /// Redeemable only at maturity
    FixedTerm,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RuleType::Daily => "DAILY",
            RuleType::Monthly => "MONTHLY",
            RuleType::FixedTerm => "FIXED_TERM",
        };
        f.write_str(label)
    }
}

/// Reasons a rule is rejected at edit / load time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("open day {0} is outside 1..=31")]
    OpenDayOutOfRange(u32),

    #[error("MONTHLY rule requires an open day")]
    MissingOpenDay,

    #[error("FIXED_TERM rule requires a maturity date")]
    MissingMaturityDate,

    #[error("{0} rule does not take an open day")]
    UnexpectedOpenDay(RuleType),

    #[error("{0} rule does not take a maturity date")]
    UnexpectedMaturityDate(RuleType),

    #[error("FIXED_TERM rule cannot carry a lock-up; maturity already locks it")]
    LockupNotApplicable,

    #[error("settlement days must be non-negative, got {0}")]
    NegativeSettlementDays(i64),

    #[error("settlement days {0} is too large")]
    SettlementDaysOutOfRange(i64),
}

/// Policy governing when a holding's value can be converted to cash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec", into = "RuleSpec")]
pub enum RedemptionRule {
    Daily {
        settlement_days: u32,
        lockup_end_date: Option<NaiveDate>,
    },
    Monthly {
        /// Day of month the product opens for redemption (1-31)
        open_day: u32,
        settlement_days: u32,
        lockup_end_date: Option<NaiveDate>,
    },
    FixedTerm {
        maturity_date: NaiveDate,
        settlement_days: u32,
    },
}

impl RedemptionRule {
    pub fn daily(settlement_days: u32) -> Self {
        RedemptionRule::Daily { settlement_days, lockup_end_date: None }
    }

    pub fn monthly(open_day: u32, settlement_days: u32) -> Result<Self, RuleError> {
        let rule = RedemptionRule::Monthly { open_day, settlement_days, lockup_end_date: None };
        rule.validate()?;
        Ok(rule)
    }

    pub fn fixed_term(maturity_date: NaiveDate, settlement_days: u32) -> Self {
        RedemptionRule::FixedTerm { maturity_date, settlement_days }
    }

    /// Attach a lock-up end date (not applicable to fixed-term rules)
    pub fn with_lockup(self, lockup_end: NaiveDate) -> Result<Self, RuleError> {
        match self {
            RedemptionRule::Daily { settlement_days, .. } => Ok(RedemptionRule::Daily {
                settlement_days,
                lockup_end_date: Some(lockup_end),
            }),
            RedemptionRule::Monthly { open_day, settlement_days, .. } => Ok(RedemptionRule::Monthly {
                open_day,
                settlement_days,
                lockup_end_date: Some(lockup_end),
            }),
            RedemptionRule::FixedTerm { .. } => Err(RuleError::LockupNotApplicable),
        }
    }

    /// Re-check invariants of a directly constructed rule
    pub fn validate(&self) -> Result<(), RuleError> {
        match self {
            RedemptionRule::Monthly { open_day, .. } if !(1..=31).contains(open_day) => {
                Err(RuleError::OpenDayOutOfRange(*open_day))
            }
            _ => Ok(()),
        }
    }

    pub fn rule_type(&self) -> RuleType {
        match self {
            RedemptionRule::Daily { .. } => RuleType::Daily,
            RedemptionRule::Monthly { .. } => RuleType::Monthly,
            RedemptionRule::FixedTerm { .. } => RuleType::FixedTerm,
        }
    }

    pub fn settlement_days(&self) -> u32 {
        match self {
            RedemptionRule::Daily { settlement_days, .. }
            | RedemptionRule::Monthly { settlement_days, .. }
            | RedemptionRule::FixedTerm { settlement_days, .. } => *settlement_days,
        }
    }

    pub fn lockup_end_date(&self) -> Option<NaiveDate> {
        match self {
            RedemptionRule::Daily { lockup_end_date, .. }
            | RedemptionRule::Monthly { lockup_end_date, .. } => *lockup_end_date,
            RedemptionRule::FixedTerm { .. } => None,
        }
    }

    /// Whether the projection releases this holding without a planned redemption.
    ///
    /// Periodic-window products need an active decision on an open day, so
    /// monthly rules stay locked until a redemption entry drains them.
    pub fn auto_unlocks(&self) -> bool {
        !matches!(self, RedemptionRule::Monthly { .. })
    }
}

/// Wire representation of a rule: one flat record with optional fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_day: Option<u32>,
    pub settlement_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockup_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
}

impl TryFrom<RuleSpec> for RedemptionRule {
    type Error = RuleError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        if spec.settlement_days < 0 {
            return Err(RuleError::NegativeSettlementDays(spec.settlement_days));
        }
        let settlement_days =
            u32::try_from(spec.settlement_days).map_err(|_| RuleError::SettlementDaysOutOfRange(spec.settlement_days))?;

        match spec.rule_type {
            RuleType::Daily => {
                if spec.open_day.is_some() {
                    return Err(RuleError::UnexpectedOpenDay(RuleType::Daily));
                }
                if spec.maturity_date.is_some() {
                    return Err(RuleError::UnexpectedMaturityDate(RuleType::Daily));
                }
                Ok(RedemptionRule::Daily {
                    settlement_days,
                    lockup_end_date: spec.lockup_end_date,
                })
            }
            RuleType::Monthly => {
                if spec.maturity_date.is_some() {
                    return Err(RuleError::UnexpectedMaturityDate(RuleType::Monthly));
                }
                let open_day = spec.open_day.ok_or(RuleError::MissingOpenDay)?;
                let rule = RedemptionRule::Monthly {
                    open_day,
                    settlement_days,
                    lockup_end_date: spec.lockup_end_date,
                };
                rule.validate()?;
                Ok(rule)
            }
            RuleType::FixedTerm => {
                if spec.open_day.is_some() {
                    return Err(RuleError::UnexpectedOpenDay(RuleType::FixedTerm));
                }
                if spec.lockup_end_date.is_some() {
                    return Err(RuleError::LockupNotApplicable);
                }
                let maturity_date = spec.maturity_date.ok_or(RuleError::MissingMaturityDate)?;
                Ok(RedemptionRule::FixedTerm { maturity_date, settlement_days })
            }
        }
    }
}

impl From<RedemptionRule> for RuleSpec {
    fn from(rule: RedemptionRule) -> Self {
        let rule_type = rule.rule_type();
        let settlement_days = rule.settlement_days() as i64;
        let lockup_end_date = rule.lockup_end_date();
        match rule {
            RedemptionRule::Daily { .. } => RuleSpec {
                rule_type,
                open_day: None,
                settlement_days,
                lockup_end_date,
                maturity_date: None,
            },
            RedemptionRule::Monthly { open_day, .. } => RuleSpec {
                rule_type,
                open_day: Some(open_day),
                settlement_days,
                lockup_end_date,
                maturity_date: None,
            },
            RedemptionRule::FixedTerm { maturity_date, .. } => RuleSpec {
                rule_type,
                open_day: None,
                settlement_days,
                lockup_end_date: None,
                maturity_date: Some(maturity_date),
            },
        }
    }
}
