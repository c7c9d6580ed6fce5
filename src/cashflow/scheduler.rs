//! Expansion of planned cash-flow requests into dated ledger entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use super::{CashFlowEntry, Direction, RecurringRuleId};
use crate::calendar::{add_days, add_months};
use crate::portfolio::HoldingKey;

/// Upper bound on the occurrences one recurring request may generate
pub const MAX_OCCURRENCES: u32 = 1_200;

/// Errors raised for requests that cannot produce ledger entries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("cash-flow amount must be positive and finite, got {0}")]
    NonPositiveAmount(f64),

    #[error("recurring request must generate at least one entry")]
    ZeroCount,

    #[error("recurring request asks for {0} occurrences, at most {max} allowed", max = MAX_OCCURRENCES)]
    TooManyOccurrences(u32),

    #[error("a redemption request must be an inflow")]
    RedemptionMustBeInflow,
}

/// Repeat frequency of a recurring request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Months between consecutive occurrences
    pub fn months(self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Yearly => 12,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MONTHLY" => Some(Frequency::Monthly),
            "QUARTERLY" => Some(Frequency::Quarterly),
            "YEARLY" | "ANNUAL" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

/// Recurrence parameters: `count` occurrences every `frequency`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
    pub count: u32,
}

/// What the request represents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Ordinary income or expense
    Plain,
    /// Redemption of a holding; cash lands after the holding's settlement delay
    Redemption {
        holding_key: HoldingKey,
        settlement_days: u32,
    },
}

/// A planned cash flow as entered by the planning UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRequest {
    /// Start date (redemptions: the date the redemption is initiated)
    pub date: NaiveDate,
    pub amount: f64,
    pub direction: Direction,
    pub description: String,
    pub kind: RequestKind,
    pub recurrence: Option<Recurrence>,
    /// Series id to stamp on generated entries; derived from the request when absent
    pub series_id: Option<RecurringRuleId>,
}

impl CashFlowRequest {
    pub fn inflow(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            direction: Direction::Inflow,
            description: description.into(),
            kind: RequestKind::Plain,
            recurrence: None,
            series_id: None,
        }
    }

    pub fn outflow(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            direction: Direction::Outflow,
            ..Self::inflow(date, amount, description)
        }
    }

    pub fn redemption(
        date: NaiveDate,
        amount: f64,
        description: impl Into<String>,
        holding_key: HoldingKey,
        settlement_days: u32,
    ) -> Self {
        Self {
            kind: RequestKind::Redemption { holding_key, settlement_days },
            ..Self::inflow(date, amount, description)
        }
    }

    pub fn recurring(mut self, frequency: Frequency, count: u32) -> Self {
        self.recurrence = Some(Recurrence { frequency, count });
        self
    }

    pub fn with_series_id(mut self, series_id: RecurringRuleId) -> Self {
        self.series_id = Some(series_id);
        self
    }

    pub fn holding_key(&self) -> Option<&HoldingKey> {
        match &self.kind {
            RequestKind::Redemption { holding_key, .. } => Some(holding_key),
            RequestKind::Plain => None,
        }
    }

    /// Reject requests that cannot be expanded into ledger entries
    pub fn check(&self) -> Result<(), ScheduleError> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(ScheduleError::NonPositiveAmount(self.amount));
        }
        match self.recurrence {
            Some(Recurrence { count: 0, .. }) => return Err(ScheduleError::ZeroCount),
            Some(Recurrence { count, .. }) if count > MAX_OCCURRENCES => {
                return Err(ScheduleError::TooManyOccurrences(count))
            }
            _ => {}
        }
        if matches!(self.kind, RequestKind::Redemption { .. }) && self.direction != Direction::Inflow {
            return Err(ScheduleError::RedemptionMustBeInflow);
        }
        Ok(())
    }

    /// Dates each occurrence is initiated, before any settlement shift.
    ///
    /// Occurrences are computed from the anchor date, not chained, so a
    /// month-end anchor does not drift after passing a short month.
    /// The list stops early if a month offset no longer fits in `u32`.
    pub fn initiation_dates(&self) -> Vec<NaiveDate> {
        match self.recurrence {
            None => vec![self.date],
            Some(Recurrence { frequency, count }) => (0..count)
                .map_while(|k| k.checked_mul(frequency.months()))
                .map(|offset| add_months(self.date, offset))
                .collect(),
        }
    }

    /// Total amount across all occurrences
    pub fn total_amount(&self) -> f64 {
        let occurrences = self.recurrence.map(|r| r.count).unwrap_or(1);
        self.amount * occurrences as f64
    }

    fn derived_series_id(&self) -> RecurringRuleId {
        let mut hasher = DefaultHasher::new();
        self.date.hash(&mut hasher);
        self.amount.to_bits().hash(&mut hasher);
        self.direction.hash(&mut hasher);
        self.description.hash(&mut hasher);
        self.kind.hash(&mut hasher);
        self.recurrence.hash(&mut hasher);
        RecurringRuleId(format!("rec-{}-{:016x}", self.date, hasher.finish()))
    }
}

/// Expand a request into concrete ledger entries.
///
/// Redemption entries land on the date funds arrive (initiation + settlement
/// days) and carry the holding key; recurring requests share one series id.
pub fn schedule(request: &CashFlowRequest) -> Result<Vec<CashFlowEntry>, ScheduleError> {
    request.check()?;

    let (settlement_days, related_holding_key) = match &request.kind {
        RequestKind::Plain => (0, None),
        RequestKind::Redemption { holding_key, settlement_days } => (*settlement_days, Some(holding_key.clone())),
    };

    let recurring_rule_id = request.recurrence.map(|_| {
        request
            .series_id
            .clone()
            .unwrap_or_else(|| request.derived_series_id())
    });

    Ok(request
        .initiation_dates()
        .into_iter()
        .map(|initiated| CashFlowEntry {
            date: add_days(initiated, settlement_days),
            amount: request.amount,
            direction: request.direction,
            description: request.description.clone(),
            recurring_rule_id: recurring_rule_id.clone(),
            related_holding_key: related_holding_key.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_single_plain_entry() {
        let request = CashFlowRequest::outflow(d(2025, 6, 25), 200_000.0, "Trust management fee");
        let entries = schedule(&request).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, d(2025, 6, 25));
        assert_eq!(entries[0].direction, Direction::Outflow);
        assert_eq!(entries[0].recurring_rule_id, None);
        assert_eq!(entries[0].related_holding_key, None);
    }

    #[test]
    fn test_redemption_shifted_by_settlement() {
        let key = HoldingKey::new("acc-01", 0);
        let request = CashFlowRequest::redemption(d(2025, 3, 10), 50_000.0, "Redeem", key.clone(), 2);
        let entries = schedule(&request).unwrap();
        assert_eq!(entries[0].date, d(2025, 3, 12));
        assert_eq!(entries[0].related_holding_key, Some(key));
        assert_eq!(entries[0].direction, Direction::Inflow);
    }

    #[test]
    fn test_quarterly_recurrence_shares_series() {
        let request = CashFlowRequest::inflow(d(2025, 1, 31), 500_000.0, "Quarterly dividend")
            .recurring(Frequency::Quarterly, 4);
        let entries = schedule(&request).unwrap();
        let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![d(2025, 1, 31), d(2025, 4, 30), d(2025, 7, 31), d(2025, 10, 31)]);

        let series = entries[0].recurring_rule_id.clone().unwrap();
        assert!(entries.iter().all(|e| e.recurring_rule_id.as_ref() == Some(&series)));
    }

    #[test]
    fn test_recurring_redemptions_shift_each_occurrence() {
        let key = HoldingKey::new("acc-02", 1);
        let request = CashFlowRequest::redemption(d(2025, 1, 10), 10_000.0, "Monthly draw", key, 3)
            .recurring(Frequency::Monthly, 3);
        let dates: Vec<_> = schedule(&request).unwrap().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![d(2025, 1, 13), d(2025, 2, 13), d(2025, 3, 13)]);
    }

    #[test]
    fn test_yearly_recurrence() {
        let request = CashFlowRequest::outflow(d(2025, 9, 1), 80_000.0, "Tuition")
            .recurring(Frequency::Yearly, 2);
        let dates: Vec<_> = schedule(&request).unwrap().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![d(2025, 9, 1), d(2026, 9, 1)]);
    }

    #[test]
    fn test_explicit_series_id_is_kept() {
        let series = RecurringRuleId("rent".into());
        let request = CashFlowRequest::outflow(d(2025, 1, 1), 10.0, "Rent")
            .recurring(Frequency::Monthly, 2)
            .with_series_id(series.clone());
        let entries = schedule(&request).unwrap();
        assert!(entries.iter().all(|e| e.recurring_rule_id.as_ref() == Some(&series)));
    }

    #[test]
    fn test_derived_series_id_is_deterministic() {
        let request = CashFlowRequest::outflow(d(2025, 1, 1), 10.0, "Rent").recurring(Frequency::Monthly, 2);
        let first = schedule(&request).unwrap()[0].recurring_rule_id.clone();
        let second = schedule(&request).unwrap()[0].recurring_rule_id.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_invalid_requests() {
        let zero = CashFlowRequest::inflow(d(2025, 1, 1), 0.0, "Nothing");
        assert_eq!(schedule(&zero), Err(ScheduleError::NonPositiveAmount(0.0)));

        let nan = CashFlowRequest::inflow(d(2025, 1, 1), f64::NAN, "NaN");
        assert!(matches!(schedule(&nan), Err(ScheduleError::NonPositiveAmount(_))));

        let empty = CashFlowRequest::inflow(d(2025, 1, 1), 10.0, "Empty").recurring(Frequency::Monthly, 0);
        assert_eq!(schedule(&empty), Err(ScheduleError::ZeroCount));

        let mut outgoing = CashFlowRequest::redemption(d(2025, 1, 1), 10.0, "Bad", HoldingKey::new("a", 0), 1);
        outgoing.direction = Direction::Outflow;
        assert_eq!(schedule(&outgoing), Err(ScheduleError::RedemptionMustBeInflow));
    }

    #[test]
    fn test_occurrence_cap() {
        let longest = CashFlowRequest::outflow(d(2025, 1, 31), 10.0, "Rent")
            .recurring(Frequency::Monthly, MAX_OCCURRENCES);
        let entries = schedule(&longest).unwrap();
        assert_eq!(entries.len(), MAX_OCCURRENCES as usize);
        assert_eq!(entries.last().unwrap().date, d(2124, 12, 31));

        let huge = CashFlowRequest::outflow(d(2025, 1, 1), 10.0, "Forever").recurring(Frequency::Yearly, u32::MAX);
        assert_eq!(schedule(&huge), Err(ScheduleError::TooManyOccurrences(u32::MAX)));
        assert_eq!(huge.check(), Err(ScheduleError::TooManyOccurrences(u32::MAX)));
    }
}
