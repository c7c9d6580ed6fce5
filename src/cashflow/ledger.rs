//! Working cash-flow ledger for one planning session

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{schedule, CashFlowEntry, CashFlowRequest, EntryId, RecurringRuleId, ScheduleError};
use crate::portfolio::HoldingKey;

/// Date-ordered collection of cash-flow entries.
///
/// Entries on the same date keep insertion order. The ledger is derived,
/// non-authoritative state: the planning layer owns it and hands it to the
/// projector by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowLedger {
    entries: Vec<(EntryId, CashFlowEntry)>,
    next_entry: u64,
    next_series: u64,
}

impl CashFlowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CashFlowEntry>) -> Self {
        let mut ledger = Self::new();
        for entry in entries {
            ledger.insert(entry);
        }
        ledger
    }

    /// Expand a request and add the resulting entries.
    ///
    /// Recurring requests without a series id get a ledger-unique one.
    pub fn add(&mut self, mut request: CashFlowRequest) -> Result<Vec<EntryId>, ScheduleError> {
        if request.recurrence.is_some() && request.series_id.is_none() {
            self.next_series += 1;
            request.series_id = Some(RecurringRuleId(format!("series-{}", self.next_series)));
        }
        let entries = schedule(&request)?;
        debug!("Scheduling {} entries for `{}`", entries.len(), request.description);
        Ok(entries.into_iter().map(|e| self.insert(e)).collect())
    }

    /// Insert a single concrete entry
    pub fn insert(&mut self, entry: CashFlowEntry) -> EntryId {
        self.next_entry += 1;
        let id = EntryId(self.next_entry);
        let position = self.entries.partition_point(|(_, e)| e.date <= entry.date);
        self.entries.insert(position, (id, entry));
        id
    }

    pub fn remove(&mut self, id: EntryId) -> Option<CashFlowEntry> {
        let position = self.entries.iter().position(|(entry_id, _)| *entry_id == id)?;
        Some(self.entries.remove(position).1)
    }

    /// Remove every entry generated from one recurring request; returns how many were removed
    pub fn remove_series(&mut self, series: &RecurringRuleId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(_, e)| e.recurring_rule_id.as_ref() != Some(series));
        before - self.entries.len()
    }

    pub fn get(&self, id: EntryId) -> Option<&CashFlowEntry> {
        self.entries.iter().find(|(entry_id, _)| *entry_id == id).map(|(_, e)| e)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CashFlowEntry> {
        self.entries.iter().map(|(_, e)| e)
    }

    pub fn entries_on(&self, date: NaiveDate) -> impl Iterator<Item = &CashFlowEntry> {
        self.entries().filter(move |e| e.date == date)
    }

    /// Sum of redemption inflows already planned against a holding
    pub fn redeemed_total(&self, key: &HoldingKey) -> f64 {
        self.entries()
            .filter(|e| e.redeemed_holding() == Some(key))
            .map(|e| e.amount)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::Frequency;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_entries_kept_in_date_order() {
        let mut ledger = CashFlowLedger::new();
        ledger.insert(CashFlowEntry::outflow(d(2025, 6, 25), 200_000.0, "Fee"));
        ledger.insert(CashFlowEntry::inflow(d(2025, 6, 20), 500_000.0, "Dividend"));
        ledger.insert(CashFlowEntry::inflow(d(2025, 6, 25), 1_000.0, "Refund"));

        let descriptions: Vec<_> = ledger.entries().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Dividend", "Fee", "Refund"]);
    }

    #[test]
    fn test_add_assigns_unique_series_ids() {
        let mut ledger = CashFlowLedger::new();
        let request = CashFlowRequest::outflow(d(2025, 1, 1), 10_000.0, "Living costs")
            .recurring(Frequency::Monthly, 3);
        ledger.add(request.clone()).unwrap();
        ledger.add(request).unwrap();

        let series: Vec<_> = ledger.entries().filter_map(|e| e.recurring_rule_id.clone()).collect();
        assert_eq!(series.len(), 6);
        assert_eq!(series.iter().filter(|s| s.0 == "series-1").count(), 3);
        assert_eq!(series.iter().filter(|s| s.0 == "series-2").count(), 3);
    }

    #[test]
    fn test_remove_series_removes_all_occurrences() {
        let mut ledger = CashFlowLedger::new();
        ledger
            .add(CashFlowRequest::outflow(d(2025, 1, 1), 10_000.0, "Rent").recurring(Frequency::Monthly, 12))
            .unwrap();
        let single = ledger.add(CashFlowRequest::inflow(d(2025, 2, 1), 5_000.0, "Bonus")).unwrap();

        assert_eq!(ledger.remove_series(&RecurringRuleId("series-1".into())), 12);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.get(single[0]).is_some());
    }

    #[test]
    fn test_remove_single_entry() {
        let mut ledger = CashFlowLedger::new();
        let ids = ledger.add(CashFlowRequest::inflow(d(2025, 2, 1), 5_000.0, "Bonus")).unwrap();
        assert_eq!(ledger.remove(ids[0]).map(|e| e.amount), Some(5_000.0));
        assert!(ledger.is_empty());
        assert_eq!(ledger.remove(ids[0]), None);
    }

    #[test]
    fn test_redeemed_total_counts_only_inflows_for_key() {
        let key = HoldingKey::new("acc-01", 0);
        let mut ledger = CashFlowLedger::new();
        ledger
            .add(CashFlowRequest::redemption(d(2025, 3, 10), 1_000.0, "R1", key.clone(), 1).recurring(Frequency::Monthly, 2))
            .unwrap();
        ledger
            .add(CashFlowRequest::redemption(d(2025, 3, 10), 500.0, "Other", HoldingKey::new("acc-01", 1), 1))
            .unwrap();
        assert_eq!(ledger.redeemed_total(&key), 2_000.0);
    }

    #[test]
    fn test_entries_on_date() {
        let ledger = CashFlowLedger::from_entries(vec![
            CashFlowEntry::inflow(d(2025, 6, 20), 1.0, "a"),
            CashFlowEntry::inflow(d(2025, 6, 21), 2.0, "b"),
            CashFlowEntry::outflow(d(2025, 6, 20), 3.0, "c"),
        ]);
        assert_eq!(ledger.entries_on(d(2025, 6, 20)).count(), 2);
    }
}
