//! Earliest-availability resolution for a holding

use chrono::{Datelike, NaiveDate};

use super::{FundType, RedemptionRule, SettlementTable};
use crate::calendar::{add_days, add_months, open_date_in_month};
use crate::portfolio::Holding;

/// Resolves the date a holding's capital becomes spendable
#[derive(Debug, Clone, Default)]
pub struct RedemptionRuleResolver {
    table: SettlementTable,
}

impl RedemptionRuleResolver {
    pub fn new(table: SettlementTable) -> Self {
        Self { table }
    }

    pub fn settlement_table(&self) -> &SettlementTable {
        &self.table
    }

    /// Earliest date the holding's value can arrive as cash if redemption
    /// starts on `reference`.
    ///
    /// Holdings without an explicit rule settle on the default T+N of the
    /// tier implied by `fallback_type`.
    pub fn resolve_availability(
        &self,
        reference: NaiveDate,
        holding: &Holding,
        fallback_type: Option<FundType>,
    ) -> NaiveDate {
        resolve_rule(
            reference,
            holding.redemption_rule.as_ref(),
            self.table.days_for_type(fallback_type),
        )
    }

    /// Settlement delay applied when a redemption of this holding is initiated
    pub fn settlement_days(&self, holding: &Holding, fallback_type: Option<FundType>) -> u32 {
        match &holding.redemption_rule {
            Some(rule) => rule.settlement_days(),
            None => self.table.days_for_type(fallback_type),
        }
    }
}

/// Rule-level resolution; `default_days` applies only when `rule` is `None`
pub fn resolve_rule(reference: NaiveDate, rule: Option<&RedemptionRule>, default_days: u32) -> NaiveDate {
    let rule = match rule {
        Some(rule) => rule,
        None => return add_days(reference, default_days),
    };

    // Maturity is absolute: how far the reference is from it does not matter
    if let RedemptionRule::FixedTerm { maturity_date, settlement_days } = rule {
        return add_days(*maturity_date, *settlement_days);
    }

    let mut base = reference;
    if let Some(lockup_end) = rule.lockup_end_date() {
        if base < lockup_end {
            base = lockup_end;
        }
    }

    match rule {
        RedemptionRule::Monthly { open_day, settlement_days, .. } => {
            add_days(next_open_date(base, *open_day), *settlement_days)
        }
        _ => add_days(base, rule.settlement_days()),
    }
}

/// First open date on or after `base`
fn next_open_date(base: NaiveDate, open_day: u32) -> NaiveDate {
    let this_month = open_date_in_month(base, open_day);
    if base.day() > this_month.day() {
        let next_month = add_months(base.with_day(1).unwrap_or(base), 1);
        open_date_in_month(next_month, open_day)
    } else {
        this_month
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Holding;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn holding_with(rule: Option<RedemptionRule>) -> Holding {
        let mut holding = Holding::internal("1", 1_000.0, 1.0);
        holding.redemption_rule = rule;
        holding
    }

    #[test]
    fn test_monthly_after_open_day_rolls_to_next_month() {
        // openDay 15, T+3, reference 2025-01-20
        let resolver = RedemptionRuleResolver::default();
        let holding = holding_with(Some(RedemptionRule::monthly(15, 3).unwrap()));
        assert_eq!(resolver.resolve_availability(d(2025, 1, 20), &holding, None), d(2025, 2, 18));
    }

    #[test]
    fn test_monthly_on_open_day_counts_as_open() {
        let rule = RedemptionRule::monthly(15, 0).unwrap();
        assert_eq!(resolve_rule(d(2025, 1, 15), Some(&rule), 0), d(2025, 1, 15));
    }

    #[test]
    fn test_fixed_term_ignores_reference() {
        let rule = RedemptionRule::fixed_term(d(2025, 8, 1), 5);
        for reference in [d(2020, 1, 1), d(2025, 7, 31), d(2025, 8, 1), d(2030, 12, 31)] {
            assert_eq!(resolve_rule(reference, Some(&rule), 0), d(2025, 8, 6));
        }
    }

    #[test]
    fn test_lockup_advances_base_before_open_day_search() {
        // Lock-up to 2025-03-01, openDay 10, T+2, reference 2025-02-01
        let rule = RedemptionRule::monthly(10, 2).unwrap().with_lockup(d(2025, 3, 1)).unwrap();
        assert_eq!(resolve_rule(d(2025, 2, 1), Some(&rule), 0), d(2025, 3, 12));
    }

    #[test]
    fn test_expired_lockup_is_ignored() {
        let rule = RedemptionRule::daily(1).with_lockup(d(2024, 1, 1)).unwrap();
        assert_eq!(resolve_rule(d(2025, 2, 1), Some(&rule), 0), d(2025, 2, 2));
    }

    #[test]
    fn test_no_rule_uses_tier_default() {
        let resolver = RedemptionRuleResolver::default();
        let holding = holding_with(None);
        let reference = d(2025, 6, 1);
        assert_eq!(
            resolver.resolve_availability(reference, &holding, Some(FundType::BroadMarket)),
            d(2025, 6, 2)
        );
        assert_eq!(
            resolver.resolve_availability(reference, &holding, Some(FundType::CrossBorder)),
            d(2025, 6, 6)
        );
        assert_eq!(resolver.resolve_availability(reference, &holding, None), d(2025, 6, 4));
    }

    #[test]
    fn test_open_day_31_in_short_month() {
        let rule = RedemptionRule::monthly(31, 0).unwrap();
        assert_eq!(resolve_rule(d(2025, 4, 5), Some(&rule), 0), d(2025, 4, 30));
        assert_eq!(resolve_rule(d(2025, 1, 31), Some(&rule), 0), d(2025, 1, 31));
        assert_eq!(resolve_rule(d(2025, 2, 28), Some(&rule), 0), d(2025, 2, 28));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let rule = RedemptionRule::monthly(5, 1).unwrap();
        assert_eq!(resolve_rule(d(2025, 12, 20), Some(&rule), 0), d(2026, 1, 6));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_daily_is_reference_plus_settlement(offset in 0i64..3650, settlement in 0u32..30) {
            let reference = d(2020, 1, 1) + chrono::Duration::days(offset);
            let rule = RedemptionRule::daily(settlement);
            prop_assert_eq!(resolve_rule(reference, Some(&rule), 99), add_days(reference, settlement));
        }

        #[test]
        fn prop_monthly_lands_on_open_day(offset in 0i64..3650, open_day in 1u32..=28, settlement in 0u32..10) {
            let reference = d(2020, 1, 1) + chrono::Duration::days(offset);
            let rule = RedemptionRule::monthly(open_day, settlement).unwrap();
            let resolved = resolve_rule(reference, Some(&rule), 0);
            let open_date = resolved - chrono::Duration::days(settlement as i64);
            prop_assert_eq!(open_date.day(), open_day);
            if reference.day() <= open_day {
                prop_assert_eq!(open_date.month(), reference.month());
            } else {
                prop_assert_eq!(open_date, open_date_in_month(add_months(reference.with_day(1).unwrap(), 1), open_day));
            }
            prop_assert!(resolved >= reference);
        }

        #[test]
        fn prop_fixed_term_is_reference_independent(offset in -3650i64..3650, settlement in 0u32..30) {
            let maturity = d(2025, 8, 1);
            let reference = maturity + chrono::Duration::days(offset);
            let rule = RedemptionRule::fixed_term(maturity, settlement);
            prop_assert_eq!(resolve_rule(reference, Some(&rule), 0), add_days(maturity, settlement));
        }

        #[test]
        fn prop_future_lockup_replaces_reference(offset in 0i64..1000, lead in 1i64..400, settlement in 0u32..10) {
            let reference = d(2022, 1, 1) + chrono::Duration::days(offset);
            let lockup_end = reference + chrono::Duration::days(lead);
            let rule = RedemptionRule::daily(settlement).with_lockup(lockup_end).unwrap();
            prop_assert_eq!(resolve_rule(reference, Some(&rule), 0), add_days(lockup_end, settlement));
        }
    }
}
