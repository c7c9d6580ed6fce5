//! Tier totals and T+N availability buckets for a valued portfolio

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::days_between;
use crate::portfolio::ValuedHolding;
use crate::rules::{LiquidityTier, RedemptionRuleResolver};

/// Capital reachable within N days of today; each bucket includes the ones before it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityBuckets {
    pub t0: f64,
    pub t1: f64,
    pub t3: f64,
    pub t7: f64,
}

impl AvailabilityBuckets {
    fn add(&mut self, days_to_cash: i64, value: f64) {
        if days_to_cash <= 0 {
            self.t0 += value;
        }
        if days_to_cash <= 1 {
            self.t1 += value;
        }
        if days_to_cash <= 3 {
            self.t3 += value;
        }
        if days_to_cash <= 7 {
            self.t7 += value;
        }
    }
}

/// One holding's contribution to the breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDetail {
    pub name: String,
    pub account_id: String,
    pub value: f64,
    pub tier: LiquidityTier,
    /// Days from today until the holding's value can arrive as cash
    pub days_to_cash: i64,
}

/// Capital split by liquidity tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierBreakdown {
    pub cash: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub total: f64,
    pub availability: AvailabilityBuckets,
    pub details: Vec<TierDetail>,
}

impl TierBreakdown {
    /// Classify cash and every holding.
    ///
    /// Tier totals are disjoint. Bucket membership follows each holding's
    /// resolved arrival date from today, so a long lock-up keeps a HIGH-tier
    /// holding out of the short buckets.
    pub fn compute(
        today: NaiveDate,
        resolver: &RedemptionRuleResolver,
        cash: f64,
        holdings: &[ValuedHolding],
    ) -> Self {
        let mut breakdown = Self {
            cash,
            total: cash,
            ..Self::default()
        };
        breakdown.availability.add(0, cash);

        for holding in holdings {
            let arrival = resolver.resolve_availability(today, &holding.holding, holding.fund_type);
            let days_to_cash = days_between(today, arrival).max(0);

            match holding.tier {
                LiquidityTier::Cash => breakdown.cash += holding.value,
                LiquidityTier::High => breakdown.high += holding.value,
                LiquidityTier::Medium => breakdown.medium += holding.value,
                LiquidityTier::Low => breakdown.low += holding.value,
            }
            breakdown.total += holding.value;
            breakdown.availability.add(days_to_cash, holding.value);
            breakdown.details.push(TierDetail {
                name: holding.name.clone(),
                account_id: holding.account_id.clone(),
                value: holding.value,
                tier: holding.tier,
                days_to_cash,
            });
        }

        breakdown
    }

    /// Total for one tier
    pub fn tier_total(&self, tier: LiquidityTier) -> f64 {
        match tier {
            LiquidityTier::Cash => self.cash,
            LiquidityTier::High => self.high,
            LiquidityTier::Medium => self.medium,
            LiquidityTier::Low => self.low,
        }
    }

    /// Cash plus HIGH tier: the capital counted toward survival months
    pub fn quick_liquidity(&self) -> f64 {
        self.cash + self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{Holding, HoldingKey};
    use crate::rules::{FundType, RedemptionRule};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn valued(index: usize, value: f64, fund_type: FundType, rule: Option<RedemptionRule>) -> ValuedHolding {
        let mut holding = Holding::internal("1", value, 1.0);
        holding.redemption_rule = rule;
        ValuedHolding {
            key: HoldingKey::new("acc-01", index),
            account_id: "acc-01".into(),
            name: format!("Fund {}", index),
            holding,
            value,
            fund_type: Some(fund_type),
            tier: LiquidityTier::for_fund_type(Some(fund_type)),
        }
    }

    #[test]
    fn test_tiers_are_disjoint() {
        let holdings = vec![
            valued(0, 100.0, FundType::BroadMarket, None),
            valued(1, 200.0, FundType::Sector, None),
            valued(2, 300.0, FundType::CrossBorder, None),
        ];
        let breakdown = TierBreakdown::compute(d(2025, 6, 1), &RedemptionRuleResolver::default(), 50.0, &holdings);

        assert_relative_eq!(breakdown.cash, 50.0);
        assert_relative_eq!(breakdown.high, 100.0);
        assert_relative_eq!(breakdown.medium, 200.0);
        assert_relative_eq!(breakdown.low, 300.0);
        assert_relative_eq!(breakdown.total, 650.0);
        assert_relative_eq!(breakdown.quick_liquidity(), 150.0);
    }

    #[test]
    fn test_tier_totals_sum_to_total() {
        let holdings = vec![
            valued(0, 100.0, FundType::BroadMarket, None),
            valued(1, 250.0, FundType::CrossBorder, None),
        ];
        let breakdown = TierBreakdown::compute(d(2025, 6, 1), &RedemptionRuleResolver::default(), 40.0, &holdings);

        assert_relative_eq!(breakdown.tier_total(LiquidityTier::Cash), 40.0);
        assert_relative_eq!(breakdown.tier_total(LiquidityTier::High), 100.0);
        assert_relative_eq!(breakdown.tier_total(LiquidityTier::Medium), 0.0);
        assert_relative_eq!(breakdown.tier_total(LiquidityTier::Low), 250.0);
        let sum: f64 = LiquidityTier::ALL.iter().map(|&t| breakdown.tier_total(t)).sum();
        assert_relative_eq!(sum, breakdown.total);
    }

    #[test]
    fn test_buckets_are_cumulative() {
        let holdings = vec![
            valued(0, 100.0, FundType::BroadMarket, None),
            valued(1, 200.0, FundType::Sector, None),
            valued(2, 300.0, FundType::CrossBorder, None),
        ];
        let buckets = TierBreakdown::compute(d(2025, 6, 1), &RedemptionRuleResolver::default(), 50.0, &holdings)
            .availability;

        assert_relative_eq!(buckets.t0, 50.0);
        assert_relative_eq!(buckets.t1, 150.0);
        assert_relative_eq!(buckets.t3, 350.0);
        assert_relative_eq!(buckets.t7, 650.0);
    }

    #[test]
    fn test_locked_holding_stays_out_of_t7() {
        let rule = RedemptionRule::daily(1).with_lockup(d(2025, 12, 31)).unwrap();
        let holdings = vec![valued(0, 1_000.0, FundType::BroadMarket, Some(rule))];
        let breakdown = TierBreakdown::compute(d(2025, 6, 1), &RedemptionRuleResolver::default(), 0.0, &holdings);

        assert_relative_eq!(breakdown.high, 1_000.0);
        assert_relative_eq!(breakdown.availability.t7, 0.0);
        assert_eq!(breakdown.details[0].days_to_cash, 214);
    }
}
