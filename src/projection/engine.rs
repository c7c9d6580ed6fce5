//! Core projection engine for daily liquid/locked liquidity projections

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::points::{LockReason, LockedHolding, ProjectionPoint, ProjectionResult};
use super::state::ProjectionState;
use crate::calendar::add_days;
use crate::cashflow::{CashFlowEntry, CashFlowLedger};
use crate::portfolio::ValuedHolding;
use crate::rules::{RedemptionRule, RedemptionRuleResolver};

/// Default number of days to project
pub const DEFAULT_HORIZON_DAYS: u32 = 90;

/// Remaining values at or below this are treated as fully redeemed
const VALUE_EPSILON: f64 = 1e-9;

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Day 0 of the projection; the only time input of the engine
    pub today: NaiveDate,

    /// Number of days to project
    pub horizon_days: u32,
}

impl ProjectionConfig {
    /// Default horizon starting at `today`
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            today,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }

    /// First date past the projection window
    pub fn horizon_end(&self) -> NaiveDate {
        add_days(self.today, self.horizon_days)
    }

    /// Whether `date` falls inside `[today, today + horizon_days)`
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.today && date < self.horizon_end()
    }
}

/// Per-holding data resolved once per run
struct HoldingProfile<'a> {
    holding: &'a ValuedHolding,
    arrival: NaiveDate,
    auto_unlocks: bool,
    default_settlement_days: u32,
}

/// Main projection engine
#[derive(Debug, Clone)]
pub struct LiquidityProjector {
    resolver: RedemptionRuleResolver,
    config: ProjectionConfig,
}

impl LiquidityProjector {
    pub fn new(resolver: RedemptionRuleResolver, config: ProjectionConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn resolver(&self) -> &RedemptionRuleResolver {
        &self.resolver
    }

    /// Project cash and holding liquidity day by day over the horizon.
    ///
    /// Redemption inflows drain the holding they reference; the rest of a
    /// holding's value counts as locked until its arrival date, except for
    /// monthly-open holdings, which stay locked until redeemed.
    pub fn project(
        &self,
        starting_cash: f64,
        holdings: &[ValuedHolding],
        ledger: &CashFlowLedger,
    ) -> ProjectionResult {
        let today = self.config.today;
        let mut result = ProjectionResult::new(today);
        let profiles = self.profile_holdings(holdings);
        let flows = self.bucket_entries(ledger);

        debug!(
            "Projecting {} days from {} over {} holdings and {} scheduled dates",
            self.config.horizon_days,
            today,
            profiles.len(),
            flows.len()
        );

        let mut state = ProjectionState::new(today, starting_cash);

        for day in 0..self.config.horizon_days {
            state.begin_day(day);

            if let Some(entries) = flows.get(&state.date) {
                for entry in entries {
                    state.apply_entry(entry);
                }
            }

            let point = self.calculate_day(&state, &profiles);
            result.add_point(point);
        }

        result
    }

    /// Resolve every holding's arrival date, anchored at today
    fn profile_holdings<'a>(&self, holdings: &'a [ValuedHolding]) -> Vec<HoldingProfile<'a>> {
        let table = self.resolver.settlement_table();
        holdings
            .iter()
            .map(|holding| HoldingProfile {
                holding,
                arrival: self.resolver.resolve_availability(
                    self.config.today,
                    &holding.holding,
                    holding.fund_type,
                ),
                auto_unlocks: holding
                    .holding
                    .redemption_rule
                    .as_ref()
                    .map_or(true, RedemptionRule::auto_unlocks),
                default_settlement_days: table.days_for_type(holding.fund_type),
            })
            .collect()
    }

    /// Group in-window ledger entries by date, preserving ledger order
    fn bucket_entries<'a>(&self, ledger: &'a CashFlowLedger) -> BTreeMap<NaiveDate, Vec<&'a CashFlowEntry>> {
        let mut flows: BTreeMap<NaiveDate, Vec<&CashFlowEntry>> = BTreeMap::new();
        let mut skipped = 0usize;

        for entry in ledger.entries() {
            if self.config.contains(entry.date) {
                flows.entry(entry.date).or_default().push(entry);
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            debug!("Ignoring {} ledger entries outside the projection window", skipped);
        }
        flows
    }

    /// Build the point for the state's current day
    fn calculate_day(&self, state: &ProjectionState, profiles: &[HoldingProfile<'_>]) -> ProjectionPoint {
        let mut point = ProjectionPoint::new(state.date);
        let mut unlocked = 0.0;

        for profile in profiles {
            let remaining = state.remaining_value(profile.holding);
            if remaining <= VALUE_EPSILON {
                continue;
            }

            if profile.auto_unlocks && state.date >= profile.arrival {
                unlocked += remaining;
            } else {
                point.locked_amount += remaining;
                point.locked_breakdown.push(LockedHolding {
                    holding_key: profile.holding.key.clone(),
                    holding_name: profile.holding.name.clone(),
                    value: remaining,
                    reason: lock_reason(profile, state.date),
                });
            }
        }

        point.liquid_amount = state.cash + unlocked;
        point.net_flow_that_day = state.net_flow;
        point
    }
}

/// Why a holding is still locked on `date`
fn lock_reason(profile: &HoldingProfile<'_>, date: NaiveDate) -> LockReason {
    let rule = match &profile.holding.holding.redemption_rule {
        Some(rule) => rule,
        None => {
            return LockReason::SettlementInProgress {
                settlement_days: profile.default_settlement_days,
            }
        }
    };

    if let Some(until) = rule.lockup_end_date() {
        if date < until {
            return LockReason::WithinLockup { until };
        }
    }

    match rule {
        RedemptionRule::FixedTerm {
            maturity_date,
            settlement_days,
        } => {
            if date < *maturity_date {
                LockReason::HeldToMaturity { until: *maturity_date }
            } else {
                LockReason::SettlementInProgress {
                    settlement_days: *settlement_days,
                }
            }
        }
        RedemptionRule::Monthly { open_day, .. } => LockReason::NotYetOpen { open_day: *open_day },
        RedemptionRule::Daily { settlement_days, .. } => LockReason::SettlementInProgress {
            settlement_days: *settlement_days,
        },
    }
}
