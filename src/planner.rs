//! Liquidity planning facade
//!
//! Holds one portfolio snapshot, its fund catalog and the projection
//! settings, gates planned redemptions through the validator, and runs the
//! valuation → projection → health pipeline in one call.

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::cashflow::{CashFlowLedger, CashFlowRequest, EntryId, RequestKind, ScheduleError};
use crate::health::{HealthMetrics, HealthMetricsEvaluator, TierBreakdown};
use crate::loader::PlannedFlow;
use crate::portfolio::{
    starting_cash, value_holdings, AccountFilter, ClientPortfolio, FundCatalog, HoldingKey, PortfolioError,
    ValuedHolding,
};
use crate::projection::{LiquidityProjector, ProjectionCache, ProjectionConfig, ProjectionResult};
use crate::rules::{validate_redemption, BlockReason, RedemptionRule, RedemptionRuleResolver, SettlementTable, Verdict};

/// Tolerance when comparing a redemption against the holding's value
const AMOUNT_EPSILON: f64 = 1e-6;

/// Errors raised while planning
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("no holding with key `{0}`")]
    UnknownHolding(HoldingKey),

    #[error("redemption on {date} is blocked: {reason}")]
    Blocked { date: NaiveDate, reason: BlockReason },

    #[error("redemption of {requested:.2} exceeds available holding value {available:.2}")]
    ExceedsHoldingValue { requested: f64, available: f64 },

    #[error("request does not redeem a holding")]
    NotARedemption,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
}

/// Output of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct LiquidityReport {
    pub tiers: TierBreakdown,
    pub series: ProjectionResult,
    pub metrics: HealthMetrics,
}

/// Planning session over one portfolio snapshot
#[derive(Debug, Clone)]
pub struct LiquidityPlanner {
    portfolio: ClientPortfolio,
    catalog: FundCatalog,
    resolver: RedemptionRuleResolver,
    config: ProjectionConfig,
    filter: AccountFilter,
}

impl LiquidityPlanner {
    /// Create a planner with the default settlement table over all accounts
    pub fn new(portfolio: ClientPortfolio, catalog: FundCatalog, config: ProjectionConfig) -> Self {
        Self {
            portfolio,
            catalog,
            resolver: RedemptionRuleResolver::default(),
            config,
            filter: AccountFilter::All,
        }
    }

    pub fn with_settlement_table(mut self, table: SettlementTable) -> Self {
        self.resolver = RedemptionRuleResolver::new(table);
        self
    }

    pub fn with_account_filter(mut self, filter: AccountFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Swap in an updated portfolio snapshot
    pub fn with_portfolio(mut self, portfolio: ClientPortfolio) -> Self {
        self.portfolio = portfolio;
        self
    }

    pub fn portfolio(&self) -> &ClientPortfolio {
        &self.portfolio
    }

    pub fn catalog(&self) -> &FundCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn account_filter(&self) -> &AccountFilter {
        &self.filter
    }

    /// Updated snapshot with one holding's rule replaced; the caller persists it
    pub fn update_holding_rule(
        &self,
        account_id: &str,
        holding_index: usize,
        rule: Option<RedemptionRule>,
    ) -> Result<ClientPortfolio, PlanError> {
        Ok(self.portfolio.update_holding_rule(account_id, holding_index, rule)?)
    }

    /// Updated snapshot with one account's cash balance replaced
    pub fn update_cash_balance(&self, account_id: &str, cash_balance: f64) -> Result<ClientPortfolio, PlanError> {
        Ok(self.portfolio.update_cash_balance(account_id, cash_balance)?)
    }

    /// Holdings of the selected accounts, marked to value
    pub fn valued_holdings(&self) -> Vec<ValuedHolding> {
        value_holdings(&self.portfolio, &self.catalog, &self.filter)
    }

    pub fn starting_cash(&self) -> f64 {
        starting_cash(&self.portfolio, &self.filter)
    }

    pub fn tier_breakdown(&self) -> TierBreakdown {
        TierBreakdown::compute(
            self.config.today,
            &self.resolver,
            self.starting_cash(),
            &self.valued_holdings(),
        )
    }

    pub fn projector(&self) -> LiquidityProjector {
        LiquidityProjector::new(self.resolver.clone(), self.config.clone())
    }

    /// Build a redemption request with the holding's settlement delay filled in
    pub fn redemption_request(
        &self,
        holding_key: &HoldingKey,
        date: NaiveDate,
        amount: f64,
        description: impl Into<String>,
    ) -> Result<CashFlowRequest, PlanError> {
        let valued = self.find_valued(holding_key)?;
        let settlement_days = self.resolver.settlement_days(&valued.holding, valued.fund_type);
        Ok(CashFlowRequest::redemption(
            date,
            amount,
            description,
            holding_key.clone(),
            settlement_days,
        ))
    }

    /// Validate a redemption request and add its entries to the ledger.
    ///
    /// Every occurrence's initiation date must pass the validator and the
    /// total must fit in what is left of the holding after redemptions
    /// already in the ledger. A rejected request adds nothing.
    pub fn plan_redemption(
        &self,
        ledger: &mut CashFlowLedger,
        mut request: CashFlowRequest,
    ) -> Result<Vec<EntryId>, PlanError> {
        let holding_key = request.holding_key().cloned().ok_or(PlanError::NotARedemption)?;
        let valued = self.find_valued(&holding_key)?;
        request.check()?;

        for date in request.initiation_dates() {
            if let Verdict::Blocked(reason) = validate_redemption(date, &valued.holding) {
                info!("Redemption of {} on {} blocked: {}", holding_key, date, reason);
                return Err(PlanError::Blocked { date, reason });
            }
        }

        let requested = request.total_amount();
        let available = (valued.value - ledger.redeemed_total(&holding_key)).max(0.0);
        if requested > available + AMOUNT_EPSILON {
            return Err(PlanError::ExceedsHoldingValue { requested, available });
        }

        // Settlement always follows the holding's own rule
        request.kind = RequestKind::Redemption {
            settlement_days: self.resolver.settlement_days(&valued.holding, valued.fund_type),
            holding_key,
        };
        Ok(ledger.add(request)?)
    }

    /// Add a flow from a plan file: redemptions go through the validator
    pub fn plan_flow(&self, ledger: &mut CashFlowLedger, flow: &PlannedFlow) -> Result<Vec<EntryId>, PlanError> {
        match &flow.holding_key {
            Some(key) => {
                let mut request = self.redemption_request(key, flow.date, flow.amount, flow.description.clone())?;
                request.direction = flow.direction;
                request.recurrence = flow.recurrence;
                self.plan_redemption(ledger, request)
            }
            None => Ok(ledger.add(flow.to_plain_request())?),
        }
    }

    /// Run valuation, projection and health metrics against a ledger
    pub fn run(&self, ledger: &CashFlowLedger, monthly_expense_baseline: f64) -> LiquidityReport {
        let holdings = self.valued_holdings();
        let cash = self.starting_cash();
        let series = self.projector().project(cash, &holdings, ledger);
        self.report(cash, &holdings, series, monthly_expense_baseline)
    }

    /// Same as [`run`](Self::run), reusing a cached projection when the inputs are unchanged
    pub fn run_cached(
        &self,
        cache: &mut ProjectionCache,
        ledger: &CashFlowLedger,
        monthly_expense_baseline: f64,
    ) -> LiquidityReport {
        let holdings = self.valued_holdings();
        let cash = self.starting_cash();
        let series = cache.get_or_project(&self.projector(), cash, &holdings, ledger);
        self.report(cash, &holdings, series, monthly_expense_baseline)
    }

    fn report(
        &self,
        cash: f64,
        holdings: &[ValuedHolding],
        series: ProjectionResult,
        monthly_expense_baseline: f64,
    ) -> LiquidityReport {
        let tiers = TierBreakdown::compute(self.config.today, &self.resolver, cash, holdings);
        let metrics = HealthMetricsEvaluator::new(&tiers).evaluate(&series.points, monthly_expense_baseline);
        debug!(
            "Report: {} points, survival {}, {} low-liquidity ranges",
            series.points.len(),
            metrics.survival_months,
            metrics.low_liquidity_ranges.len()
        );
        LiquidityReport { tiers, series, metrics }
    }

    /// Value a holding regardless of the account filter
    fn find_valued(&self, key: &HoldingKey) -> Result<ValuedHolding, PlanError> {
        value_holdings(&self.portfolio, &self.catalog, &AccountFilter::All)
            .into_iter()
            .find(|v| v.key == *key)
            .ok_or_else(|| PlanError::UnknownHolding(key.clone()))
    }
}
