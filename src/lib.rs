//! Liquidity Engine - availability and projection engine for advisory portfolios
//!
//! This library provides:
//! - Redemption rule modeling (daily, monthly open-day, fixed-term, lock-ups)
//! - Availability date resolution and redemption validation
//! - Cash-flow planning with recurring and redemption-linked entries
//! - Day-by-day projection of liquid vs. locked capital
//! - Liquidity health metrics (survival months, minimum balance, low ranges)

pub mod calendar;
pub mod portfolio;
pub mod rules;
pub mod cashflow;
pub mod projection;
pub mod health;
pub mod loader;
pub mod planner;

// Re-export commonly used types
pub use portfolio::{ClientPortfolio, Account, Holding, HoldingKey, FundCatalog, ValuedHolding, AccountFilter};
pub use rules::{RedemptionRule, RedemptionRuleResolver, SettlementTable, LiquidityTier, FundType, Verdict};
pub use cashflow::{CashFlowEntry, CashFlowLedger, CashFlowRequest, Direction, Frequency};
pub use projection::{LiquidityProjector, ProjectionConfig, ProjectionPoint, ProjectionResult};
pub use health::{HealthMetrics, HealthMetricsEvaluator, SurvivalMonths, TierBreakdown};
pub use planner::{LiquidityPlanner, LiquidityReport, PlanError};
