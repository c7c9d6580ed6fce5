//! Redemption rules, liquidity tiers, and the rule engine built on them

mod redemption;
mod tier;
mod resolver;
mod validator;

pub use redemption::{RedemptionRule, RuleType, RuleSpec, RuleError};
pub use tier::{FundType, LiquidityTier, SettlementTable};
pub use resolver::{RedemptionRuleResolver, resolve_rule};
pub use validator::{validate_redemption, Verdict, BlockReason};
