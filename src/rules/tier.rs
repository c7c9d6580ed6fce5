//! Fund types, liquidity tiers, and the default settlement table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset class of a fund, used to derive its liquidity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundType {
    /// Broad market index ETF
    BroadMarket,
    /// Sector / thematic ETF
    Sector,
    /// Strategy ETF
    Strategy,
    /// Cross-border (QDII) ETF
    CrossBorder,
    /// Bond ETF
    Bond,
}

impl FundType {
    /// Parse the catalog representation (e.g. `BROAD_MARKET`)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BROAD_MARKET" => Some(FundType::BroadMarket),
            "SECTOR" => Some(FundType::Sector),
            "STRATEGY" => Some(FundType::Strategy),
            "CROSS_BORDER" => Some(FundType::CrossBorder),
            "BOND" => Some(FundType::Bond),
            _ => None,
        }
    }
}

/// Coarse liquidity classification used when a holding has no explicit rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquidityTier {
    Cash,
    High,
    Medium,
    Low,
}

impl LiquidityTier {
    pub const ALL: [LiquidityTier; 4] = [
        LiquidityTier::Cash,
        LiquidityTier::High,
        LiquidityTier::Medium,
        LiquidityTier::Low,
    ];

    /// Tier for an asset type; unknown types are treated as medium liquidity
    pub fn for_fund_type(fund_type: Option<FundType>) -> Self {
        match fund_type {
            Some(FundType::BroadMarket) | Some(FundType::Bond) => LiquidityTier::High,
            Some(FundType::Sector) | Some(FundType::Strategy) => LiquidityTier::Medium,
            Some(FundType::CrossBorder) => LiquidityTier::Low,
            None => LiquidityTier::Medium,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CASH" => Some(LiquidityTier::Cash),
            "HIGH" => Some(LiquidityTier::High),
            "MEDIUM" => Some(LiquidityTier::Medium),
            "LOW" => Some(LiquidityTier::Low),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            LiquidityTier::Cash => 0,
            LiquidityTier::High => 1,
            LiquidityTier::Medium => 2,
            LiquidityTier::Low => 3,
        }
    }
}

impl fmt::Display for LiquidityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LiquidityTier::Cash => "CASH",
            LiquidityTier::High => "HIGH",
            LiquidityTier::Medium => "MEDIUM",
            LiquidityTier::Low => "LOW",
        };
        f.pad(label)
    }
}

/// Default settlement days (T+N) per liquidity tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTable {
    /// Settlement days indexed by tier (cash, high, medium, low)
    days: [u32; 4],
}

impl SettlementTable {
    /// Create from loaded (tier, days) pairs; tiers not listed keep their default
    pub fn from_loaded(rows: &[(LiquidityTier, u32)]) -> Self {
        let mut table = Self::default();
        for &(tier, days) in rows {
            table.days[tier.index()] = days;
        }
        table
    }

    /// Settlement days for a tier
    pub fn settlement_days(&self, tier: LiquidityTier) -> u32 {
        self.days[tier.index()]
    }

    /// Settlement days for an asset type (via its tier)
    pub fn days_for_type(&self, fund_type: Option<FundType>) -> u32 {
        self.settlement_days(LiquidityTier::for_fund_type(fund_type))
    }
}

impl Default for SettlementTable {
    fn default() -> Self {
        Self {
            // Cross-border (QDII) funds settle slowest
            days: [0, 1, 3, 5],
        }
    }
}
