//! Mark holdings to value and attach the data the projection needs

use log::warn;
use serde::{Deserialize, Serialize};

use super::{Account, AssetRef, ClientPortfolio, FundCatalog, Holding, HoldingKey};
use crate::rules::{FundType, LiquidityTier};

/// Which accounts take part in a liquidity run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountFilter {
    #[default]
    All,
    Only(String),
}

impl AccountFilter {
    pub fn includes(&self, account: &Account) -> bool {
        match self {
            AccountFilter::All => true,
            AccountFilter::Only(id) => account.id == *id,
        }
    }
}

/// A holding marked to value, ready for projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuedHolding {
    pub key: HoldingKey,
    pub account_id: String,
    /// Display name (fund name or external asset name)
    pub name: String,
    pub holding: Holding,
    /// Market value: shares x NAV
    pub value: f64,
    /// Asset type used for the tier fallback when the holding has no rule
    pub fund_type: Option<FundType>,
    pub tier: LiquidityTier,
}

/// Value every holding of the selected accounts.
///
/// A holding that references a fund missing from the catalog is kept with
/// zero value so the rest of the run degrades gracefully.
pub fn value_holdings(
    portfolio: &ClientPortfolio,
    catalog: &FundCatalog,
    filter: &AccountFilter,
) -> Vec<ValuedHolding> {
    let mut valued = Vec::new();

    for account in portfolio.accounts.iter().filter(|a| filter.includes(a)) {
        for (index, holding) in account.holdings.iter().enumerate() {
            let key = HoldingKey::new(&account.id, index);
            let (name, nav, fund_type) = match &holding.asset {
                AssetRef::Internal { fund_id } => match catalog.get(fund_id) {
                    Some(fund) => (fund.name.clone(), fund.nav, Some(fund.fund_type)),
                    None => {
                        warn!("Holding {} references unknown fund `{}`; valuing at zero", key, fund_id);
                        (format!("Unknown fund {}", fund_id), 0.0, None)
                    }
                },
                // External assets without a declared type are treated as strategy products
                AssetRef::External { external } => (
                    external.name.clone(),
                    external.nav,
                    Some(external.fund_type.unwrap_or(FundType::Strategy)),
                ),
            };

            let mut value = holding.shares * nav;
            if !value.is_finite() || value < 0.0 {
                warn!("Holding {} has invalid value {}; valuing at zero", key, value);
                value = 0.0;
            }

            valued.push(ValuedHolding {
                key,
                account_id: account.id.clone(),
                name,
                holding: holding.clone(),
                value,
                fund_type,
                tier: LiquidityTier::for_fund_type(fund_type),
            });
        }
    }

    valued
}

/// Cash balance across the selected accounts
pub fn starting_cash(portfolio: &ClientPortfolio, filter: &AccountFilter) -> f64 {
    portfolio
        .accounts
        .iter()
        .filter(|a| filter.includes(a))
        .map(|a| a.cash_balance)
        .sum()
}
