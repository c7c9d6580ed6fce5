//! Portfolio data structures matching the dashboard's portfolio format

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::rules::{FundType, RedemptionRule, RuleError};

/// Errors raised when editing a portfolio snapshot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("unknown account `{0}`")]
    UnknownAccount(String),

    #[error("account `{account_id}` has no holding at index {index}")]
    HoldingIndexOutOfRange { account_id: String, index: usize },

    #[error("invalid redemption rule: {0}")]
    InvalidRule(#[from] RuleError),

    #[error("cash balance must be non-negative and finite, got {0}")]
    InvalidCashBalance(f64),
}

/// Kind of client account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Personal self-directed account
    Personal,
    /// Family trust account
    FamilyTrust,
}

/// Asset held outside the fund catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAsset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_type: Option<FundType>,
    pub nav: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_date: Option<NaiveDate>,
}

/// What a holding points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetRef {
    /// Fund in the catalog, priced from its NAV
    Internal {
        #[serde(rename = "fundId")]
        fund_id: String,
    },
    /// Externally priced asset
    External { external: ExternalAsset },
}

/// A position in one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(flatten)]
    pub asset: AssetRef,

    /// Quantity owned
    pub shares: f64,

    /// Per-share cost basis
    pub avg_cost: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redemption_rule: Option<RedemptionRule>,
}

impl Holding {
    pub fn internal(fund_id: impl Into<String>, shares: f64, avg_cost: f64) -> Self {
        Self {
            asset: AssetRef::Internal { fund_id: fund_id.into() },
            shares,
            avg_cost,
            redemption_rule: None,
        }
    }

    pub fn external(
        name: impl Into<String>,
        fund_type: Option<FundType>,
        nav: f64,
        shares: f64,
        avg_cost: f64,
    ) -> Self {
        Self {
            asset: AssetRef::External {
                external: ExternalAsset {
                    name: name.into(),
                    fund_type,
                    nav,
                    nav_date: None,
                },
            },
            shares,
            avg_cost,
            redemption_rule: None,
        }
    }

    pub fn with_rule(mut self, rule: RedemptionRule) -> Self {
        self.redemption_rule = Some(rule);
        self
    }

    pub fn fund_id(&self) -> Option<&str> {
        match &self.asset {
            AssetRef::Internal { fund_id } => Some(fund_id),
            AssetRef::External { .. } => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.asset, AssetRef::External { .. })
    }

    /// Total cost basis
    pub fn cost_basis(&self) -> f64 {
        self.shares * self.avg_cost
    }

    /// Unrealized P&L in percent at the given NAV; `None` when the cost basis is zero
    pub fn pnl_percent(&self, nav: f64) -> Option<f64> {
        let cost = self.cost_basis();
        if cost <= 0.0 || !cost.is_finite() {
            return None;
        }
        Some((self.shares * nav - cost) / cost * 100.0)
    }
}

/// Stable identity of a holding across projection runs: `{account_id}#{index}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldingKey(String);

impl HoldingKey {
    pub fn new(account_id: &str, index: usize) -> Self {
        HoldingKey(format!("{}#{}", account_id, index))
    }

    /// Split back into (account id, holding index)
    pub fn parts(&self) -> Option<(&str, usize)> {
        let (account_id, index) = self.0.rsplit_once('#')?;
        Some((account_id, index.parse().ok()?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HoldingKey {
    fn from(raw: &str) -> Self {
        HoldingKey(raw.to_string())
    }
}

impl fmt::Display for HoldingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A client account with cash and holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub cash_balance: f64,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

/// Full client portfolio snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPortfolio {
    pub id: String,
    pub client_name: String,
    pub accounts: Vec<Account>,
}

impl ClientPortfolio {
    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == account_id)
    }

    /// Look up a holding by its key
    pub fn holding(&self, key: &HoldingKey) -> Option<&Holding> {
        let (account_id, index) = key.parts()?;
        self.account(account_id)?.holdings.get(index)
    }

    /// Return a copy of the portfolio with one holding's rule replaced.
    ///
    /// The rule is validated before acceptance; the caller owns and persists
    /// the returned snapshot.
    pub fn update_holding_rule(
        &self,
        account_id: &str,
        holding_index: usize,
        rule: Option<RedemptionRule>,
    ) -> Result<ClientPortfolio, PortfolioError> {
        if let Some(rule) = &rule {
            rule.validate()?;
        }

        let mut updated = self.clone();
        let account = updated
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| PortfolioError::UnknownAccount(account_id.to_string()))?;
        let holding = account.holdings.get_mut(holding_index).ok_or_else(|| {
            PortfolioError::HoldingIndexOutOfRange {
                account_id: account_id.to_string(),
                index: holding_index,
            }
        })?;
        holding.redemption_rule = rule;
        Ok(updated)
    }

    /// Return a copy of the portfolio with one account's cash balance replaced
    pub fn update_cash_balance(&self, account_id: &str, cash_balance: f64) -> Result<ClientPortfolio, PortfolioError> {
        if !cash_balance.is_finite() || cash_balance < 0.0 {
            return Err(PortfolioError::InvalidCashBalance(cash_balance));
        }

        let mut updated = self.clone();
        let account = updated
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| PortfolioError::UnknownAccount(account_id.to_string()))?;
        account.cash_balance = cash_balance;
        Ok(updated)
    }
}
