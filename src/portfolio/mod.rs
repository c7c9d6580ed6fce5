//! Portfolio snapshot, fund catalog, and holding valuation

mod data;
mod catalog;
mod valuation;

pub use data::{ClientPortfolio, Account, AccountType, Holding, AssetRef, ExternalAsset, HoldingKey, PortfolioError};
pub use catalog::{Fund, FundCatalog};
pub use valuation::{ValuedHolding, AccountFilter, value_holdings, starting_cash};
