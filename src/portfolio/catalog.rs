//! Fund catalog used to price internal holdings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rules::FundType;

/// A fund available on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub id: String,
    pub code: String,
    pub name: String,
    pub manager: String,
    pub fund_type: FundType,
    /// Latest net asset value per share
    pub nav: f64,
}

/// Lookup of funds by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundCatalog {
    funds: BTreeMap<String, Fund>,
}

impl FundCatalog {
    pub fn from_funds(funds: impl IntoIterator<Item = Fund>) -> Self {
        Self {
            funds: funds.into_iter().map(|f| (f.id.clone(), f)).collect(),
        }
    }

    pub fn get(&self, fund_id: &str) -> Option<&Fund> {
        self.funds.get(fund_id)
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}
