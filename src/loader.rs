//! File loaders for portfolio snapshots, fund catalogs, settlement tables
//! and cash-flow plans
//!
//! Default files live under data/

use chrono::NaiveDate;
use csv::Reader;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::cashflow::{CashFlowRequest, Direction, Frequency, Recurrence, MAX_OCCURRENCES};
use crate::portfolio::{ClientPortfolio, Fund, FundCatalog, HoldingKey};
use crate::rules::{FundType, LiquidityTier, SettlementTable};

/// Default path to the data directory
pub const DEFAULT_DATA_PATH: &str = "data";

/// Errors raised while loading input files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {reason}")]
    Invalid { line: usize, reason: String },
}

impl LoadError {
    fn invalid(index: usize, reason: impl Into<String>) -> Self {
        // Header is line 1
        LoadError::Invalid {
            line: index + 2,
            reason: reason.into(),
        }
    }
}

/// Load a client portfolio snapshot from JSON
pub fn load_portfolio<P: AsRef<Path>>(path: P) -> Result<ClientPortfolio, LoadError> {
    load_portfolio_from_reader(File::open(path)?)
}

pub fn load_portfolio_from_reader<R: Read>(reader: R) -> Result<ClientPortfolio, LoadError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Raw CSV row of the fund catalog
#[derive(Debug, Deserialize)]
struct FundRow {
    id: String,
    code: String,
    name: String,
    manager: String,
    #[serde(rename = "type")]
    fund_type: String,
    nav: f64,
}

impl FundRow {
    fn to_fund(self, index: usize) -> Result<Fund, LoadError> {
        let fund_type = FundType::parse(&self.fund_type)
            .ok_or_else(|| LoadError::invalid(index, format!("unknown fund type `{}`", self.fund_type)))?;
        if !self.nav.is_finite() || self.nav < 0.0 {
            return Err(LoadError::invalid(index, format!("invalid NAV {}", self.nav)));
        }

        Ok(Fund {
            id: self.id,
            code: self.code,
            name: self.name,
            manager: self.manager,
            fund_type,
            nav: self.nav,
        })
    }
}

/// Load the fund catalog from CSV
pub fn load_fund_catalog<P: AsRef<Path>>(path: P) -> Result<FundCatalog, LoadError> {
    load_fund_catalog_from_reader(File::open(path)?)
}

pub fn load_fund_catalog_from_reader<R: Read>(reader: R) -> Result<FundCatalog, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut funds = Vec::new();

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row: FundRow = result?;
        funds.push(row.to_fund(index)?);
    }

    Ok(FundCatalog::from_funds(funds))
}

/// Load settlement-day overrides from CSV (`tier,settlement_days`)
pub fn load_settlement_table<P: AsRef<Path>>(path: P) -> Result<SettlementTable, LoadError> {
    load_settlement_table_from_reader(File::open(path)?)
}

pub fn load_settlement_table_from_reader<R: Read>(reader: R) -> Result<SettlementTable, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let tier = LiquidityTier::parse(&record[0])
            .ok_or_else(|| LoadError::invalid(index, format!("unknown tier `{}`", &record[0])))?;
        let days: u32 = record[1]
            .trim()
            .parse()
            .map_err(|_| LoadError::invalid(index, format!("invalid settlement days `{}`", &record[1])))?;
        rows.push((tier, days));
    }

    Ok(SettlementTable::from_loaded(&rows))
}

/// A planned cash flow read from a plan file
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFlow {
    pub date: NaiveDate,
    pub amount: f64,
    pub direction: Direction,
    pub description: String,
    pub recurrence: Option<Recurrence>,
    /// Present for redemptions of a holding
    pub holding_key: Option<HoldingKey>,
}

impl PlannedFlow {
    /// Plain request; redemptions need their settlement delay from the planner
    pub fn to_plain_request(&self) -> CashFlowRequest {
        let request = match self.direction {
            Direction::Inflow => CashFlowRequest::inflow(self.date, self.amount, self.description.clone()),
            Direction::Outflow => CashFlowRequest::outflow(self.date, self.amount, self.description.clone()),
        };
        match self.recurrence {
            Some(Recurrence { frequency, count }) => request.recurring(frequency, count),
            None => request,
        }
    }
}

/// Raw CSV row of a cash-flow plan
#[derive(Debug, Deserialize)]
struct PlanRow {
    date: NaiveDate,
    amount: f64,
    direction: String,
    description: String,
    #[serde(default)]
    frequency: Option<String>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    holding_key: Option<String>,
}

impl PlanRow {
    fn to_planned_flow(self, index: usize) -> Result<PlannedFlow, LoadError> {
        let direction = Direction::parse(&self.direction)
            .ok_or_else(|| LoadError::invalid(index, format!("unknown direction `{}`", self.direction)))?;

        let frequency = self.frequency.as_deref().map(str::trim).filter(|f| !f.is_empty());
        let recurrence = match frequency {
            None => None,
            Some(raw) => {
                let frequency = Frequency::parse(raw)
                    .ok_or_else(|| LoadError::invalid(index, format!("unknown frequency `{}`", raw)))?;
                let count = self
                    .count
                    .ok_or_else(|| LoadError::invalid(index, "recurring flow needs a count"))?;
                if count > MAX_OCCURRENCES {
                    return Err(LoadError::invalid(
                        index,
                        format!("count {} exceeds the limit of {}", count, MAX_OCCURRENCES),
                    ));
                }
                Some(Recurrence { frequency, count })
            }
        };

        let holding_key = self
            .holding_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(HoldingKey::from);
        if let Some(key) = &holding_key {
            if key.parts().is_none() {
                return Err(LoadError::invalid(index, format!("malformed holding key `{}`", key)));
            }
        }

        Ok(PlannedFlow {
            date: self.date,
            amount: self.amount,
            direction,
            description: self.description,
            recurrence,
            holding_key,
        })
    }
}

/// Load a cash-flow plan from CSV
pub fn load_cash_flow_plan<P: AsRef<Path>>(path: P) -> Result<Vec<PlannedFlow>, LoadError> {
    load_cash_flow_plan_from_reader(File::open(path)?)
}

pub fn load_cash_flow_plan_from_reader<R: Read>(reader: R) -> Result<Vec<PlannedFlow>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut flows = Vec::new();

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row: PlanRow = result?;
        flows.push(row.to_planned_flow(index)?);
    }

    Ok(flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RedemptionRule;

    const FUNDS: &str = "\
id,code,name,manager,type,nav
1,510300,CSI 300 ETF,Liu Jun,BROAD_MARKET,4.023
3,588000,STAR 50 ETF,Zhang Tao,SECTOR,0.892
10,513180,Hang Seng Tech ETF,Xu Meng,CROSS_BORDER,0.650
";

    #[test]
    fn test_load_default_data() {
        let data = Path::new(DEFAULT_DATA_PATH);
        let portfolio = load_portfolio(data.join("portfolio.json")).expect("Failed to load portfolio");
        assert_eq!(portfolio.accounts.len(), 3);
        assert_eq!(portfolio.accounts[1].cash_balance, 2_000_000.0);

        let catalog = load_fund_catalog(data.join("funds.csv")).expect("Failed to load funds");
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.get("demo-1").map(|f| f.fund_type), Some(FundType::Strategy));

        let flows = load_cash_flow_plan(data.join("cashflows.csv")).expect("Failed to load plan");
        assert_eq!(flows.len(), 4);

        let table = load_settlement_table(data.join("settlement_days.csv")).expect("Failed to load table");
        assert_eq!(table, SettlementTable::default());
    }

    #[test]
    fn test_load_fund_catalog() {
        let catalog = load_fund_catalog_from_reader(FUNDS.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        let fund = catalog.get("10").unwrap();
        assert_eq!(fund.fund_type, FundType::CrossBorder);
        assert_eq!(fund.code, "513180");
    }

    #[test]
    fn test_unknown_fund_type_reports_line() {
        let data = "id,code,name,manager,type,nav\n1,X,Name,M,BROAD_MARKET,1.0\n2,Y,Name,M,CRYPTO,1.0\n";
        match load_fund_catalog_from_reader(data.as_bytes()) {
            Err(LoadError::Invalid { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected invalid row, got {:?}", other),
        }
    }

    #[test]
    fn test_load_settlement_table() {
        let data = "tier,settlement_days\nLOW,7\nHIGH,2\n";
        let table = load_settlement_table_from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.settlement_days(LiquidityTier::Low), 7);
        assert_eq!(table.settlement_days(LiquidityTier::High), 2);
        assert_eq!(table.settlement_days(LiquidityTier::Medium), 3);
    }

    #[test]
    fn test_load_cash_flow_plan() {
        let data = "\
date,amount,direction,description,frequency,count,holding_key
2025-06-20,500000,INFLOW,Quarterly dividend,QUARTERLY,4,
2025-06-25,200000,OUTFLOW,Trust management fee,,,
2025-07-10,100000,INFLOW,Redeem CSI 300,,,acc-01#0
";
        let flows = load_cash_flow_plan_from_reader(data.as_bytes()).unwrap();
        assert_eq!(flows.len(), 3);
        assert_eq!(
            flows[0].recurrence,
            Some(Recurrence { frequency: Frequency::Quarterly, count: 4 })
        );
        assert_eq!(flows[1].direction, Direction::Outflow);
        assert_eq!(flows[1].recurrence, None);
        assert_eq!(flows[2].holding_key, Some(HoldingKey::new("acc-01", 0)));

        let request = flows[0].to_plain_request();
        assert_eq!(request.initiation_dates().len(), 4);
    }

    #[test]
    fn test_recurring_flow_without_count_rejected() {
        let data = "date,amount,direction,description,frequency,count,holding_key\n2025-06-20,1,INFLOW,x,MONTHLY,,\n";
        assert!(matches!(
            load_cash_flow_plan_from_reader(data.as_bytes()),
            Err(LoadError::Invalid { line: 2, .. })
        ));
    }

    #[test]
    fn test_recurring_flow_count_capped() {
        let data = "date,amount,direction,description,frequency,count,holding_key\n\
                    2025-06-20,1,INFLOW,ok,MONTHLY,1200,\n\
                    2025-06-20,1,INFLOW,too many,YEARLY,4294967295,\n";
        match load_cash_flow_plan_from_reader(data.as_bytes()) {
            Err(LoadError::Invalid { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("4294967295"));
            }
            other => panic!("expected an invalid row, got {:?}", other),
        }
    }

    #[test]
    fn test_load_portfolio_json() {
        let json = r#"{
            "id": "client-001",
            "clientName": "Zhang Wei",
            "accounts": [{
                "id": "acc-01",
                "name": "Personal",
                "type": "PERSONAL",
                "cashBalance": 500000,
                "holdings": [
                    {"fundId": "1", "shares": 50000, "avgCost": 3.65},
                    {"fundId": "3", "shares": 100000, "avgCost": 1.10,
                     "redemptionRule": {"ruleType": "MONTHLY", "openDay": 15, "settlementDays": 3}}
                ]
            }]
        }"#;
        let portfolio = load_portfolio_from_reader(json.as_bytes()).unwrap();
        let holding = portfolio.holding(&HoldingKey::new("acc-01", 1)).unwrap();
        assert_eq!(holding.redemption_rule, Some(RedemptionRule::monthly(15, 3).unwrap()));
    }

    #[test]
    fn test_malformed_rule_rejected() {
        let json = r#"{
            "id": "c", "clientName": "n",
            "accounts": [{"id": "a", "name": "n", "type": "PERSONAL", "cashBalance": 0,
                "holdings": [{"fundId": "1", "shares": 1, "avgCost": 1,
                    "redemptionRule": {"ruleType": "MONTHLY", "settlementDays": 3}}]}]
        }"#;
        assert!(matches!(load_portfolio_from_reader(json.as_bytes()), Err(LoadError::Json(_))));
    }
}
