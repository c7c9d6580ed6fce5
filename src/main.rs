//! Liquidity CLI
//!
//! Loads a portfolio snapshot, fund catalog and cash-flow plan, projects
//! liquid vs. locked capital day by day and reports liquidity health.
//!
//! ```bash
//! liquidity --today 2025-06-15 --horizon 30 --baseline 150000
//! RUST_LOG=debug liquidity --account acc-02 --output acc02.csv
//! ```

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};

use liquidity_engine::cashflow::CashFlowLedger;
use liquidity_engine::loader::{
    load_cash_flow_plan, load_fund_catalog, load_portfolio, load_settlement_table, DEFAULT_DATA_PATH,
};
use liquidity_engine::planner::{LiquidityPlanner, LiquidityReport};
use liquidity_engine::projection::{ProjectionConfig, DEFAULT_HORIZON_DAYS};
use liquidity_engine::{AccountFilter, LiquidityTier, SettlementTable, SurvivalMonths};

/// Liquidity availability and projection engine
#[derive(Parser)]
#[command(name = "liquidity")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Portfolio snapshot (JSON)
    #[arg(long)]
    portfolio: Option<PathBuf>,

    /// Fund catalog (CSV: id,code,name,manager,type,nav)
    #[arg(long)]
    funds: Option<PathBuf>,

    /// Cash-flow plan (CSV: date,amount,direction,description,frequency,count,holding_key)
    #[arg(long)]
    cashflows: Option<PathBuf>,

    /// Settlement-day overrides (CSV: tier,settlement_days)
    #[arg(long)]
    settlement: Option<PathBuf>,

    /// Projection start date (defaults to the local date)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Days to project
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    horizon: u32,

    /// Monthly expense baseline for survival months and low-liquidity ranges
    #[arg(long, default_value_t = 0.0)]
    baseline: f64,

    /// Restrict the run to one account
    #[arg(long)]
    account: Option<String>,

    /// Projection output (CSV)
    #[arg(short, long, default_value = "liquidity_projection.csv")]
    output: PathBuf,

    /// Print the full report as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

fn data_file(explicit: Option<PathBuf>, name: &str) -> PathBuf {
    explicit.unwrap_or_else(|| Path::new(DEFAULT_DATA_PATH).join(name))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let portfolio_path = data_file(cli.portfolio, "portfolio.json");
    let portfolio = load_portfolio(&portfolio_path)
        .with_context(|| format!("loading portfolio from {}", portfolio_path.display()))?;

    let funds_path = data_file(cli.funds, "funds.csv");
    let catalog = load_fund_catalog(&funds_path)
        .with_context(|| format!("loading fund catalog from {}", funds_path.display()))?;

    let settlement_path = data_file(cli.settlement, "settlement_days.csv");
    let table = if settlement_path.exists() {
        load_settlement_table(&settlement_path)
            .with_context(|| format!("loading settlement table from {}", settlement_path.display()))?
    } else {
        info!("No settlement table at {}; using defaults", settlement_path.display());
        SettlementTable::default()
    };

    let config = ProjectionConfig {
        today: cli.today.unwrap_or_else(|| Local::now().date_naive()),
        horizon_days: cli.horizon,
    };
    let filter = match cli.account {
        Some(id) => AccountFilter::Only(id),
        None => AccountFilter::All,
    };

    let planner = LiquidityPlanner::new(portfolio, catalog, config)
        .with_settlement_table(table)
        .with_account_filter(filter);

    let mut ledger = CashFlowLedger::new();
    let plan_path = data_file(cli.cashflows, "cashflows.csv");
    if plan_path.exists() {
        let flows = load_cash_flow_plan(&plan_path)
            .with_context(|| format!("loading cash-flow plan from {}", plan_path.display()))?;
        for flow in &flows {
            // A rejected flow is reported and skipped; the rest of the plan still runs
            if let Err(e) = planner.plan_flow(&mut ledger, flow) {
                warn!("Skipping `{}` on {}: {}", flow.description, flow.date, e);
            }
        }
        info!("Loaded {} planned flows into {} ledger entries", flows.len(), ledger.len());
    }

    let report = planner.run(&ledger, cli.baseline);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&planner, &report, cli.baseline);
    }

    write_projection(&cli.output, &report)
        .with_context(|| format!("writing projection to {}", cli.output.display()))?;
    if !cli.json {
        println!("\nFull projection written to: {}", cli.output.display());
    }

    Ok(())
}

fn print_summary(planner: &LiquidityPlanner, report: &LiquidityReport, baseline: f64) {
    let portfolio = planner.portfolio();
    println!("Liquidity Engine v{}", env!("CARGO_PKG_VERSION"));
    println!("========================\n");
    println!("Client: {} ({})", portfolio.client_name, portfolio.id);
    println!(
        "Window: {} + {} days\n",
        planner.config().today,
        planner.config().horizon_days
    );

    let tiers = &report.tiers;
    println!("Liquidity tiers:");
    for tier in LiquidityTier::ALL {
        println!("  {:<8} {:>16.2}", tier, tiers.tier_total(tier));
    }
    println!("  {:<8} {:>16.2}", "TOTAL", tiers.total);

    let buckets = &tiers.availability;
    println!("\nAvailable within:");
    println!("  T+0 {:>16.2}", buckets.t0);
    println!("  T+1 {:>16.2}", buckets.t1);
    println!("  T+3 {:>16.2}", buckets.t3);
    println!("  T+7 {:>16.2}", buckets.t7);

    println!("\n{:<12} {:>16} {:>16} {:>14}", "Date", "Liquid", "Locked", "Net flow");
    println!("{}", "-".repeat(61));
    for point in report.series.points.iter().take(14) {
        println!(
            "{:<12} {:>16.2} {:>16.2} {:>14.2}",
            point.date, point.liquid_amount, point.locked_amount, point.net_flow_that_day
        );
    }
    if report.series.points.len() > 14 {
        println!("... ({} more days)", report.series.points.len() - 14);
    }

    let metrics = &report.metrics;
    println!("\nHealth (baseline {:.2}/month):", baseline);
    match metrics.survival_months {
        SurvivalMonths::Months(m) => println!("  Survival: {:.1} months", m),
        SurvivalMonths::Unbounded => println!("  Survival: unbounded (no expense baseline)"),
    }
    match metrics.min_balance {
        Some(min) => println!("  Minimum liquid balance: {:.2}", min),
        None => println!("  Minimum liquid balance: n/a"),
    }
    if metrics.low_liquidity_ranges.is_empty() {
        println!("  Low-liquidity ranges: none");
    } else {
        println!("  Low-liquidity ranges:");
        for range in &metrics.low_liquidity_ranges {
            println!("    {} .. {} ({} days)", range.start, range.end, range.days());
        }
    }
}

fn write_projection(path: &Path, report: &LiquidityReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "liquid", "locked", "net_flow", "locked_detail"])?;

    for point in &report.series.points {
        let detail = point
            .locked_breakdown
            .iter()
            .map(|l| format!("{}: {:.2} [{}]", l.holding_name, l.value, l.reason))
            .collect::<Vec<_>>()
            .join("; ");
        writer.write_record([
            point.date.to_string(),
            format!("{:.2}", point.liquid_amount),
            format!("{:.2}", point.locked_amount),
            format!("{:.2}", point.net_flow_that_day),
            detail,
        ])?;
    }

    writer.flush()?;
    Ok(())
}
