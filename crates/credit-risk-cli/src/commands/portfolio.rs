use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use credit_risk_core::collections::{CollectionsAccount, CollectionsStage};
use credit_risk_core::portfolio::{AccountFilter, PortfolioSnapshot};
use credit_risk_core::repository::{InMemoryRepository, RepositoryGateway};
use credit_risk_core::scoring::{CreditScore, FinancialProfile};
use credit_risk_core::service::RiskService;
use credit_risk_core::types::with_metadata;
use credit_risk_core::{CreditRiskResult, RiskConfig};

use crate::input;

/// Arguments for portfolio aggregation
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON book: {"accounts": [...], "scores": [...], "profiles": [...]}
    #[arg(long)]
    pub input: Option<String>,

    /// Keep only these stages (comma-separated, e.g. "late,legal")
    #[arg(long, value_delimiter = ',')]
    pub stage: Option<Vec<CollectionsStage>>,

    /// Minimum outstanding amount
    #[arg(long)]
    pub min_amount: Option<Decimal>,

    /// Minimum days overdue
    #[arg(long)]
    pub min_days: Option<u32>,

    /// Drop cured and written-off accounts
    #[arg(long)]
    pub active_only: bool,

    /// Timestamp for scores computed from profiles (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Everything needed to build a snapshot. Profiles are scored on load;
/// precomputed scores are taken as given.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PortfolioBook {
    pub accounts: Vec<CollectionsAccount>,
    pub scores: Vec<CreditScore>,
    pub profiles: Vec<FinancialProfile>,
}

pub fn run_portfolio(
    args: PortfolioArgs,
    config: &RiskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let book: PortfolioBook = input::read_document(args.input.as_deref(), "portfolio book")?;
    let filter = AccountFilter {
        stages: args.stage,
        min_outstanding: args.min_amount,
        min_days_overdue: args.min_days,
        active_only: args.active_only,
    };
    let now = args.at.unwrap_or_else(Utc::now);

    let start = std::time::Instant::now();
    let snapshot = snapshot_book(book, config, &filter, now)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let mut warnings = Vec::new();
    if snapshot.overview.unscored_accounts > 0 {
        warnings.push(format!(
            "{} account(s) belong to customers without a score",
            snapshot.overview.unscored_accounts
        ));
    }
    let output = with_metadata(
        "Latest score per customer joined to accounts; bands, stages and days-overdue x amount heatmap",
        &serde_json::json!({ "portfolio": &config.portfolio, "filter": &filter }),
        warnings,
        elapsed,
        snapshot,
    );
    Ok(serde_json::to_value(output)?)
}

/// Load the book into an in-memory repository and aggregate it.
pub fn snapshot_book(
    book: PortfolioBook,
    config: &RiskConfig,
    filter: &AccountFilter,
    now: DateTime<Utc>,
) -> CreditRiskResult<PortfolioSnapshot> {
    let service = RiskService::new(InMemoryRepository::new(), config.clone())?;

    for mut account in book.accounts {
        account.revision = 0;
        service.open_account(account)?;
    }

    // Replay precomputed scores oldest first so stored versions keep their order.
    let mut scores = book.scores;
    scores.sort_by(|a, b| {
        (a.customer_id.as_str(), a.version, a.computed_at)
            .cmp(&(b.customer_id.as_str(), b.version, b.computed_at))
    });
    for score in scores {
        service.repository().put_score(score)?;
    }

    let mut customers = BTreeSet::new();
    for profile in book.profiles {
        customers.insert(profile.customer_id.clone());
        service.submit_profile(profile)?;
    }
    for customer in &customers {
        service.score_customer(customer, now)?;
    }

    service.portfolio_snapshot_filtered(filter)
}
