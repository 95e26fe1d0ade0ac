use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use credit_risk_core::config::BandThresholds;
use credit_risk_core::scoring::{self, FinancialProfile, RiskBand, RiskIndicators};
use credit_risk_core::types::with_metadata;
use credit_risk_core::RiskConfig;

use crate::input;

/// Arguments for scoring a financial profile
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to JSON profile (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Customer identifier
    #[arg(long)]
    pub customer_id: Option<String>,

    /// Average monthly income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Average monthly expenses
    #[arg(long)]
    pub expenses: Option<Decimal>,

    /// Average account balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Overdrafts over the lookback window
    #[arg(long)]
    pub overdrafts: Option<u32>,

    /// Missed payments over the lookback window
    #[arg(long)]
    pub missed_payments: Option<u32>,

    /// Total amount of missed payments
    #[arg(long)]
    pub missed_amount: Option<Decimal>,

    /// Debt-to-income ratio (0.2 = 20%)
    #[arg(long)]
    pub dti: Option<Decimal>,

    /// Returned direct debits / transfers
    #[arg(long, default_value = "0")]
    pub returned_payments: u32,

    /// Gambling transactions seen on statements
    #[arg(long)]
    pub gambling: bool,

    /// Income arrives irregularly
    #[arg(long)]
    pub irregular_income: bool,

    /// Scoring timestamp (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Arguments for band classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Credit score to classify
    #[arg(long, allow_hyphen_values = true)]
    pub score: i64,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    score: i64,
    band: RiskBand,
    thresholds: BandThresholds,
}

pub fn run_score(args: ScoreArgs, config: &RiskConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let computed_at = args.at.unwrap_or_else(Utc::now);
    let profile: FinancialProfile = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        // Missing figures stay `None`; the engine reports which one.
        FinancialProfile {
            customer_id: args
                .customer_id
                .ok_or("--customer-id is required (or provide --input)")?,
            version: 0,
            as_of: computed_at,
            lookback_months: 6,
            monthly_income: args.income,
            monthly_expenses: args.expenses,
            average_balance: args.balance,
            overdraft_count: args.overdrafts,
            missed_payment_count: args.missed_payments,
            missed_payment_amount: args.missed_amount,
            debt_to_income: args.dti,
            risk_indicators: RiskIndicators {
                returned_payments: args.returned_payments,
                gambling_transactions: args.gambling,
                irregular_income: args.irregular_income,
            },
        }
    };

    let start = std::time::Instant::now();
    let score = scoring::compute_score(&profile, config, computed_at)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let mut warnings = Vec::new();
    if profile.risk_indicators.gambling_transactions {
        warnings.push("Gambling transactions present on statements".to_string());
    }
    if profile.risk_indicators.irregular_income {
        warnings.push("Income arrives irregularly".to_string());
    }

    let output = with_metadata(
        "Weighted behavioural sub-scores mapped linearly onto 300-850",
        &config.scoring,
        warnings,
        elapsed,
        score,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_classify(
    args: ClassifyArgs,
    config: &RiskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let band = scoring::checked_classify(args.score, &config.bands)?;
    let output = with_metadata(
        "Inclusive lower-bound band thresholds",
        &config.bands,
        Vec::new(),
        0,
        ClassifyOutput {
            score: args.score,
            band,
            thresholds: config.bands.clone(),
        },
    );
    Ok(serde_json::to_value(output)?)
}
