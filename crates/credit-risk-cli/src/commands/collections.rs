use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use credit_risk_core::collections::{self, CollectionsAccount, CollectionsStage};
use credit_risk_core::types::with_metadata;
use credit_risk_core::RiskConfig;

use crate::input;

/// Arguments for an evaluation tick
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON account (or pipe it on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Current days overdue
    #[arg(long)]
    pub days: u32,

    /// Event timestamp (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Arguments for applying a payment
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to JSON account (or pipe it on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount paid
    #[arg(long, allow_hyphen_values = true)]
    pub amount: Decimal,

    /// Event timestamp (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Arguments for an explicit stage change
#[derive(Args)]
pub struct TransitionArgs {
    /// Path to JSON account (or pipe it on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Requested stage: written-off or cured
    #[arg(long)]
    pub to: CollectionsStage,

    /// Reason recorded on the transition
    #[arg(long)]
    pub reason: String,

    /// Event timestamp (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Arguments for listing the playbook
#[derive(Args)]
pub struct StageActionsArgs {
    /// Only this stage
    #[arg(long)]
    pub stage: Option<CollectionsStage>,
}

#[derive(Debug, Serialize)]
struct StageActions {
    stage: CollectionsStage,
    terminal: bool,
    actions: &'static [&'static str],
}

pub fn run_evaluate(
    args: EvaluateArgs,
    config: &RiskConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let account: CollectionsAccount = input::read_document(args.input.as_deref(), "account")?;
    let now = args.at.unwrap_or_else(Utc::now);

    let start = std::time::Instant::now();
    let next = collections::evaluate(&account, args.days, &config.collections, now)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let mut warnings = Vec::new();
    if account.stage.is_terminal() {
        warnings.push(format!(
            "Account is {}; evaluation left it unchanged",
            account.stage
        ));
    }
    let output = with_metadata(
        "Day-count escalation with cure on zero balance",
        &config.collections,
        warnings,
        elapsed,
        next,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let account: CollectionsAccount = input::read_document(args.input.as_deref(), "account")?;
    let now = args.at.unwrap_or_else(Utc::now);

    let start = std::time::Instant::now();
    let next = collections::apply_payment(&account, args.amount, now)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Payment reduces outstanding; full settlement cures",
        &serde_json::json!({ "amount": args.amount }),
        Vec::new(),
        elapsed,
        next,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_transition(args: TransitionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let account: CollectionsAccount = input::read_document(args.input.as_deref(), "account")?;
    let now = args.at.unwrap_or_else(Utc::now);

    let start = std::time::Instant::now();
    let next = collections::request_transition(&account, args.to, &args.reason, now)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Explicit transition: Legal to Written Off, or cure of a settled account",
        &serde_json::json!({ "to": args.to, "reason": args.reason }),
        Vec::new(),
        elapsed,
        next,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_stage_actions(args: StageActionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stages: Vec<CollectionsStage> = match args.stage {
        Some(stage) => vec![stage],
        None => CollectionsStage::ALL.to_vec(),
    };
    let playbook: Vec<StageActions> = stages
        .into_iter()
        .map(|stage| StageActions {
            stage,
            terminal: stage.is_terminal(),
            actions: stage.recommended_actions(),
        })
        .collect();
    Ok(serde_json::to_value(playbook)?)
}
