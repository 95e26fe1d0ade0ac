mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::collections::{EvaluateArgs, PaymentArgs, StageActionsArgs, TransitionArgs};
use commands::portfolio::PortfolioArgs;
use commands::scoring::{ClassifyArgs, ScoreArgs};

/// Credit scoring, collections staging and portfolio risk views
#[derive(Parser)]
#[command(
    name = "crk",
    version,
    about = "Credit scoring, collections staging and portfolio risk views",
    long_about = "A CLI over the credit-risk core with decimal precision. Scores \
                  financial profiles, maps scores to risk bands, moves collections \
                  accounts through their stages and aggregates portfolio views."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON or YAML file overriding the risk constants
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a financial profile (300-850) with a factor breakdown
    Score(ScoreArgs),
    /// Map a credit score to its risk band
    Classify(ClassifyArgs),
    /// Run an evaluation tick on a collections account
    CollectionsEvaluate(EvaluateArgs),
    /// Apply a payment to a collections account
    CollectionsPayment(PaymentArgs),
    /// Request an explicit stage change (write-off, manual cure)
    CollectionsTransition(TransitionArgs),
    /// Aggregate accounts and scores into a portfolio snapshot
    Portfolio(PortfolioArgs),
    /// List the collections playbook per stage
    StageActions(StageActionsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Logs go to stderr so stdout stays machine readable. `RUST_LOG` overrides
/// the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match input::config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Score(args) => commands::scoring::run_score(args, &config),
        Commands::Classify(args) => commands::scoring::run_classify(args, &config),
        Commands::CollectionsEvaluate(args) => commands::collections::run_evaluate(args, &config),
        Commands::CollectionsPayment(args) => commands::collections::run_payment(args),
        Commands::CollectionsTransition(args) => commands::collections::run_transition(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args, &config),
        Commands::StageActions(args) => commands::collections::run_stage_actions(args),
        Commands::Version => {
            println!("crk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
