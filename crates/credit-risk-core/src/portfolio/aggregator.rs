//! Portfolio snapshot: risk-band and collections-stage summaries, the
//! overdue × outstanding heatmap, and headline overview metrics.
//!
//! Pure and recomputed on every call from the records passed in. Callers
//! hand over a point-in-time copy of accounts and scores; nothing here keeps
//! state between calls, so two calls on the same input return equal
//! snapshots.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::filter::AccountFilter;
use super::heatmap::{build_heatmap, Heatmap};
use crate::collections::{CollectionsAccount, CollectionsStage};
use crate::config::RiskConfig;
use crate::scoring::{classify_with, CreditScore, RiskBand};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSummary {
    pub band: RiskBand,
    /// Customers whose latest score falls in the band.
    pub scored_customers: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<Decimal>,
    /// Collections accounts belonging to those customers.
    pub accounts: u64,
    pub outstanding: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: CollectionsStage,
    pub accounts: u64,
    pub outstanding: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub total_accounts: u64,
    pub active_accounts: u64,
    pub total_outstanding: Money,
    pub average_days_overdue: Decimal,
    /// Accounts beyond the configured high-risk day count.
    pub high_risk_accounts: u64,
    /// Accounts whose customer has no score on record.
    pub unscored_accounts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub by_band: Vec<BandSummary>,
    pub by_stage: Vec<StageSummary>,
    pub heatmap: Heatmap,
    pub overview: PortfolioOverview,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Aggregate with the default risk constants.
pub fn aggregate(accounts: &[CollectionsAccount], scores: &[CreditScore]) -> PortfolioSnapshot {
    aggregate_with(accounts, scores, &RiskConfig::default())
}

/// Aggregate only the accounts the filter keeps.
pub fn aggregate_filtered(
    accounts: &[CollectionsAccount],
    scores: &[CreditScore],
    filter: &AccountFilter,
    config: &RiskConfig,
) -> PortfolioSnapshot {
    aggregate_with(&filter.apply(accounts), scores, config)
}

pub fn aggregate_with(
    accounts: &[CollectionsAccount],
    scores: &[CreditScore],
    config: &RiskConfig,
) -> PortfolioSnapshot {
    let latest = latest_scores(scores);

    // Bands are rederived from the score so a threshold change never leaves
    // a stale band in the view.
    let band_of: BTreeMap<&str, RiskBand> = latest
        .iter()
        .map(|(customer, s)| (*customer, classify_with(s.score, &config.bands)))
        .collect();

    let by_band = RiskBand::ALL
        .iter()
        .map(|band| {
            let members: Vec<&CreditScore> = latest
                .iter()
                .filter(|(c, _)| band_of.get(*c) == Some(band))
                .map(|(_, s)| *s)
                .collect();
            let in_band: Vec<&CollectionsAccount> = accounts
                .iter()
                .filter(|a| band_of.get(a.customer_id.as_str()) == Some(band))
                .collect();
            BandSummary {
                band: *band,
                scored_customers: members.len() as u64,
                average_score: mean(members.iter().map(|s| Decimal::from(s.score))),
                accounts: in_band.len() as u64,
                outstanding: in_band.iter().map(|a| a.outstanding).sum(),
            }
        })
        .collect();

    let by_stage = CollectionsStage::ALL
        .iter()
        .map(|stage| {
            let in_stage = accounts.iter().filter(|a| a.stage == *stage);
            let (count, outstanding) = in_stage.fold((0u64, Decimal::ZERO), |(n, sum), a| {
                (n + 1, sum + a.outstanding)
            });
            StageSummary {
                stage: *stage,
                accounts: count,
                outstanding,
            }
        })
        .collect();

    let overview = PortfolioOverview {
        total_accounts: accounts.len() as u64,
        active_accounts: accounts.iter().filter(|a| a.is_active()).count() as u64,
        total_outstanding: accounts.iter().map(|a| a.outstanding).sum(),
        average_days_overdue: mean(accounts.iter().map(|a| Decimal::from(a.days_overdue)))
            .unwrap_or(Decimal::ZERO),
        high_risk_accounts: accounts
            .iter()
            .filter(|a| a.days_overdue > config.portfolio.high_risk_days)
            .count() as u64,
        unscored_accounts: accounts
            .iter()
            .filter(|a| !band_of.contains_key(a.customer_id.as_str()))
            .count() as u64,
    };

    PortfolioSnapshot {
        by_band,
        by_stage,
        heatmap: build_heatmap(accounts, &config.portfolio),
        overview,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Most recent score per customer: highest version, then latest
/// `computed_at`, then highest score, so input order never matters.
fn latest_scores(scores: &[CreditScore]) -> BTreeMap<&str, &CreditScore> {
    let mut latest: BTreeMap<&str, &CreditScore> = BTreeMap::new();
    for s in scores {
        let key = (s.version, s.computed_at, s.score);
        latest
            .entry(s.customer_id.as_str())
            .and_modify(|current| {
                if key > (current.version, current.computed_at, current.score) {
                    *current = s;
                }
            })
            .or_insert(s);
    }
    latest
}

fn mean(values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    let (n, sum) = values.fold((0u64, Decimal::ZERO), |(n, sum), v| (n + 1, sum + v));
    if n == 0 {
        None
    } else {
        Some((sum / Decimal::from(n)).round_dp(2))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
