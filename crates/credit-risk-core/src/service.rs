//! Orchestration over a [`RepositoryGateway`].
//!
//! Loads inputs, runs the pure scoring/collections/portfolio functions and
//! persists the outcome. Collections writes go through
//! [`RepositoryGateway::update_account`] so each transition is applied against
//! the record as it stands at write time.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::collections::{self, CollectionsAccount, CollectionsStage};
use crate::portfolio::{self, AccountFilter, PortfolioSnapshot};
use crate::repository::RepositoryGateway;
use crate::scoring::{self, CreditScore, FinancialProfile};
use crate::types::Money;
use crate::{CreditRiskResult, RiskConfig};

#[derive(Debug)]
pub struct RiskService<R> {
    repo: R,
    config: RiskConfig,
}

impl<R: RepositoryGateway> RiskService<R> {
    /// Fails with `InvalidConfig` if the constants are inconsistent.
    pub fn new(repo: R, config: RiskConfig) -> CreditRiskResult<Self> {
        config.validate()?;
        Ok(Self { repo, config })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn submit_profile(&self, profile: FinancialProfile) -> CreditRiskResult<FinancialProfile> {
        let stored = self.repo.put_profile(profile)?;
        debug!(customer_id = %stored.customer_id, version = stored.version, "profile submitted");
        Ok(stored)
    }

    /// Score the customer's latest profile and append the result to their
    /// history.
    pub fn score_customer(
        &self,
        customer_id: &str,
        now: DateTime<Utc>,
    ) -> CreditRiskResult<CreditScore> {
        let profile = self.repo.get_profile(customer_id)?;
        let score = scoring::compute_score(&profile, &self.config, now).map_err(|e| {
            warn!(customer_id, error = %e, "profile rejected by scoring engine");
            e
        })?;
        let stored = self.repo.put_score(score)?;
        info!(
            customer_id,
            score = stored.score,
            band = %stored.band,
            version = stored.version,
            "customer scored"
        );
        Ok(stored)
    }

    pub fn open_account(&self, account: CollectionsAccount) -> CreditRiskResult<CollectionsAccount> {
        let stored = self.repo.put_account(account)?;
        info!(account_id = %stored.account_id, outstanding = %stored.outstanding, "collections account opened");
        Ok(stored)
    }

    /// Evaluation tick with the latest days-overdue figure.
    pub fn evaluate_account(
        &self,
        account_id: &str,
        days_overdue: u32,
        now: DateTime<Utc>,
    ) -> CreditRiskResult<CollectionsAccount> {
        let thresholds = &self.config.collections;
        self.update(account_id, "evaluate", &mut |acc| {
            collections::evaluate(acc, days_overdue, thresholds, now)
        })
    }

    pub fn record_payment(
        &self,
        account_id: &str,
        amount: Money,
        now: DateTime<Utc>,
    ) -> CreditRiskResult<CollectionsAccount> {
        self.update(account_id, "payment", &mut |acc| {
            collections::apply_payment(acc, amount, now)
        })
    }

    pub fn request_transition(
        &self,
        account_id: &str,
        to: CollectionsStage,
        reason: &str,
        now: DateTime<Utc>,
    ) -> CreditRiskResult<CollectionsAccount> {
        self.update(account_id, "transition", &mut |acc| {
            collections::request_transition(acc, to, reason, now)
        })
    }

    pub fn write_off(
        &self,
        account_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> CreditRiskResult<CollectionsAccount> {
        self.request_transition(account_id, CollectionsStage::WrittenOff, reason, now)
    }

    pub fn portfolio_snapshot(&self) -> CreditRiskResult<PortfolioSnapshot> {
        self.portfolio_snapshot_filtered(&AccountFilter::default())
    }

    pub fn portfolio_snapshot_filtered(
        &self,
        filter: &AccountFilter,
    ) -> CreditRiskResult<PortfolioSnapshot> {
        let accounts = self.repo.list_accounts()?;
        let scores = self.repo.list_scores()?;
        let snapshot = portfolio::aggregate_filtered(&accounts, &scores, filter, &self.config);
        debug!(
            accounts = snapshot.overview.total_accounts,
            scores = scores.len(),
            "portfolio aggregated"
        );
        Ok(snapshot)
    }

    fn update(
        &self,
        account_id: &str,
        operation: &str,
        step: &mut dyn FnMut(&CollectionsAccount) -> CreditRiskResult<CollectionsAccount>,
    ) -> CreditRiskResult<CollectionsAccount> {
        let mut from = None;
        let result = self.repo.update_account(account_id, &mut |acc| {
            from = Some(acc.stage);
            step(acc)
        });
        match &result {
            Ok(next) => {
                if from.is_some_and(|f| f != next.stage) {
                    info!(
                        account_id,
                        operation,
                        from = ?from,
                        to = %next.stage,
                        days_overdue = next.days_overdue,
                        "collections stage changed"
                    );
                } else {
                    debug!(account_id, operation, stage = %next.stage, "collections account updated");
                }
            }
            Err(e) => warn!(account_id, operation, error = %e, "collections update rejected"),
        }
        result
    }
}
