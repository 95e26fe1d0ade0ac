//! Storage boundary.
//!
//! The only stateful component. Everything else in the crate works on values
//! handed to it; this trait is how those values are loaded and persisted.
//! Implementations must apply each write to a single record atomically and
//! serialize concurrent writes to the same account.

pub mod in_memory;

use std::sync::Arc;

use crate::collections::CollectionsAccount;
use crate::scoring::{CreditScore, FinancialProfile};
use crate::CreditRiskResult;

pub use in_memory::InMemoryRepository;

/// Read-modify-write step run while the account record is locked.
pub type AccountUpdate<'a> =
    &'a mut dyn FnMut(&CollectionsAccount) -> CreditRiskResult<CollectionsAccount>;

pub trait RepositoryGateway: Send + Sync {
    /// Latest profile snapshot for a customer.
    fn get_profile(&self, customer_id: &str) -> CreditRiskResult<FinancialProfile>;

    /// Store a new profile snapshot. A zero version is assigned the next
    /// number; an explicit version must be newer than the latest stored.
    fn put_profile(&self, profile: FinancialProfile) -> CreditRiskResult<FinancialProfile>;

    /// Append a score and return it stamped with its version.
    fn put_score(&self, score: CreditScore) -> CreditRiskResult<CreditScore>;

    /// Every stored score for a customer, oldest first.
    fn score_history(&self, customer_id: &str) -> CreditRiskResult<Vec<CreditScore>>;

    fn get_account(&self, account_id: &str) -> CreditRiskResult<CollectionsAccount>;

    /// Conditional write: `account.revision` must match the stored revision
    /// (0 for a new account). Returns the stored copy with the new revision.
    fn put_account(&self, account: CollectionsAccount) -> CreditRiskResult<CollectionsAccount>;

    /// Run `update` against the current record while holding its lock and
    /// store the result. Nothing is written if `update` fails.
    fn update_account(
        &self,
        account_id: &str,
        update: AccountUpdate<'_>,
    ) -> CreditRiskResult<CollectionsAccount>;

    /// Point-in-time copy of every account, ordered by account id.
    fn list_accounts(&self) -> CreditRiskResult<Vec<CollectionsAccount>>;

    /// Latest score per customer, ordered by customer id.
    fn list_scores(&self) -> CreditRiskResult<Vec<CreditScore>>;
}

impl<S> RepositoryGateway for Arc<S>
where
    S: RepositoryGateway + ?Sized,
{
    fn get_profile(&self, customer_id: &str) -> CreditRiskResult<FinancialProfile> {
        (**self).get_profile(customer_id)
    }

    fn put_profile(&self, profile: FinancialProfile) -> CreditRiskResult<FinancialProfile> {
        (**self).put_profile(profile)
    }

    fn put_score(&self, score: CreditScore) -> CreditRiskResult<CreditScore> {
        (**self).put_score(score)
    }

    fn score_history(&self, customer_id: &str) -> CreditRiskResult<Vec<CreditScore>> {
        (**self).score_history(customer_id)
    }

    fn get_account(&self, account_id: &str) -> CreditRiskResult<CollectionsAccount> {
        (**self).get_account(account_id)
    }

    fn put_account(&self, account: CollectionsAccount) -> CreditRiskResult<CollectionsAccount> {
        (**self).put_account(account)
    }

    fn update_account(
        &self,
        account_id: &str,
        update: AccountUpdate<'_>,
    ) -> CreditRiskResult<CollectionsAccount> {
        (**self).update_account(account_id, update)
    }

    fn list_accounts(&self) -> CreditRiskResult<Vec<CollectionsAccount>> {
        (**self).list_accounts()
    }

    fn list_scores(&self) -> CreditRiskResult<Vec<CreditScore>> {
        (**self).list_scores()
    }
}
