use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use super::{AccountUpdate, RepositoryGateway};
use crate::collections::CollectionsAccount;
use crate::error::CreditRiskError;
use crate::scoring::{CreditScore, FinancialProfile};
use crate::types::{AccountId, CustomerId};
use crate::CreditRiskResult;

type AccountRecord = Arc<Mutex<CollectionsAccount>>;

/// In-memory repository.
///
/// Intended for tests/dev and for embedding the core without a database.
/// Accounts sit behind their own mutex so writers to different accounts never
/// wait on each other, while writers to the same account are serialized.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    profiles: RwLock<BTreeMap<CustomerId, Vec<FinancialProfile>>>,
    scores: RwLock<BTreeMap<CustomerId, Vec<CreditScore>>>,
    accounts: RwLock<BTreeMap<AccountId, AccountRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, account_id: &str) -> CreditRiskResult<AccountRecord> {
        let map = self.accounts.read().map_err(|_| poisoned("accounts"))?;
        map.get(account_id)
            .cloned()
            .ok_or_else(|| CreditRiskError::not_found("account", account_id))
    }

    /// Conditional overwrite of an existing record.
    fn write_existing(
        record: &AccountRecord,
        mut account: CollectionsAccount,
    ) -> CreditRiskResult<CollectionsAccount> {
        let mut guard = record.lock().map_err(|_| poisoned("account record"))?;
        if guard.revision != account.revision {
            return Err(CreditRiskError::Conflict(format!(
                "account '{}' is at revision {}, write was based on {}",
                guard.account_id, guard.revision, account.revision
            )));
        }
        check_history(&guard, &account)?;
        account.revision = guard.revision + 1;
        *guard = account.clone();
        Ok(account)
    }
}

impl RepositoryGateway for InMemoryRepository {
    fn get_profile(&self, customer_id: &str) -> CreditRiskResult<FinancialProfile> {
        let map = self.profiles.read().map_err(|_| poisoned("profiles"))?;
        map.get(customer_id)
            .and_then(|versions| versions.last())
            .cloned()
            .ok_or_else(|| CreditRiskError::not_found("profile", customer_id))
    }

    fn put_profile(&self, mut profile: FinancialProfile) -> CreditRiskResult<FinancialProfile> {
        let mut map = self.profiles.write().map_err(|_| poisoned("profiles"))?;
        let versions = map.entry(profile.customer_id.clone()).or_default();
        let latest = versions.last().map(|p| p.version).unwrap_or(0);
        if profile.version == 0 {
            profile.version = latest + 1;
        } else if profile.version <= latest {
            return Err(CreditRiskError::Conflict(format!(
                "profile '{}' version {} is not newer than stored version {}",
                profile.customer_id, profile.version, latest
            )));
        }
        debug!(customer_id = %profile.customer_id, version = profile.version, "profile stored");
        versions.push(profile.clone());
        Ok(profile)
    }

    fn put_score(&self, mut score: CreditScore) -> CreditRiskResult<CreditScore> {
        let mut map = self.scores.write().map_err(|_| poisoned("scores"))?;
        let history = map.entry(score.customer_id.clone()).or_default();
        score.version = history.len() as u32 + 1;
        debug!(customer_id = %score.customer_id, version = score.version, "score stored");
        history.push(score.clone());
        Ok(score)
    }

    fn score_history(&self, customer_id: &str) -> CreditRiskResult<Vec<CreditScore>> {
        let map = self.scores.read().map_err(|_| poisoned("scores"))?;
        Ok(map.get(customer_id).cloned().unwrap_or_default())
    }

    fn get_account(&self, account_id: &str) -> CreditRiskResult<CollectionsAccount> {
        let record = self.record(account_id)?;
        let guard = record.lock().map_err(|_| poisoned("account record"))?;
        Ok(guard.clone())
    }

    fn put_account(&self, account: CollectionsAccount) -> CreditRiskResult<CollectionsAccount> {
        account.check_invariants()?;

        if let Ok(record) = self.record(&account.account_id) {
            return Self::write_existing(&record, account);
        }

        let mut map = self.accounts.write().map_err(|_| poisoned("accounts"))?;
        if let Some(record) = map.get(&account.account_id).cloned() {
            // Lost the race to another inserter.
            drop(map);
            return Self::write_existing(&record, account);
        }
        if account.revision != 0 {
            return Err(CreditRiskError::Conflict(format!(
                "account '{}' does not exist, write was based on revision {}",
                account.account_id, account.revision
            )));
        }
        let mut stored = account;
        stored.revision = 1;
        debug!(account_id = %stored.account_id, "account created");
        map.insert(
            stored.account_id.clone(),
            Arc::new(Mutex::new(stored.clone())),
        );
        Ok(stored)
    }

    fn update_account(
        &self,
        account_id: &str,
        update: AccountUpdate<'_>,
    ) -> CreditRiskResult<CollectionsAccount> {
        let record = self.record(account_id)?;
        let mut guard = record.lock().map_err(|_| poisoned("account record"))?;

        let mut next = update(&guard)?;
        next.check_invariants()?;
        if next.account_id != guard.account_id {
            return Err(CreditRiskError::InvalidInput {
                field: "account_id".into(),
                reason: "An update cannot change the account identifier.".into(),
            });
        }
        check_history(&guard, &next)?;
        next.revision = guard.revision + 1;
        debug!(account_id, revision = next.revision, stage = %next.stage, "account updated");
        *guard = next.clone();
        Ok(next)
    }

    fn list_accounts(&self) -> CreditRiskResult<Vec<CollectionsAccount>> {
        let records: Vec<AccountRecord> = {
            let map = self.accounts.read().map_err(|_| poisoned("accounts"))?;
            map.values().cloned().collect()
        };
        records
            .iter()
            .map(|r| {
                r.lock()
                    .map(|guard| guard.clone())
                    .map_err(|_| poisoned("account record"))
            })
            .collect()
    }

    fn list_scores(&self) -> CreditRiskResult<Vec<CreditScore>> {
        let map = self.scores.read().map_err(|_| poisoned("scores"))?;
        Ok(map.values().filter_map(|h| h.last().cloned()).collect())
    }
}

/// History is append-only and every stage change must be recorded: `next`
/// keeps the stored entries as a prefix, the appended entries chain from the
/// stored stage, and the last one ends on `next.stage`.
fn check_history(stored: &CollectionsAccount, next: &CollectionsAccount) -> CreditRiskResult<()> {
    let rejected = |reason: &str| CreditRiskError::InvalidTransition {
        from: stored.stage.to_string(),
        to: next.stage.to_string(),
        reason: reason.into(),
    };
    if !next.history.starts_with(&stored.history) {
        return Err(rejected("Stage history is append-only."));
    }
    let mut stage = stored.stage;
    for entry in &next.history[stored.history.len()..] {
        if entry.from != stage {
            return Err(rejected("Appended transitions must chain from the stored stage."));
        }
        stage = entry.to;
    }
    if stage != next.stage {
        return Err(rejected("Stage changes must be recorded in the history."));
    }
    Ok(())
}

fn poisoned(what: &str) -> CreditRiskError {
    CreditRiskError::StorageUnavailable(format!("{} lock poisoned", what))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
