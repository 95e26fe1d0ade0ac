use serde::{Deserialize, Serialize};

use crate::collections::{CollectionsAccount, CollectionsStage};
use crate::types::Money;

/// Narrows the account set before aggregation. Empty filter keeps
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountFilter {
    pub stages: Option<Vec<CollectionsStage>>,
    pub min_outstanding: Option<Money>,
    pub min_days_overdue: Option<u32>,
    pub active_only: bool,
}

impl AccountFilter {
    pub fn matches(&self, account: &CollectionsAccount) -> bool {
        if self.active_only && !account.is_active() {
            return false;
        }
        if let Some(stages) = &self.stages {
            if !stages.contains(&account.stage) {
                return false;
            }
        }
        if let Some(min) = self.min_outstanding {
            if account.outstanding < min {
                return false;
            }
        }
        if let Some(min) = self.min_days_overdue {
            if account.days_overdue < min {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, accounts: &[CollectionsAccount]) -> Vec<CollectionsAccount> {
        accounts
            .iter()
            .filter(|a| self.matches(a))
            .cloned()
            .collect()
    }
}
