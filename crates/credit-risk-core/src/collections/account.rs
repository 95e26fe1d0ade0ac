use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stage::CollectionsStage;
use crate::error::CreditRiskError;
use crate::types::{AccountId, CustomerId, Money};
use crate::CreditRiskResult;

/// What caused a stage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// Escalation derived from the day count on an evaluation tick.
    DaysOverdue { days: u32 },
    /// A payment brought the outstanding amount to zero.
    PaymentReceived { amount: Money },
    /// The balance was already zero when the account was evaluated.
    BalanceCleared,
    /// Explicit write-off decision.
    WriteOff { reason: String },
    /// Explicit cure request on a settled account.
    ManualCure { reason: String },
}

impl std::fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionTrigger::DaysOverdue { days } => write!(f, "{} days overdue", days),
            TransitionTrigger::PaymentReceived { amount } => write!(f, "payment of {}", amount),
            TransitionTrigger::BalanceCleared => write!(f, "balance cleared"),
            TransitionTrigger::WriteOff { reason } => write!(f, "write-off: {}", reason),
            TransitionTrigger::ManualCure { reason } => write!(f, "manual cure: {}", reason),
        }
    }
}

/// Immutable history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: CollectionsStage,
    pub to: CollectionsStage,
    pub at: DateTime<Utc>,
    pub trigger: TransitionTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionsAccount {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<String>,
    pub outstanding: Money,
    pub days_overdue: u32,
    pub stage: CollectionsStage,
    pub stage_entered_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<StageTransition>,
    /// Write counter owned by the repository.
    #[serde(default)]
    pub revision: u64,
}

impl CollectionsAccount {
    /// A new account in `Current` with no history.
    pub fn open(
        account_id: impl Into<AccountId>,
        customer_id: impl Into<CustomerId>,
        outstanding: Money,
        opened_at: DateTime<Utc>,
    ) -> CreditRiskResult<Self> {
        let account = Self {
            account_id: account_id.into(),
            customer_id: customer_id.into(),
            loan_id: None,
            outstanding,
            days_overdue: 0,
            stage: CollectionsStage::Current,
            stage_entered_at: opened_at,
            history: Vec::new(),
            revision: 0,
        };
        account.check_invariants()?;
        Ok(account)
    }

    pub fn with_loan(mut self, loan_id: impl Into<String>) -> Self {
        self.loan_id = Some(loan_id.into());
        self
    }

    /// Still being worked by collections.
    pub fn is_active(&self) -> bool {
        !self.stage.is_terminal()
    }

    pub(crate) fn check_invariants(&self) -> CreditRiskResult<()> {
        if self.account_id.trim().is_empty() {
            return Err(CreditRiskError::InvalidInput {
                field: "account_id".into(),
                reason: "Account identifier is required.".into(),
            });
        }
        if self.outstanding < Decimal::ZERO {
            return Err(CreditRiskError::InvalidInput {
                field: "outstanding".into(),
                reason: format!(
                    "Outstanding amount must be non-negative, got {}.",
                    self.outstanding
                ),
            });
        }
        Ok(())
    }

    /// Append a history entry and move to `to`.
    pub(crate) fn push_transition(
        &mut self,
        to: CollectionsStage,
        trigger: TransitionTrigger,
        at: DateTime<Utc>,
    ) {
        self.history.push(StageTransition {
            from: self.stage,
            to,
            at,
            trigger,
        });
        self.stage = to;
        self.stage_entered_at = at;
    }
}
