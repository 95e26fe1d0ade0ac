use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CreditRiskError;
use crate::types::{CustomerId, Money, Rate};
use crate::CreditRiskResult;

/// Behavioural flags derived from bank statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskIndicators {
    /// Direct debits or transfers returned unpaid over the lookback window.
    pub returned_payments: u32,
    pub gambling_transactions: bool,
    pub irregular_income: bool,
}

/// Immutable snapshot of a customer's finances used as scoring input.
///
/// Numeric inputs are optional because profiles are assembled by upstream
/// collaborators that may not have every figure; the scoring engine rejects
/// any snapshot with a gap instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub customer_id: CustomerId,
    /// Snapshot number, increasing per customer.
    #[serde(default)]
    pub version: u32,
    pub as_of: DateTime<Utc>,
    /// Length of the window the incident counts refer to.
    #[serde(default = "default_lookback_months")]
    pub lookback_months: u32,
    #[serde(default)]
    pub monthly_income: Option<Money>,
    #[serde(default)]
    pub monthly_expenses: Option<Money>,
    #[serde(default)]
    pub average_balance: Option<Money>,
    #[serde(default)]
    pub overdraft_count: Option<u32>,
    #[serde(default)]
    pub missed_payment_count: Option<u32>,
    #[serde(default)]
    pub missed_payment_amount: Option<Money>,
    #[serde(default)]
    pub debt_to_income: Option<Rate>,
    #[serde(default)]
    pub risk_indicators: RiskIndicators,
}

fn default_lookback_months() -> u32 {
    6
}

/// Back-reference from a score to the snapshot it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub customer_id: CustomerId,
    pub version: u32,
    pub as_of: DateTime<Utc>,
}

/// A profile with every required field present and range-checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ValidatedInputs {
    pub income: Money,
    pub expenses: Money,
    pub average_balance: Money,
    pub overdrafts: u32,
    pub missed_payments: u32,
    pub missed_amount: Money,
    pub debt_to_income: Rate,
}

impl FinancialProfile {
    pub fn reference(&self) -> ProfileRef {
        ProfileRef {
            customer_id: self.customer_id.clone(),
            version: self.version,
            as_of: self.as_of,
        }
    }

    pub(crate) fn validate(&self) -> CreditRiskResult<ValidatedInputs> {
        if self.customer_id.trim().is_empty() {
            return Err(CreditRiskError::invalid_profile(
                "customer_id",
                "Customer identifier is required.",
            ));
        }

        let income = required(self.monthly_income, "monthly_income")?;
        let expenses = required(self.monthly_expenses, "monthly_expenses")?;
        let average_balance = required(self.average_balance, "average_balance")?;
        let overdrafts = required(self.overdraft_count, "overdraft_count")?;
        let missed_payments = required(self.missed_payment_count, "missed_payment_count")?;
        let missed_amount = required(self.missed_payment_amount, "missed_payment_amount")?;
        let debt_to_income = required(self.debt_to_income, "debt_to_income")?;

        if income < Decimal::ZERO {
            return Err(CreditRiskError::invalid_profile(
                "monthly_income",
                "Monthly income must be non-negative.",
            ));
        }
        if income.is_zero() {
            return Err(CreditRiskError::invalid_profile(
                "monthly_income",
                "Monthly income of zero leaves affordability undefined.",
            ));
        }
        if expenses < Decimal::ZERO {
            return Err(CreditRiskError::invalid_profile(
                "monthly_expenses",
                "Monthly expenses must be non-negative.",
            ));
        }
        if missed_amount < Decimal::ZERO {
            return Err(CreditRiskError::invalid_profile(
                "missed_payment_amount",
                "Missed payment amount must be non-negative.",
            ));
        }
        if debt_to_income < Decimal::ZERO {
            return Err(CreditRiskError::invalid_profile(
                "debt_to_income",
                "Debt-to-income ratio must be non-negative.",
            ));
        }

        Ok(ValidatedInputs {
            income,
            expenses,
            average_balance,
            overdrafts,
            missed_payments,
            missed_amount,
            debt_to_income,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> CreditRiskResult<T> {
    value.ok_or_else(|| CreditRiskError::invalid_profile(field, "Required field is missing."))
}
