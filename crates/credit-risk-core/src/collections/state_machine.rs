//! Collections stage transitions.
//!
//! Edges accepted:
//!
//! | from | to | how |
//! |---|---|---|
//! | ladder stage | more severe ladder stage | evaluation tick, day thresholds |
//! | any non-terminal | `Cured` | outstanding reaches zero (tick, payment or explicit request) |
//! | `Legal` | `WrittenOff` | explicit request only |
//!
//! Every function takes the account by reference and returns the next
//! version; a rejected request leaves the caller's copy untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::account::{CollectionsAccount, TransitionTrigger};
use super::stage::{target_stage, CollectionsStage};
use crate::config::StageThresholds;
use crate::error::CreditRiskError;
use crate::types::Money;
use crate::CreditRiskResult;

/// Evaluation tick: record the latest day count and escalate if the count
/// now implies a more severe stage.
///
/// The cure rule runs first: a zero balance moves any non-terminal account
/// to `Cured`. Escalation jumps straight to the threshold stage in one
/// transition; the stage never moves back on day count alone. Terminal
/// accounts are returned unchanged.
pub fn evaluate(
    account: &CollectionsAccount,
    days_overdue: u32,
    thresholds: &StageThresholds,
    now: DateTime<Utc>,
) -> CreditRiskResult<CollectionsAccount> {
    account.check_invariants()?;
    if account.stage.is_terminal() {
        return Ok(account.clone());
    }

    let mut next = account.clone();
    next.days_overdue = days_overdue;

    if next.outstanding.is_zero() {
        next.push_transition(CollectionsStage::Cured, TransitionTrigger::BalanceCleared, now);
        return Ok(next);
    }

    let target = target_stage(days_overdue, thresholds);
    if is_escalation(next.stage, target) {
        next.push_transition(target, TransitionTrigger::DaysOverdue { days: days_overdue }, now);
    }
    Ok(next)
}

/// Apply a payment. Clearing the balance cures the account; a partial
/// payment reduces the balance without moving the stage.
pub fn apply_payment(
    account: &CollectionsAccount,
    amount: Money,
    now: DateTime<Utc>,
) -> CreditRiskResult<CollectionsAccount> {
    account.check_invariants()?;
    if account.stage.is_terminal() {
        return Err(CreditRiskError::InvalidTransition {
            from: account.stage.to_string(),
            to: account.stage.to_string(),
            reason: "payments cannot be applied to a closed account".into(),
        });
    }
    if amount <= Decimal::ZERO {
        return Err(CreditRiskError::InvalidInput {
            field: "amount".into(),
            reason: "Payment amount must be positive.".into(),
        });
    }
    if amount > account.outstanding {
        return Err(CreditRiskError::InvalidInput {
            field: "amount".into(),
            reason: format!(
                "Payment {} exceeds outstanding amount {}.",
                amount, account.outstanding
            ),
        });
    }

    let mut next = account.clone();
    next.outstanding -= amount;
    if next.outstanding.is_zero() {
        next.push_transition(
            CollectionsStage::Cured,
            TransitionTrigger::PaymentReceived { amount },
            now,
        );
    }
    Ok(next)
}

/// Explicit transition requested from outside the state machine (manual
/// write-off, manual cure of a settled account). Any other edge is rejected.
pub fn request_transition(
    account: &CollectionsAccount,
    to: CollectionsStage,
    reason: &str,
    now: DateTime<Utc>,
) -> CreditRiskResult<CollectionsAccount> {
    account.check_invariants()?;
    let from = account.stage;
    let reject = |why: &str| CreditRiskError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
        reason: why.to_string(),
    };

    if from.is_terminal() {
        return Err(reject("account is in a terminal stage"));
    }

    let trigger = match to {
        CollectionsStage::WrittenOff if from == CollectionsStage::Legal => {
            TransitionTrigger::WriteOff {
                reason: reason.to_string(),
            }
        }
        CollectionsStage::WrittenOff => {
            return Err(reject("only accounts in Legal can be written off"));
        }
        CollectionsStage::Cured if account.outstanding.is_zero() => {
            TransitionTrigger::ManualCure {
                reason: reason.to_string(),
            }
        }
        CollectionsStage::Cured => {
            return Err(reject("outstanding amount must be zero to cure"));
        }
        _ => {
            return Err(reject("escalation is driven by days overdue only"));
        }
    };

    let mut next = account.clone();
    next.push_transition(to, trigger, now);
    Ok(next)
}

fn is_escalation(from: CollectionsStage, to: CollectionsStage) -> bool {
    match (from.rank(), to.rank()) {
        (Some(f), Some(t)) => t > f,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn account(outstanding: Money) -> CollectionsAccount {
        CollectionsAccount::open("acc-1", "cust-1", outstanding, t0()).unwrap()
    }

    fn in_stage(stage: CollectionsStage, outstanding: Money) -> CollectionsAccount {
        let mut a = account(outstanding);
        a.stage = stage;
        a
    }

    #[test]
    fn test_fresh_evaluation_jumps_to_threshold_stage() {
        let th = StageThresholds::default();
        let out = evaluate(&account(dec!(500)), 45, &th, t0()).unwrap();
        assert_eq!(out.stage, CollectionsStage::Mid);
        assert_eq!(out.days_overdue, 45);
        assert_eq!(out.history.len(), 1);
        assert_eq!(out.history[0].from, CollectionsStage::Current);
        assert_eq!(out.history[0].to, CollectionsStage::Mid);
        assert_eq!(
            out.history[0].trigger,
            TransitionTrigger::DaysOverdue { days: 45 }
        );
    }

    #[test]
    fn test_daily_ticks_pass_through_early() {
        let th = StageThresholds::default();
        let mut acc = account(dec!(500));
        for day in 0..=45u32 {
            acc = evaluate(&acc, day, &th, t0() + Duration::days(i64::from(day))).unwrap();
        }
        let path: Vec<CollectionsStage> = acc.history.iter().map(|h| h.to).collect();
        assert_eq!(path, vec![CollectionsStage::Early, CollectionsStage::Mid]);
        assert_eq!(acc.stage_entered_at, t0() + Duration::days(31));
    }

    #[test]
    fn test_no_regression_when_days_drop() {
        let th = StageThresholds::default();
        let acc = evaluate(&account(dec!(500)), 75, &th, t0()).unwrap();
        let acc = evaluate(&acc, 10, &th, t0()).unwrap();
        assert_eq!(acc.stage, CollectionsStage::Late);
        assert_eq!(acc.days_overdue, 10);
        assert_eq!(acc.history.len(), 1);
    }

    #[test]
    fn test_same_stage_tick_records_nothing() {
        let th = StageThresholds::default();
        let acc = evaluate(&account(dec!(500)), 5, &th, t0()).unwrap();
        let again = evaluate(&acc, 20, &th, t0()).unwrap();
        assert_eq!(again.history.len(), 1);
        assert_eq!(again.stage, CollectionsStage::Early);
    }

    #[test]
    fn test_zero_balance_in_legal_cures() {
        let th = StageThresholds::default();
        let acc = in_stage(CollectionsStage::Legal, dec!(0));
        let out = evaluate(&acc, 200, &th, t0()).unwrap();
        assert_eq!(out.stage, CollectionsStage::Cured);
        assert_eq!(out.history.last().unwrap().trigger, TransitionTrigger::BalanceCleared);
        assert!(!out.is_active());
    }

    #[test]
    fn test_terminal_tick_is_noop() {
        let th = StageThresholds::default();
        let acc = in_stage(CollectionsStage::WrittenOff, dec!(900));
        let out = evaluate(&acc, 400, &th, t0()).unwrap();
        assert_eq!(out, acc);
    }

    #[test]
    fn test_full_payment_cures() {
        let acc = in_stage(CollectionsStage::Late, dec!(500));
        let out = apply_payment(&acc, dec!(500), t0()).unwrap();
        assert_eq!(out.stage, CollectionsStage::Cured);
        assert_eq!(out.outstanding, Decimal::ZERO);
        assert_eq!(
            out.history.last().unwrap().trigger,
            TransitionTrigger::PaymentReceived { amount: dec!(500) }
        );
    }

    #[test]
    fn test_partial_payment_keeps_stage() {
        let acc = in_stage(CollectionsStage::Late, dec!(500));
        let out = apply_payment(&acc, dec!(200), t0()).unwrap();
        assert_eq!(out.stage, CollectionsStage::Late);
        assert_eq!(out.outstanding, dec!(300));
        assert!(out.history.is_empty());
    }

    #[test]
    fn test_overpayment_rejected() {
        let acc = in_stage(CollectionsStage::Mid, dec!(100));
        let err = apply_payment(&acc, dec!(100.01), t0()).unwrap_err();
        assert!(matches!(err, CreditRiskError::InvalidInput { .. }));
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let acc = in_stage(CollectionsStage::Mid, dec!(100));
        assert!(apply_payment(&acc, dec!(0), t0()).is_err());
        assert!(apply_payment(&acc, dec!(-5), t0()).is_err());
    }

    #[test]
    fn test_payment_on_cured_account_rejected() {
        let acc = in_stage(CollectionsStage::Cured, dec!(0));
        let err = apply_payment(&acc, dec!(1), t0()).unwrap_err();
        assert!(matches!(err, CreditRiskError::InvalidTransition { .. }));
    }

    #[test]
    fn test_write_off_from_legal() {
        let acc = in_stage(CollectionsStage::Legal, dec!(12000));
        let out = request_transition(&acc, CollectionsStage::WrittenOff, "uncollectable", t0())
            .unwrap();
        assert_eq!(out.stage, CollectionsStage::WrittenOff);
        assert_eq!(
            out.history.last().unwrap().trigger,
            TransitionTrigger::WriteOff {
                reason: "uncollectable".into()
            }
        );
    }

    #[test]
    fn test_write_off_before_legal_rejected() {
        let acc = in_stage(CollectionsStage::Late, dec!(12000));
        let err = request_transition(&acc, CollectionsStage::WrittenOff, "", t0()).unwrap_err();
        assert!(matches!(err, CreditRiskError::InvalidTransition { .. }));
    }

    #[test]
    fn test_written_off_to_early_rejected() {
        let acc = in_stage(CollectionsStage::WrittenOff, dec!(12000));
        let err = request_transition(&acc, CollectionsStage::Early, "retry", t0()).unwrap_err();
        match err {
            CreditRiskError::InvalidTransition { from, to, .. } => {
                assert_eq!(from, "Written Off");
                assert_eq!(to, "Early");
            }
            other => panic!("Expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn test_manual_escalation_rejected() {
        let acc = in_stage(CollectionsStage::Early, dec!(100));
        assert!(request_transition(&acc, CollectionsStage::Legal, "", t0()).is_err());
        assert!(request_transition(&acc, CollectionsStage::Current, "", t0()).is_err());
    }

    #[test]
    fn test_manual_cure_requires_zero_balance() {
        let owing = in_stage(CollectionsStage::Mid, dec!(10));
        assert!(request_transition(&owing, CollectionsStage::Cured, "", t0()).is_err());

        let settled = in_stage(CollectionsStage::Mid, dec!(0));
        let out = request_transition(&settled, CollectionsStage::Cured, "settled", t0()).unwrap();
        assert_eq!(out.stage, CollectionsStage::Cured);
    }

    #[test]
    fn test_negative_outstanding_rejected() {
        let mut acc = account(dec!(10));
        acc.outstanding = dec!(-1);
        let th = StageThresholds::default();
        assert!(evaluate(&acc, 5, &th, t0()).is_err());
        assert!(CollectionsAccount::open("a", "c", dec!(-1), t0()).is_err());
    }

    proptest! {
        /// Day-count-only updates never lower the stage.
        #[test]
        fn stage_non_decreasing_under_ticks(days in proptest::collection::vec(0u32..200, 1..40)) {
            let th = StageThresholds::default();
            let mut acc = account(dec!(250));
            let mut prev_rank = acc.stage.rank();
            for d in days {
                acc = evaluate(&acc, d, &th, t0()).unwrap();
                let rank = acc.stage.rank();
                prop_assert!(rank >= prev_rank);
                prev_rank = rank;
            }
            for h in &acc.history {
                prop_assert!(h.to.rank() > h.from.rank());
            }
        }

        /// Terminal accounts accept no explicit transition at all.
        #[test]
        fn terminal_accounts_reject_requests(idx in 0usize..7, terminal_idx in 0usize..2) {
            let terminal = [CollectionsStage::Cured, CollectionsStage::WrittenOff][terminal_idx];
            let acc = in_stage(terminal, dec!(0));
            let target = CollectionsStage::ALL[idx];
            prop_assert!(request_transition(&acc, target, "", t0()).is_err());
        }
    }
}
