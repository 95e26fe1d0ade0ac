//! Deterministic credit scoring.
//!
//! Five normalized sub-scores are combined with fixed weights:
//!
//! 1. **Affordability** -- savings rate relative to a target rate.
//! 2. **Stability** -- inverse of overdraft / missed / returned payment load.
//! 3. **Leverage** -- debt-to-income, inverted against a ceiling.
//! 4. **Liquidity** -- average balance in months of expenses.
//! 5. **Conduct** -- statement flags (gambling, irregular income).
//!
//! Each sub-score is clamped to [0, 1] before weighting, so the composite is
//! in [0, 1] and maps linearly onto [300, 850]. Factor points are signed
//! contributions relative to the neutral baseline (every sub-score at 0.5)
//! and always sum to `score - baseline`.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::classifier::{classify_with, RiskBand};
use super::profile::{FinancialProfile, ProfileRef, ValidatedInputs};
use crate::config::{RiskConfig, ScoringConfig};
use crate::error::CreditRiskError;
use crate::types::{CustomerId, SCORE_MAX, SCORE_MIN};
use crate::CreditRiskResult;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One named contribution to the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub name: String,
    /// The ratio or count the sub-score was derived from.
    pub input_value: Decimal,
    /// Normalized sub-score in [0, 1].
    pub sub_score: Decimal,
    pub weight: Decimal,
    /// Unrounded signed contribution: range * weight * (sub_score - 0.5).
    pub raw_points: Decimal,
    /// Contribution after distributing the integer rounding of the score.
    pub points: Decimal,
}

/// A versioned scoring result. Never edited; a rescore produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditScore {
    pub customer_id: CustomerId,
    /// Assigned by the repository on write; 0 until persisted.
    #[serde(default)]
    pub version: u32,
    pub score: u16,
    pub band: RiskBand,
    /// Score of a profile with every sub-score at 0.5.
    pub baseline: u16,
    /// Weighted sub-score sum in [0, 1].
    pub composite: Decimal,
    pub factors: Vec<ScoreFactor>,
    pub computed_at: DateTime<Utc>,
    pub profile: ProfileRef,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const FACTOR_AFFORDABILITY: &str = "affordability";
pub const FACTOR_STABILITY: &str = "stability";
pub const FACTOR_LEVERAGE: &str = "leverage";
pub const FACTOR_LIQUIDITY: &str = "liquidity";
pub const FACTOR_CONDUCT: &str = "conduct";

const NEUTRAL_SUB_SCORE: Decimal = dec!(0.5);

/// Midpoint of the score range.
pub const BASELINE_SCORE: u16 = (SCORE_MIN + SCORE_MAX) / 2;

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Score a profile with the default risk constants, stamped now.
pub fn score_profile(profile: &FinancialProfile) -> CreditRiskResult<CreditScore> {
    compute_score(profile, &RiskConfig::default(), Utc::now())
}

/// Score a profile. Identical inputs always produce identical output.
pub fn compute_score(
    profile: &FinancialProfile,
    config: &RiskConfig,
    computed_at: DateTime<Utc>,
) -> CreditRiskResult<CreditScore> {
    config.scoring.validate()?;
    let inputs = profile.validate()?;
    let weights = &config.scoring.weights;

    let subs = sub_scores(&inputs, profile, &config.scoring)?;
    let weighted = [
        (FACTOR_AFFORDABILITY, weights.affordability, subs.affordability),
        (FACTOR_STABILITY, weights.stability, subs.stability),
        (FACTOR_LEVERAGE, weights.leverage, subs.leverage),
        (FACTOR_LIQUIDITY, weights.liquidity, subs.liquidity),
        (FACTOR_CONDUCT, weights.conduct, subs.conduct),
    ];

    let range = Decimal::from(SCORE_MAX - SCORE_MIN);
    let composite: Decimal = weighted.iter().map(|(_, w, (_, s))| *w * *s).sum();
    let raw_score = Decimal::from(SCORE_MIN) + range * composite;
    let score = to_bounded_score(raw_score)?;

    let baseline = Decimal::from(BASELINE_SCORE);
    let raw_points: Vec<Decimal> = weighted
        .iter()
        .map(|(_, w, (_, s))| range * *w * (*s - NEUTRAL_SUB_SCORE))
        .collect();
    let target_delta = Decimal::from(score) - baseline;
    let points = distribute_rounding(&raw_points, &weighted.map(|(_, w, _)| w), target_delta);

    let factors = weighted
        .iter()
        .zip(raw_points.iter().zip(points))
        .map(|((name, weight, (input_value, sub_score)), (raw, pts))| ScoreFactor {
            name: (*name).to_string(),
            input_value: *input_value,
            sub_score: *sub_score,
            weight: *weight,
            raw_points: *raw,
            points: pts,
        })
        .collect();

    Ok(CreditScore {
        customer_id: profile.customer_id.clone(),
        version: 0,
        score,
        band: classify_with(score, &config.bands),
        baseline: BASELINE_SCORE,
        composite,
        factors,
        computed_at,
        profile: profile.reference(),
    })
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

/// (input value, clamped sub-score) per factor.
struct SubScores {
    affordability: (Decimal, Decimal),
    stability: (Decimal, Decimal),
    leverage: (Decimal, Decimal),
    liquidity: (Decimal, Decimal),
    conduct: (Decimal, Decimal),
}

fn sub_scores(
    inputs: &ValidatedInputs,
    profile: &FinancialProfile,
    config: &ScoringConfig,
) -> CreditRiskResult<SubScores> {
    // Affordability: savings rate against the target rate
    let savings_rate = ratio(
        inputs.income - inputs.expenses,
        inputs.income,
        "monthly_expenses",
    )?;
    let affordability = clamp_unit(ratio(
        savings_rate,
        config.affordability_target,
        "monthly_income",
    )?);

    // Stability: 1 / (1 + incident load), amount weighed in months of income
    let missed_months = ratio(inputs.missed_amount, inputs.income, "missed_payment_amount")?;
    let incident_load = (Decimal::from(inputs.overdrafts)
        + Decimal::from(inputs.missed_payments)
        + Decimal::from(profile.risk_indicators.returned_payments))
    .checked_add(missed_months)
    .ok_or_else(|| out_of_range("missed_payment_amount"))?;
    let stability = clamp_unit(ratio(
        Decimal::ONE,
        Decimal::ONE
            .checked_add(incident_load)
            .ok_or_else(|| out_of_range("missed_payment_amount"))?,
        "missed_payment_amount",
    )?);

    // Leverage: zero at the DTI ceiling
    let leverage = clamp_unit(
        Decimal::ONE
            .checked_sub(ratio(inputs.debt_to_income, config.dti_ceiling, "debt_to_income")?)
            .ok_or_else(|| out_of_range("debt_to_income"))?,
    );

    // Liquidity: months of expenses covered by the average balance
    let (cushion_months, liquidity) = if inputs.expenses.is_zero() {
        let full = if inputs.average_balance >= Decimal::ZERO {
            Decimal::ONE
        } else {
            Decimal::ZERO
        };
        (config.liquidity_months * full, full)
    } else {
        let months = ratio(inputs.average_balance, inputs.expenses, "average_balance")?;
        (
            months,
            clamp_unit(ratio(months, config.liquidity_months, "average_balance")?),
        )
    };

    // Conduct: statement flags
    let mut flags = Decimal::ZERO;
    let mut penalty = Decimal::ZERO;
    if profile.risk_indicators.gambling_transactions {
        flags += Decimal::ONE;
        penalty += config.gambling_penalty;
    }
    if profile.risk_indicators.irregular_income {
        flags += Decimal::ONE;
        penalty += config.irregular_income_penalty;
    }
    let conduct = clamp_unit(Decimal::ONE - penalty);

    Ok(SubScores {
        affordability: (savings_rate, affordability),
        stability: (incident_load, stability),
        leverage: (inputs.debt_to_income, leverage),
        liquidity: (cushion_months, liquidity),
        conduct: (flags, conduct),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `num / den`, failing instead of panicking when the quotient is not
/// representable or `den` is zero.
fn ratio(num: Decimal, den: Decimal, field: &str) -> CreditRiskResult<Decimal> {
    num.checked_div(den).ok_or_else(|| out_of_range(field))
}

fn out_of_range(field: &str) -> CreditRiskError {
    CreditRiskError::invalid_profile(field, "Ratio is outside the representable range.")
}

fn clamp_unit(x: Decimal) -> Decimal {
    x.max(Decimal::ZERO).min(Decimal::ONE)
}

fn to_bounded_score(raw: Decimal) -> CreditRiskResult<u16> {
    let rounded = raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let as_int = rounded
        .to_i64()
        .ok_or(CreditRiskError::InvalidScore(i64::MIN))?;
    if as_int < i64::from(SCORE_MIN) || as_int > i64::from(SCORE_MAX) {
        return Err(CreditRiskError::InvalidScore(as_int));
    }
    Ok(as_int as u16)
}

/// Spread the integer rounding residual across factors by weight, round to
/// cents, and let the heaviest factor absorb the last cent so the points sum
/// exactly to `target`.
fn distribute_rounding(raw: &[Decimal], weights: &[Decimal], target: Decimal) -> Vec<Decimal> {
    let raw_total: Decimal = raw.iter().copied().sum();
    let residual = target - raw_total;

    let mut points: Vec<Decimal> = raw
        .iter()
        .zip(weights)
        .map(|(r, w)| (*r + residual * *w).round_dp(2))
        .collect();

    let drift = target - points.iter().copied().sum::<Decimal>();
    if !drift.is_zero() {
        let heaviest = weights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        if let Some(p) = points.get_mut(heaviest) {
            *p += drift;
        }
    }
    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::profile::RiskIndicators;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn base_profile() -> FinancialProfile {
        FinancialProfile {
            customer_id: "cust-001".into(),
            version: 1,
            as_of: at(),
            lookback_months: 6,
            monthly_income: Some(dec!(3000)),
            monthly_expenses: Some(dec!(2500)),
            average_balance: Some(dec!(5000)),
            overdraft_count: Some(0),
            missed_payment_count: Some(0),
            missed_payment_amount: Some(dec!(0)),
            debt_to_income: Some(dec!(0.2)),
            risk_indicators: RiskIndicators::default(),
        }
    }

    fn factor<'a>(score: &'a CreditScore, name: &str) -> &'a ScoreFactor {
        score.factors.iter().find(|f| f.name == name).unwrap()
    }

    fn points_total(score: &CreditScore) -> Decimal {
        score.factors.iter().map(|f| f.points).sum()
    }

    #[test]
    fn test_healthy_profile_scores_low_risk() {
        let out = compute_score(&base_profile(), &RiskConfig::default(), at()).unwrap();
        // composite = 0.3*0.8333 + 0.3*1 + 0.2*0.6 + 0.1*0.6667 + 0.1*1 = 0.8367
        assert_eq!(out.score, 760);
        assert_eq!(out.band, RiskBand::Low);
        assert!(factor(&out, FACTOR_AFFORDABILITY).sub_score > dec!(0.8));
        assert_eq!(factor(&out, FACTOR_STABILITY).sub_score, Decimal::ONE);
    }

    #[test]
    fn test_points_sum_to_delta_from_baseline() {
        let out = compute_score(&base_profile(), &RiskConfig::default(), at()).unwrap();
        let delta = Decimal::from(out.score) - Decimal::from(out.baseline);
        assert_eq!(points_total(&out), delta);
    }

    #[test]
    fn test_factor_order_is_fixed() {
        let out = compute_score(&base_profile(), &RiskConfig::default(), at()).unwrap();
        let names: Vec<&str> = out.factors.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                FACTOR_AFFORDABILITY,
                FACTOR_STABILITY,
                FACTOR_LEVERAGE,
                FACTOR_LIQUIDITY,
                FACTOR_CONDUCT
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let a = compute_score(&base_profile(), &RiskConfig::default(), at()).unwrap();
        let b = compute_score(&base_profile(), &RiskConfig::default(), at()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_perfect_profile_hits_ceiling() {
        let p = FinancialProfile {
            monthly_income: Some(dec!(10000)),
            monthly_expenses: Some(dec!(0)),
            average_balance: Some(dec!(1000)),
            debt_to_income: Some(dec!(0)),
            ..base_profile()
        };
        let out = compute_score(&p, &RiskConfig::default(), at()).unwrap();
        assert_eq!(out.score, SCORE_MAX);
        assert_eq!(out.composite, Decimal::ONE);
    }

    #[test]
    fn test_distressed_profile_scores_severe() {
        let p = FinancialProfile {
            monthly_income: Some(dec!(1000)),
            monthly_expenses: Some(dec!(2000)),
            average_balance: Some(dec!(-500)),
            overdraft_count: Some(10),
            debt_to_income: Some(dec!(1.0)),
            risk_indicators: RiskIndicators {
                returned_payments: 0,
                gambling_transactions: true,
                irregular_income: true,
            },
            ..base_profile()
        };
        let out = compute_score(&p, &RiskConfig::default(), at()).unwrap();
        // Only stability contributes: 0.3 * 1/11 * 550 = 15.0
        assert_eq!(out.score, 315);
        assert_eq!(out.band, RiskBand::Severe);
        assert_eq!(factor(&out, FACTOR_AFFORDABILITY).sub_score, Decimal::ZERO);
        assert_eq!(factor(&out, FACTOR_CONDUCT).sub_score, Decimal::ZERO);
        assert!(factor(&out, FACTOR_LEVERAGE).points < Decimal::ZERO);
    }

    #[test]
    fn test_extreme_dti_is_clamped() {
        let p = FinancialProfile {
            debt_to_income: Some(dec!(25)),
            ..base_profile()
        };
        let out = compute_score(&p, &RiskConfig::default(), at()).unwrap();
        assert_eq!(factor(&out, FACTOR_LEVERAGE).sub_score, Decimal::ZERO);
        assert!(out.score >= SCORE_MIN);
    }

    #[test]
    fn test_missed_payments_reduce_stability() {
        let p = FinancialProfile {
            missed_payment_count: Some(1),
            missed_payment_amount: Some(dec!(3000)),
            ..base_profile()
        };
        let out = compute_score(&p, &RiskConfig::default(), at()).unwrap();
        // load = 1 + 3000/3000 = 2 -> 1/3
        assert_eq!(factor(&out, FACTOR_STABILITY).input_value, dec!(2));
        assert!(factor(&out, FACTOR_STABILITY).sub_score < dec!(0.34));
    }

    #[test]
    fn test_returned_payments_count_as_incidents() {
        let mut p = base_profile();
        p.risk_indicators.returned_payments = 1;
        let out = compute_score(&p, &RiskConfig::default(), at()).unwrap();
        assert_eq!(factor(&out, FACTOR_STABILITY).sub_score, dec!(0.5));
    }

    #[test]
    fn test_zero_income_rejected() {
        let p = FinancialProfile {
            monthly_income: Some(Decimal::ZERO),
            ..base_profile()
        };
        let err = compute_score(&p, &RiskConfig::default(), at()).unwrap_err();
        match err {
            CreditRiskError::InvalidProfile { field, .. } => assert_eq!(field, "monthly_income"),
            other => panic!("Expected InvalidProfile, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_field_rejected() {
        let p = FinancialProfile {
            debt_to_income: None,
            ..base_profile()
        };
        let err = compute_score(&p, &RiskConfig::default(), at()).unwrap_err();
        match err {
            CreditRiskError::InvalidProfile { field, .. } => assert_eq!(field, "debt_to_income"),
            other => panic!("Expected InvalidProfile, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_expenses_rejected() {
        let p = FinancialProfile {
            monthly_expenses: Some(dec!(-1)),
            ..base_profile()
        };
        assert!(matches!(
            compute_score(&p, &RiskConfig::default(), at()),
            Err(CreditRiskError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn test_blank_customer_rejected() {
        let p = FinancialProfile {
            customer_id: "  ".into(),
            ..base_profile()
        };
        assert!(compute_score(&p, &RiskConfig::default(), at()).is_err());
    }

    #[test]
    fn test_profile_reference_recorded() {
        let out = compute_score(&base_profile(), &RiskConfig::default(), at()).unwrap();
        assert_eq!(out.profile.customer_id, "cust-001");
        assert_eq!(out.profile.version, 1);
        assert_eq!(out.version, 0);
    }

    #[test]
    fn test_baseline_is_range_midpoint() {
        assert_eq!(BASELINE_SCORE, 575);
    }

    fn huge() -> Decimal {
        Decimal::from_i128_with_scale(10_i128.pow(27), 0)
    }

    fn rejected_field(p: &FinancialProfile) -> String {
        match compute_score(p, &RiskConfig::default(), at()).unwrap_err() {
            CreditRiskError::InvalidProfile { field, .. } => field,
            other => panic!("Expected InvalidProfile, got {other:?}"),
        }
    }

    #[test]
    fn test_unrepresentable_savings_rate_rejected() {
        let p = FinancialProfile {
            monthly_income: Some(Decimal::new(1, 4)),
            monthly_expenses: Some(huge()),
            ..base_profile()
        };
        assert_eq!(rejected_field(&p), "monthly_expenses");
    }

    #[test]
    fn test_unrepresentable_missed_amount_rejected() {
        let p = FinancialProfile {
            monthly_income: Some(Decimal::new(1, 4)),
            monthly_expenses: Some(Decimal::ZERO),
            missed_payment_amount: Some(huge()),
            ..base_profile()
        };
        assert_eq!(rejected_field(&p), "missed_payment_amount");
    }

    #[test]
    fn test_unrepresentable_cushion_rejected() {
        let p = FinancialProfile {
            monthly_expenses: Some(Decimal::new(1, 7)),
            average_balance: Some(huge() / dec!(10)),
            ..base_profile()
        };
        assert_eq!(rejected_field(&p), "average_balance");
    }

    #[test]
    fn test_zero_dti_ceiling_rejected() {
        let mut cfg = RiskConfig::default();
        cfg.scoring.dti_ceiling = Decimal::ZERO;
        assert!(matches!(
            compute_score(&base_profile(), &cfg, at()),
            Err(CreditRiskError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_tiny_affordability_target_rejected() {
        let mut cfg = RiskConfig::default();
        cfg.scoring.affordability_target = Decimal::new(1, 28);
        let p = FinancialProfile {
            monthly_expenses: Some(huge()),
            ..base_profile()
        };
        assert!(matches!(
            compute_score(&p, &cfg, at()),
            Err(CreditRiskError::InvalidProfile { .. })
        ));
    }

    fn arb_profile() -> impl Strategy<Value = FinancialProfile> {
        (
            1i64..100_000,
            0i64..100_000,
            -50_000i64..200_000,
            0u32..50,
            0u32..50,
            0i64..50_000,
            0i64..300,
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(
                |(inc, exp, bal, od, missed, amt, dti_pct, gamble, irregular)| FinancialProfile {
                    customer_id: "prop".into(),
                    version: 1,
                    as_of: at(),
                    lookback_months: 6,
                    monthly_income: Some(Decimal::from(inc)),
                    monthly_expenses: Some(Decimal::from(exp)),
                    average_balance: Some(Decimal::from(bal)),
                    overdraft_count: Some(od),
                    missed_payment_count: Some(missed),
                    missed_payment_amount: Some(Decimal::from(amt)),
                    debt_to_income: Some(Decimal::new(dti_pct, 2)),
                    risk_indicators: RiskIndicators {
                        returned_payments: 0,
                        gambling_transactions: gamble,
                        irregular_income: irregular,
                    },
                },
            )
    }

    fn arb_magnitude(min: i64) -> impl Strategy<Value = Decimal> {
        (min..=i64::MAX, 0u32..=28).prop_map(|(m, scale)| Decimal::new(m, scale))
    }

    proptest! {
        /// Extreme magnitudes either score in range or are rejected.
        #[test]
        fn extreme_figures_never_panic(
            income in arb_magnitude(1),
            expenses in arb_magnitude(0),
            balance in arb_magnitude(0),
            missed in arb_magnitude(0),
            dti in arb_magnitude(0),
        ) {
            let p = FinancialProfile {
                monthly_income: Some(income),
                monthly_expenses: Some(expenses),
                average_balance: Some(balance),
                missed_payment_amount: Some(missed),
                debt_to_income: Some(dti),
                ..base_profile()
            };
            match compute_score(&p, &RiskConfig::default(), at()) {
                Ok(out) => prop_assert!(out.score >= SCORE_MIN && out.score <= SCORE_MAX),
                Err(e) => prop_assert!(
                    matches!(e, CreditRiskError::InvalidProfile { .. }),
                    "unexpected error: {:?}",
                    e
                ),
            }
        }

        /// Score stays in range and the explanation reproduces it.
        #[test]
        fn score_in_bounds_and_explained(p in arb_profile()) {
            let out = compute_score(&p, &RiskConfig::default(), at()).unwrap();
            prop_assert!(out.score >= SCORE_MIN && out.score <= SCORE_MAX);
            let delta = Decimal::from(out.score) - Decimal::from(out.baseline);
            prop_assert_eq!(points_total(&out), delta);
            for f in &out.factors {
                prop_assert!(f.sub_score >= Decimal::ZERO && f.sub_score <= Decimal::ONE);
            }
        }

        #[test]
        fn score_is_deterministic(p in arb_profile()) {
            let a = compute_score(&p, &RiskConfig::default(), at()).unwrap();
            let b = compute_score(&p, &RiskConfig::default(), at()).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
