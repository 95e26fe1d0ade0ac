//! Risk constants: sub-score weights, band cut-offs, collections day
//! boundaries and heatmap buckets.
//!
//! Every constant lives here with a `Default` so scoring and staging are
//! reproducible without a config file. Overrides are plain serde documents;
//! missing keys fall back to the defaults.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CreditRiskError;
use crate::types::{Money, Rate, SCORE_MAX, SCORE_MIN};
use crate::CreditRiskResult;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Weight of each sub-score in the composite. Must sum to exactly 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub affordability: Decimal,
    pub stability: Decimal,
    pub leverage: Decimal,
    pub liquidity: Decimal,
    pub conduct: Decimal,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            affordability: dec!(0.30),
            stability: dec!(0.30),
            leverage: dec!(0.20),
            liquidity: dec!(0.10),
            conduct: dec!(0.10),
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> Decimal {
        self.affordability + self.stability + self.leverage + self.liquidity + self.conduct
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// Savings rate that earns a full affordability sub-score.
    pub affordability_target: Rate,
    /// Debt-to-income ratio at which the leverage sub-score reaches zero.
    pub dti_ceiling: Rate,
    /// Months of expenses the average balance should cover for full liquidity.
    pub liquidity_months: Decimal,
    /// Conduct deduction when gambling transactions appear on statements.
    pub gambling_penalty: Rate,
    /// Conduct deduction when income arrives irregularly.
    pub irregular_income_penalty: Rate,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            affordability_target: dec!(0.20),
            dti_ceiling: dec!(0.50),
            liquidity_months: dec!(3),
            gambling_penalty: dec!(0.5),
            irregular_income_penalty: dec!(0.5),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> CreditRiskResult<()> {
        let w = &self.weights;
        for (name, value) in [
            ("affordability", w.affordability),
            ("stability", w.stability),
            ("leverage", w.leverage),
            ("liquidity", w.liquidity),
            ("conduct", w.conduct),
        ] {
            if value < Decimal::ZERO {
                return Err(CreditRiskError::InvalidConfig(format!(
                    "scoring weight '{}' must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if w.total() != Decimal::ONE {
            return Err(CreditRiskError::InvalidConfig(format!(
                "scoring weights must sum to 1, got {}",
                w.total()
            )));
        }
        for (name, value) in [
            ("affordability_target", self.affordability_target),
            ("dti_ceiling", self.dti_ceiling),
            ("liquidity_months", self.liquidity_months),
        ] {
            if value <= Decimal::ZERO {
                return Err(CreditRiskError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("gambling_penalty", self.gambling_penalty),
            ("irregular_income_penalty", self.irregular_income_penalty),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(CreditRiskError::InvalidConfig(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Risk bands
// ---------------------------------------------------------------------------

/// Inclusive lower score bound of each band; anything below `high_min` is
/// Severe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandThresholds {
    pub low_min: u16,
    pub medium_min: u16,
    pub high_min: u16,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            low_min: 740,
            medium_min: 670,
            high_min: 580,
        }
    }
}

impl BandThresholds {
    pub fn validate(&self) -> CreditRiskResult<()> {
        let ordered = SCORE_MIN < self.high_min
            && self.high_min < self.medium_min
            && self.medium_min < self.low_min
            && self.low_min <= SCORE_MAX;
        if !ordered {
            return Err(CreditRiskError::InvalidConfig(format!(
                "band thresholds must satisfy {} < high ({}) < medium ({}) < low ({}) <= {}",
                SCORE_MIN, self.high_min, self.medium_min, self.low_min, SCORE_MAX
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collections stages
// ---------------------------------------------------------------------------

/// Inclusive upper day bound of each escalation stage. Day 0 is Current,
/// anything beyond `late_max_days` is Legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    pub early_max_days: u32,
    pub mid_max_days: u32,
    pub late_max_days: u32,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            early_max_days: 30,
            mid_max_days: 60,
            late_max_days: 90,
        }
    }
}

impl StageThresholds {
    pub fn validate(&self) -> CreditRiskResult<()> {
        let ordered = self.early_max_days >= 1
            && self.early_max_days < self.mid_max_days
            && self.mid_max_days < self.late_max_days;
        if !ordered {
            return Err(CreditRiskError::InvalidConfig(format!(
                "stage thresholds must satisfy 1 <= early ({}) < mid ({}) < late ({})",
                self.early_max_days, self.mid_max_days, self.late_max_days
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Inclusive upper bounds of the days-overdue buckets. A final open
    /// bucket catches everything above the last bound.
    pub overdue_bucket_bounds: Vec<u32>,
    /// Inclusive upper bounds of the outstanding-amount buckets.
    pub amount_bucket_bounds: Vec<Money>,
    /// Accounts strictly beyond this many days overdue count as high risk.
    pub high_risk_days: u32,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            overdue_bucket_bounds: vec![0, 30, 60, 90],
            amount_bucket_bounds: vec![dec!(1000), dec!(5000), dec!(10000)],
            high_risk_days: 60,
        }
    }
}

impl PortfolioConfig {
    pub fn validate(&self) -> CreditRiskResult<()> {
        if !self.overdue_bucket_bounds.windows(2).all(|w| w[0] < w[1]) {
            return Err(CreditRiskError::InvalidConfig(
                "overdue_bucket_bounds must be strictly increasing".into(),
            ));
        }
        if !self.amount_bucket_bounds.windows(2).all(|w| w[0] < w[1]) {
            return Err(CreditRiskError::InvalidConfig(
                "amount_bucket_bounds must be strictly increasing".into(),
            ));
        }
        if self
            .amount_bucket_bounds
            .first()
            .is_some_and(|b| *b < Decimal::ZERO)
        {
            return Err(CreditRiskError::InvalidConfig(
                "amount_bucket_bounds must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub scoring: ScoringConfig,
    pub bands: BandThresholds,
    pub collections: StageThresholds,
    pub portfolio: PortfolioConfig,
}

impl RiskConfig {
    pub fn validate(&self) -> CreditRiskResult<()> {
        self.scoring.validate()?;
        self.bands.validate()?;
        self.collections.validate()?;
        self.portfolio.validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RiskConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert_eq!(ScoringWeights::default().total(), Decimal::ONE);
    }

    #[test]
    fn test_weights_not_summing_to_one_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.conduct = dec!(0.2);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, CreditRiskError::InvalidConfig(_)));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.conduct = dec!(-0.1);
        cfg.weights.liquidity = dec!(0.3);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_penalty_above_one_rejected() {
        let cfg = ScoringConfig {
            gambling_penalty: dec!(1.5),
            ..ScoringConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_band_thresholds_must_descend() {
        let bands = BandThresholds {
            low_min: 700,
            medium_min: 720,
            high_min: 580,
        };
        assert!(bands.validate().is_err());
    }

    #[test]
    fn test_band_threshold_at_floor_rejected() {
        let bands = BandThresholds {
            low_min: 740,
            medium_min: 670,
            high_min: SCORE_MIN,
        };
        assert!(bands.validate().is_err());
    }

    #[test]
    fn test_stage_thresholds_must_ascend() {
        let stages = StageThresholds {
            early_max_days: 30,
            mid_max_days: 30,
            late_max_days: 90,
        };
        assert!(stages.validate().is_err());
    }

    #[test]
    fn test_unsorted_buckets_rejected() {
        let cfg = PortfolioConfig {
            overdue_bucket_bounds: vec![0, 60, 30],
            ..PortfolioConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let cfg: RiskConfig =
            serde_json::from_str(r#"{ "bands": { "low_min": 760 } }"#).unwrap();
        assert_eq!(cfg.bands.low_min, 760);
        assert_eq!(cfg.bands.medium_min, 670);
        assert_eq!(cfg.collections, StageThresholds::default());
        assert!(cfg.validate().is_ok());
    }
}
