//! Score → risk band mapping.
//!
//! Bands partition `[SCORE_MIN, SCORE_MAX]` with inclusive lower bounds, so
//! the mapping is total over the range and monotonic: a lower score never
//! lands in a less severe band.

use serde::{Deserialize, Serialize};

use crate::config::BandThresholds;
use crate::error::CreditRiskError;
use crate::types::{SCORE_MAX, SCORE_MIN};
use crate::CreditRiskResult;

/// Risk category. Variants are declared from least to most severe so the
/// derived ordering is the severity ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
    Severe,
}

impl RiskBand {
    pub const ALL: [RiskBand; 4] = [
        RiskBand::Low,
        RiskBand::Medium,
        RiskBand::High,
        RiskBand::Severe,
    ];
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Low => write!(f, "Low"),
            RiskBand::Medium => write!(f, "Medium"),
            RiskBand::High => write!(f, "High"),
            RiskBand::Severe => write!(f, "Severe"),
        }
    }
}

/// Classify a score with the default thresholds.
pub fn classify(score: u16) -> RiskBand {
    classify_with(score, &BandThresholds::default())
}

/// Classify a score with caller-supplied thresholds.
pub fn classify_with(score: u16, thresholds: &BandThresholds) -> RiskBand {
    if score >= thresholds.low_min {
        RiskBand::Low
    } else if score >= thresholds.medium_min {
        RiskBand::Medium
    } else if score >= thresholds.high_min {
        RiskBand::High
    } else {
        RiskBand::Severe
    }
}

/// Classify an untrusted score, rejecting anything outside the scoring range.
pub fn checked_classify(score: i64, thresholds: &BandThresholds) -> CreditRiskResult<RiskBand> {
    if score < i64::from(SCORE_MIN) || score > i64::from(SCORE_MAX) {
        return Err(CreditRiskError::InvalidScore(score));
    }
    // Range-checked above, fits in u16.
    Ok(classify_with(score as u16, thresholds))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_boundaries_default() {
        assert_eq!(classify(850), RiskBand::Low);
        assert_eq!(classify(740), RiskBand::Low);
        assert_eq!(classify(739), RiskBand::Medium);
        assert_eq!(classify(670), RiskBand::Medium);
        assert_eq!(classify(669), RiskBand::High);
        assert_eq!(classify(580), RiskBand::High);
        assert_eq!(classify(579), RiskBand::Severe);
        assert_eq!(classify(300), RiskBand::Severe);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = BandThresholds {
            low_min: 800,
            medium_min: 700,
            high_min: 600,
        };
        assert_eq!(classify_with(750, &t), RiskBand::Medium);
        assert_eq!(classify_with(800, &t), RiskBand::Low);
        assert_eq!(classify_with(599, &t), RiskBand::Severe);
    }

    #[test]
    fn test_checked_classify_rejects_out_of_range() {
        let t = BandThresholds::default();
        assert!(matches!(
            checked_classify(299, &t),
            Err(CreditRiskError::InvalidScore(299))
        ));
        assert!(matches!(
            checked_classify(851, &t),
            Err(CreditRiskError::InvalidScore(851))
        ));
        assert!(matches!(
            checked_classify(-5, &t),
            Err(CreditRiskError::InvalidScore(-5))
        ));
        assert_eq!(checked_classify(700, &t).unwrap(), RiskBand::Medium);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(RiskBand::Low < RiskBand::Medium);
        assert!(RiskBand::Medium < RiskBand::High);
        assert!(RiskBand::High < RiskBand::Severe);
    }

    proptest! {
        /// Lower score never maps to a less severe band.
        #[test]
        fn classify_is_monotonic(a in SCORE_MIN..=SCORE_MAX, b in SCORE_MIN..=SCORE_MAX) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(lo) >= classify(hi));
        }

        /// Every in-range score is accepted by the checked entry point.
        #[test]
        fn checked_classify_is_total(s in SCORE_MIN..=SCORE_MAX) {
            let t = BandThresholds::default();
            prop_assert_eq!(checked_classify(i64::from(s), &t).unwrap(), classify(s));
        }
    }
}
