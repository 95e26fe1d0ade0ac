pub mod classifier;
pub mod engine;
pub mod profile;

pub use classifier::{checked_classify, classify, classify_with, RiskBand};
pub use engine::{compute_score, score_profile, CreditScore, ScoreFactor};
pub use profile::{FinancialProfile, ProfileRef, RiskIndicators};
