pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "scoring")]
pub mod scoring;

#[cfg(feature = "collections")]
pub mod collections;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "repository")]
pub mod repository;

#[cfg(feature = "repository")]
pub mod service;

pub use config::RiskConfig;
pub use error::CreditRiskError;
pub use types::*;

/// Standard result type for all credit-risk operations
pub type CreditRiskResult<T> = Result<T, CreditRiskError>;
