use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditRiskError {
    #[error("Invalid profile: {field} — {reason}")]
    InvalidProfile { field: String, reason: String },

    #[error("Invalid score: {0} is outside the scoring range")]
    InvalidScore(i64),

    #[error("Invalid transition: {from} -> {to} ({reason})")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CreditRiskError {
    pub fn invalid_profile(field: &str, reason: impl Into<String>) -> Self {
        CreditRiskError::InvalidProfile {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        CreditRiskError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Storage-side failures the caller may retry; everything else needs
    /// corrected input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CreditRiskError::StorageUnavailable(_) | CreditRiskError::Conflict(_)
        )
    }
}

impl From<serde_json::Error> for CreditRiskError {
    fn from(e: serde_json::Error) -> Self {
        CreditRiskError::SerializationError(e.to_string())
    }
}
