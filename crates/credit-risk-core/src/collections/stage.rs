use serde::{Deserialize, Serialize};

use crate::config::StageThresholds;
use crate::error::CreditRiskError;

/// Escalation stage of an account in collections.
///
/// `Current` through `Legal` form the escalation ladder; `Cured` and
/// `WrittenOff` are terminal and sit outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionsStage {
    Current,
    Early,
    Mid,
    Late,
    Legal,
    Cured,
    WrittenOff,
}

impl CollectionsStage {
    pub const ALL: [CollectionsStage; 7] = [
        CollectionsStage::Current,
        CollectionsStage::Early,
        CollectionsStage::Mid,
        CollectionsStage::Late,
        CollectionsStage::Legal,
        CollectionsStage::Cured,
        CollectionsStage::WrittenOff,
    ];

    /// Position on the escalation ladder; `None` for terminal stages.
    pub fn rank(&self) -> Option<u8> {
        match self {
            CollectionsStage::Current => Some(0),
            CollectionsStage::Early => Some(1),
            CollectionsStage::Mid => Some(2),
            CollectionsStage::Late => Some(3),
            CollectionsStage::Legal => Some(4),
            CollectionsStage::Cured | CollectionsStage::WrittenOff => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank().is_none()
    }

    /// Collections playbook for the stage, handed to the presentation layer
    /// as plain facts.
    pub fn recommended_actions(&self) -> &'static [&'static str] {
        match self {
            CollectionsStage::Current => &[],
            CollectionsStage::Early => &[
                "Friendly reminder",
                "Payment plan offer",
                "Account review",
            ],
            CollectionsStage::Mid => &[
                "Formal notice",
                "Payment arrangement",
                "Account restriction",
            ],
            CollectionsStage::Late => &[
                "Final notice",
                "Settlement offer",
                "Pre-legal warning",
            ],
            CollectionsStage::Legal => &[
                "Legal notice",
                "Debt collection agency",
                "Court proceedings",
            ],
            CollectionsStage::Cured => &["Close collections case"],
            CollectionsStage::WrittenOff => &["Report loss", "Refer to recovery"],
        }
    }
}

impl std::fmt::Display for CollectionsStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionsStage::Current => write!(f, "Current"),
            CollectionsStage::Early => write!(f, "Early"),
            CollectionsStage::Mid => write!(f, "Mid"),
            CollectionsStage::Late => write!(f, "Late"),
            CollectionsStage::Legal => write!(f, "Legal"),
            CollectionsStage::Cured => write!(f, "Cured"),
            CollectionsStage::WrittenOff => write!(f, "Written Off"),
        }
    }
}

impl std::str::FromStr for CollectionsStage {
    type Err = CreditRiskError;

    /// Case-insensitive; `written_off`, `written-off` and `Written Off` are
    /// all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        CollectionsStage::ALL
            .into_iter()
            .find(|stage| format!("{:?}", stage).to_ascii_lowercase() == key)
            .ok_or_else(|| CreditRiskError::InvalidInput {
                field: "stage".into(),
                reason: format!("Unknown collections stage '{}'.", s),
            })
    }
}

/// Stage implied by a day count alone.
pub fn target_stage(days_overdue: u32, thresholds: &StageThresholds) -> CollectionsStage {
    if days_overdue == 0 {
        CollectionsStage::Current
    } else if days_overdue <= thresholds.early_max_days {
        CollectionsStage::Early
    } else if days_overdue <= thresholds.mid_max_days {
        CollectionsStage::Mid
    } else if days_overdue <= thresholds.late_max_days {
        CollectionsStage::Late
    } else {
        CollectionsStage::Legal
    }
}
