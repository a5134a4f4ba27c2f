use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
}

/// One labeled step of an activation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationStep {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
    pub details: Option<String>,
}

impl ActivationStep {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status: StepStatus::Pending,
            details: None,
        }
    }
}

/// Number of steps currently in progress. At most one while a sequence runs.
#[must_use]
pub fn in_progress_count(steps: &[ActivationStep]) -> usize {
    steps
        .iter()
        .filter(|s| s.status == StepStatus::InProgress)
        .count()
}
