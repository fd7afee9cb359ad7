use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of a diagnostic assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticStatus {
    Created,
    InProgress,
    AnswersDone,
    Closed,
}

impl DiagnosticStatus {
    /// Only diagnostics with every answer collected can receive an action plan
    pub fn is_answers_complete(&self) -> bool {
        matches!(self, DiagnosticStatus::AnswersDone)
    }
}

impl std::fmt::Display for DiagnosticStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticStatus::Created => write!(f, "CREATED"),
            DiagnosticStatus::InProgress => write!(f, "IN_PROGRESS"),
            DiagnosticStatus::AnswersDone => write!(f, "ANSWERS_DONE"),
            DiagnosticStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct IndicatorScore {
    pub indicator_id: String,
    pub value: f64,
}

/// Read-only view of a diagnostic as the workflow needs it.
///
/// `partner_id` is resolved through the diagnostic's analysis and
/// `indicator_scores` only holds the aggregate snapshot (no respondent).
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub id: String,
    pub status: DiagnosticStatus,
    pub customer_id: String,
    pub partner_id: String,
    pub indicator_scores: Vec<IndicatorScore>,
}

impl Diagnostic {
    /// Indicator id -> aggregate value
    pub fn score_index(&self) -> HashMap<&str, f64> {
        self.indicator_scores
            .iter()
            .map(|s| (s.indicator_id.as_str(), s.value))
            .collect()
    }
}

/// The authenticated caller on whose behalf a plan is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    pub user_id: String,
    pub partner_id: String,
}
