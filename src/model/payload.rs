use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssigneeType {
    #[default]
    Partner,
    Customer,
}

/// Body of a create-action-plan request
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateActionPlanPayload {
    pub name: String,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,

    #[serde(default)]
    pub tasks: Vec<CreateTaskPayload>,
}

/// A task as submitted by the client.
///
/// `id`, `original_task_id` and `parent_task_id` are provisional and only
/// meaningful inside the submitted batch.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateTaskPayload {
    #[serde(default)]
    pub id: Option<String>,

    /// Task in the same batch this one supersedes
    #[serde(default)]
    pub original_task_id: Option<String>,

    /// Task in the same batch this one is a sub-task of
    #[serde(default)]
    pub parent_task_id: Option<String>,

    /// External template; never remapped
    #[serde(default)]
    pub suggested_task_id: Option<String>,

    pub indicator_id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub credit_value: f64,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,

    #[serde(default)]
    pub assignee_type: AssigneeType,

    /// User ids
    #[serde(default)]
    pub assignee: Vec<String>,

    /// Tag names
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A task after identifier canonicalization, carrying its score contribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTask {
    pub id: String,
    pub original_task_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub suggested_task_id: Option<String>,
    pub indicator_id: String,
    pub name: String,
    pub description: String,
    pub credit_value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub assignee_type: AssigneeType,
    pub assignees: Vec<String>,
    pub tags: Vec<String>,
    pub score_increase: f64,
}

impl PlannedTask {
    /// Copy the payload's non-identifier fields under a canonical id
    pub fn from_payload(
        payload: &CreateTaskPayload,
        id: String,
        original_task_id: Option<String>,
        parent_task_id: Option<String>,
    ) -> Self {
        Self {
            id,
            original_task_id,
            parent_task_id,
            suggested_task_id: payload.suggested_task_id.clone(),
            indicator_id: payload.indicator_id.clone(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            credit_value: payload.credit_value,
            start_date: payload.start_date,
            end_date: payload.end_date,
            assignee_type: payload.assignee_type,
            assignees: payload.assignee.clone(),
            tags: payload.tags.clone(),
            score_increase: 0.0,
        }
    }
}
