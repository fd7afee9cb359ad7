//! Rows written to (or read from) the action-plan store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AssigneeType, PlannedTask};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewActionPlan {
    pub diagnostic_id: String,
    pub partner_id: String,
    pub customer_id: String,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewTask {
    pub id: String,
    pub action_plan_id: String,
    pub indicator_id: String,
    pub name: String,
    pub description: String,
    pub credit_value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub suggested_task_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub original_task_id: Option<String>,
    pub assignee_type: AssigneeType,
    pub score_increase: f64,
}

impl NewTask {
    pub fn from_planned(task: &PlannedTask, action_plan_id: &str) -> Self {
        Self {
            id: task.id.clone(),
            action_plan_id: action_plan_id.to_string(),
            indicator_id: task.indicator_id.clone(),
            name: task.name.clone(),
            description: task.description.clone(),
            credit_value: task.credit_value,
            start_date: task.start_date,
            end_date: task.end_date,
            suggested_task_id: task.suggested_task_id.clone(),
            parent_task_id: task.parent_task_id.clone(),
            original_task_id: task.original_task_id.clone(),
            assignee_type: task.assignee_type,
            score_increase: task.score_increase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewTag {
    pub name: String,
    pub partner_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskAssignee {
    pub task_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskTagLink {
    pub task_id: String,
    pub tag_id: String,
}

/// Suggested-task template with its score increase coefficient
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SuggestedTask {
    pub id: String,
    pub score_increase_coefficient: f64,
}
