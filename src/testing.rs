//! Fixture builders for unit tests

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    AssigneeType, CreateActionPlanPayload, CreateTaskPayload, DiagnosticStatus, IndicatorScore,
    NewActionPlan, NewTask,
};
use crate::store::{AnalysisRow, DiagnosticRow, ScoreSnapshotRow};

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0).unwrap()
}

pub fn answered_diagnostic(id: &str, partner_id: &str, scores: &[(&str, f64)]) -> DiagnosticRow {
    DiagnosticRow {
        id: id.to_string(),
        status: DiagnosticStatus::AnswersDone,
        customer_id: "customer-1".to_string(),
        analysis: AnalysisRow {
            partner_id: partner_id.to_string(),
        },
        scores: vec![ScoreSnapshotRow {
            respondent_id: None,
            indicators_scores: scores
                .iter()
                .map(|(indicator_id, value)| IndicatorScore {
                    indicator_id: indicator_id.to_string(),
                    value: *value,
                })
                .collect(),
        }],
    }
}

pub fn task_payload(id: &str) -> CreateTaskPayload {
    CreateTaskPayload {
        id: Some(id.to_string()),
        original_task_id: None,
        parent_task_id: None,
        suggested_task_id: None,
        indicator_id: "gov".to_string(),
        name: format!("task {}", id),
        description: String::new(),
        credit_value: 1.0,
        start_date: day(1),
        end_date: day(28),
        assignee_type: AssigneeType::Partner,
        assignee: Vec::new(),
        tags: Vec::new(),
    }
}

pub fn plan_payload(tasks: Vec<CreateTaskPayload>) -> CreateActionPlanPayload {
    CreateActionPlanPayload {
        name: "Improvement plan".to_string(),
        start_date: day(1),
        end_date: day(31),
        tasks,
    }
}

pub fn new_plan(diagnostic_id: &str, partner_id: &str) -> NewActionPlan {
    NewActionPlan {
        diagnostic_id: diagnostic_id.to_string(),
        partner_id: partner_id.to_string(),
        customer_id: "customer-1".to_string(),
        name: "Improvement plan".to_string(),
        start_date: day(1),
        end_date: day(31),
    }
}

pub fn new_task(id: &str, action_plan_id: &str) -> NewTask {
    NewTask {
        id: id.to_string(),
        action_plan_id: action_plan_id.to_string(),
        indicator_id: "gov".to_string(),
        name: format!("task {}", id),
        description: String::new(),
        credit_value: 1.0,
        start_date: day(1),
        end_date: day(28),
        suggested_task_id: None,
        parent_task_id: None,
        original_task_id: None,
        assignee_type: AssigneeType::Partner,
        score_increase: 0.0,
    }
}
