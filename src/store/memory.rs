use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use super::{ActionPlanStore, StoreError};
use crate::model::{
    Diagnostic, DiagnosticStatus, IndicatorScore, NewActionPlan, NewTag, NewTask, SuggestedTask,
    TaskAssignee, TaskTagLink,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub partner_id: String,
}

/// One score snapshot; `respondent_id` is absent for the aggregate one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSnapshotRow {
    #[serde(default)]
    pub respondent_id: Option<String>,

    #[serde(default)]
    pub indicators_scores: Vec<IndicatorScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticRow {
    pub id: String,
    pub status: DiagnosticStatus,
    pub customer_id: String,
    pub analysis: AnalysisRow,

    #[serde(default)]
    pub scores: Vec<ScoreSnapshotRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRow {
    pub id: String,
    pub name: String,
    pub partner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlanRow {
    pub id: String,

    #[serde(flatten)]
    pub plan: NewActionPlan,

    pub created_at: DateTime<Utc>,
}

/// Full contents of an [`InMemoryStore`], serializable as JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub diagnostics: Vec<DiagnosticRow>,

    #[serde(default)]
    pub suggested_tasks: Vec<SuggestedTask>,

    #[serde(default)]
    pub tags: Vec<TagRow>,

    #[serde(default)]
    pub action_plans: Vec<ActionPlanRow>,

    #[serde(default)]
    pub tasks: Vec<NewTask>,

    #[serde(default)]
    pub task_assignees: Vec<TaskAssignee>,

    #[serde(default)]
    pub task_tags: Vec<TaskTagLink>,
}

/// In-memory store enforcing the same keys and constraints as the real schema
pub struct InMemoryStore {
    data: RwLock<StoreSnapshot>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::from_snapshot(StoreSnapshot::default())
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
            writes: AtomicUsize::new(0),
        }
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Save the current contents to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(data.clone())
    }

    /// Number of successful write calls since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionPlanStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_diagnostic(&self, id: &str) -> Result<Option<Diagnostic>, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        Ok(data.diagnostics.iter().find(|d| d.id == id).map(|row| {
            let indicator_scores = row
                .scores
                .iter()
                .find(|s| s.respondent_id.is_none())
                .map(|s| s.indicators_scores.clone())
                .unwrap_or_default();
            Diagnostic {
                id: row.id.clone(),
                status: row.status,
                customer_id: row.customer_id.clone(),
                partner_id: row.analysis.partner_id.clone(),
                indicator_scores,
            }
        }))
    }

    async fn fetch_suggested_tasks(
        &self,
        ids: &[String],
    ) -> Result<Vec<SuggestedTask>, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(data
            .suggested_tasks
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn find_tag(&self, name: &str, partner_id: &str) -> Result<Option<String>, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(data
            .tags
            .iter()
            .find(|t| t.name == name && t.partner_id == partner_id)
            .map(|t| t.id.clone()))
    }

    async fn create_action_plan(&self, plan: &NewActionPlan) -> Result<String, StoreError> {
        tokio::task::yield_now().await;
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        if !data.diagnostics.iter().any(|d| d.id == plan.diagnostic_id) {
            return Err(StoreError::ForeignKey(format!(
                "action plan references unknown diagnostic '{}'",
                plan.diagnostic_id
            )));
        }

        let id = Uuid::new_v4().to_string();
        data.action_plans.push(ActionPlanRow {
            id: id.clone(),
            plan: plan.clone(),
            created_at: Utc::now(),
        });
        self.record_write();
        Ok(id)
    }

    async fn create_task(&self, task: &NewTask) -> Result<String, StoreError> {
        tokio::task::yield_now().await;
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        if data.tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::Conflict(format!("task '{}' already exists", task.id)));
        }
        if !data.action_plans.iter().any(|p| p.id == task.action_plan_id) {
            return Err(StoreError::ForeignKey(format!(
                "task '{}' references unknown action plan '{}'",
                task.id, task.action_plan_id
            )));
        }
        for (column, reference) in [
            ("parent_task_id", &task.parent_task_id),
            ("original_task_id", &task.original_task_id),
        ] {
            if let Some(referenced) = reference {
                if !data.tasks.iter().any(|t| &t.id == referenced) {
                    return Err(StoreError::ForeignKey(format!(
                        "task '{}' {} references unknown task '{}'",
                        task.id, column, referenced
                    )));
                }
            }
        }

        data.tasks.push(task.clone());
        self.record_write();
        Ok(task.id.clone())
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<String, StoreError> {
        tokio::task::yield_now().await;
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        if data
            .tags
            .iter()
            .any(|t| t.name == tag.name && t.partner_id == tag.partner_id)
        {
            return Err(StoreError::Conflict(format!(
                "tag '{}' already exists for partner '{}'",
                tag.name, tag.partner_id
            )));
        }

        let id = Uuid::new_v4().to_string();
        data.tags.push(TagRow {
            id: id.clone(),
            name: tag.name.clone(),
            partner_id: tag.partner_id.clone(),
        });
        self.record_write();
        Ok(id)
    }

    async fn create_task_assignees(&self, rows: &[TaskAssignee]) -> Result<u64, StoreError> {
        tokio::task::yield_now().await;
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        for row in rows {
            if !data.tasks.iter().any(|t| t.id == row.task_id) {
                return Err(StoreError::ForeignKey(format!(
                    "assignee references unknown task '{}'",
                    row.task_id
                )));
            }
        }

        data.task_assignees.extend_from_slice(rows);
        self.record_write();
        Ok(rows.len() as u64)
    }

    async fn create_task_tags(&self, rows: &[TaskTagLink]) -> Result<u64, StoreError> {
        tokio::task::yield_now().await;
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        for row in rows {
            if !data.tasks.iter().any(|t| t.id == row.task_id) {
                return Err(StoreError::ForeignKey(format!(
                    "tag link references unknown task '{}'",
                    row.task_id
                )));
            }
            if !data.tags.iter().any(|t| t.id == row.tag_id) {
                return Err(StoreError::ForeignKey(format!(
                    "tag link references unknown tag '{}'",
                    row.tag_id
                )));
            }
        }

        data.task_tags.extend_from_slice(rows);
        self.record_write();
        Ok(rows.len() as u64)
    }
}
