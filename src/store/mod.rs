//! Persistence seam for the action-plan workflow.
//!
//! The workflow only needs a handful of typed reads and writes; the backend
//! behind them (GraphQL gateway, SQL, in-memory) is an implementation detail.
//! Each write is assumed atomic on its own, nothing more.

mod memory;

pub use crate::error::StoreError;
pub use memory::{
    ActionPlanRow, AnalysisRow, DiagnosticRow, InMemoryStore, ScoreSnapshotRow, StoreSnapshot,
    TagRow,
};

use crate::model::{
    Diagnostic, NewActionPlan, NewTag, NewTask, SuggestedTask, TaskAssignee, TaskTagLink,
};
use async_trait::async_trait;

#[async_trait]
pub trait ActionPlanStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Diagnostic with its analysis partner and aggregate indicator scores
    async fn fetch_diagnostic(&self, id: &str) -> Result<Option<Diagnostic>, StoreError>;

    /// Templates for the given ids; unknown ids are simply absent
    async fn fetch_suggested_tasks(&self, ids: &[String])
        -> Result<Vec<SuggestedTask>, StoreError>;

    async fn find_tag(&self, name: &str, partner_id: &str) -> Result<Option<String>, StoreError>;

    /// Returns the store-assigned plan id
    async fn create_action_plan(&self, plan: &NewActionPlan) -> Result<String, StoreError>;

    async fn create_task(&self, task: &NewTask) -> Result<String, StoreError>;

    /// Fails with `StoreError::Conflict` when (name, partner) already exists
    async fn create_tag(&self, tag: &NewTag) -> Result<String, StoreError>;

    /// Returns the affected row count
    async fn create_task_assignees(&self, rows: &[TaskAssignee]) -> Result<u64, StoreError>;

    /// Returns the affected row count
    async fn create_task_tags(&self, rows: &[TaskTagLink]) -> Result<u64, StoreError>;
}
