//! Tier-by-tier task persistence and the record of what has been written.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::ActionPlanError;
use crate::model::{NewTask, PlannedTask, TaskAssignee, TaskTagLink};
use crate::store::ActionPlanStore;

use super::tags::TagMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    Assignee,
    Tag,
}

impl std::fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationKind::Assignee => write!(f, "assignee"),
            AssociationKind::Tag => write!(f, "tag"),
        }
    }
}

/// An association batch that wrote fewer (or more) rows than submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationShortfall {
    pub task_id: String,
    pub kind: AssociationKind,
    pub submitted: usize,
    pub affected: u64,
}

impl AssociationShortfall {
    fn into_error(self) -> ActionPlanError {
        ActionPlanError::AssociationShortfall {
            task_id: self.task_id,
            kind: self.kind,
            submitted: self.submitted,
            affected: self.affected,
        }
    }
}

/// Rows written so far by one workflow run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WrittenRows {
    pub action_plan_id: Option<String>,
    pub created_tag_ids: Vec<String>,
    pub task_ids: Vec<String>,
    pub assignee_rows: u64,
    pub tag_rows: u64,
}

impl WrittenRows {
    pub fn is_empty(&self) -> bool {
        self.action_plan_id.is_none() && self.created_tag_ids.is_empty()
    }
}

/// Append-only record of successful writes, shared by concurrent branches
#[derive(Debug, Default)]
pub struct WriteLedger {
    rows: Mutex<WrittenRows>,
}

impl WriteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, WrittenRows> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_plan(&self, id: &str) {
        self.rows().action_plan_id = Some(id.to_string());
    }

    pub fn record_tag(&self, id: &str) {
        self.rows().created_tag_ids.push(id.to_string());
    }

    pub fn record_task(&self, id: &str) {
        self.rows().task_ids.push(id.to_string());
    }

    pub fn record_associations(&self, kind: AssociationKind, affected: u64) {
        let mut rows = self.rows();
        match kind {
            AssociationKind::Assignee => rows.assignee_rows += affected,
            AssociationKind::Tag => rows.tag_rows += affected,
        }
    }

    pub fn snapshot(&self) -> WrittenRows {
        self.rows().clone()
    }
}

/// Extension point invoked when the workflow fails after its first write.
///
/// The workflow never rolls back on its own; an implementation may delete
/// the listed rows, enqueue a cleanup job, or alert.
#[async_trait]
pub trait PartialWriteHook: Send + Sync {
    async fn on_partial_write(&self, written: &WrittenRows, error: &ActionPlanError);
}

/// Outcome of persisting one task and its associations
#[derive(Debug, Clone, PartialEq)]
pub struct TaskWrite {
    pub task_id: String,
    pub shortfalls: Vec<AssociationShortfall>,
}

/// Persist one tier: every task concurrently, each followed by its
/// assignee and tag associations.
///
/// All branches run to completion; the first failure (in task order) is
/// returned once the tier has settled.
pub async fn persist_tier(
    store: &dyn ActionPlanStore,
    tasks: &[PlannedTask],
    action_plan_id: &str,
    tags: &TagMap,
    ledger: &WriteLedger,
    strict_counts: bool,
) -> Result<Vec<TaskWrite>, ActionPlanError> {
    let results = join_all(
        tasks
            .iter()
            .map(|task| persist_task(store, task, action_plan_id, tags, ledger, strict_counts)),
    )
    .await;

    results.into_iter().collect()
}

async fn persist_task(
    store: &dyn ActionPlanStore,
    task: &PlannedTask,
    action_plan_id: &str,
    tags: &TagMap,
    ledger: &WriteLedger,
    strict_counts: bool,
) -> Result<TaskWrite, ActionPlanError> {
    let tag_ids = task
        .tags
        .iter()
        .map(|name| {
            tags.get(name)
                .map(|tag| tag.id.clone())
                .ok_or_else(|| ActionPlanError::UnresolvedTag(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let task_id = store
        .create_task(&NewTask::from_planned(task, action_plan_id))
        .await?;
    ledger.record_task(&task_id);
    debug!("Persisted task {} ({})", task_id, task.name);

    let mut shortfalls = Vec::new();

    if !task.assignees.is_empty() {
        let rows: Vec<TaskAssignee> = task
            .assignees
            .iter()
            .map(|user_id| TaskAssignee {
                task_id: task_id.clone(),
                user_id: user_id.clone(),
            })
            .collect();
        let affected = store.create_task_assignees(&rows).await?;
        ledger.record_associations(AssociationKind::Assignee, affected);
        if let Some(shortfall) =
            check_count(&task_id, AssociationKind::Assignee, rows.len(), affected, strict_counts)?
        {
            shortfalls.push(shortfall);
        }
    }

    if !tag_ids.is_empty() {
        let rows: Vec<TaskTagLink> = tag_ids
            .into_iter()
            .map(|tag_id| TaskTagLink {
                task_id: task_id.clone(),
                tag_id,
            })
            .collect();
        let affected = store.create_task_tags(&rows).await?;
        ledger.record_associations(AssociationKind::Tag, affected);
        if let Some(shortfall) =
            check_count(&task_id, AssociationKind::Tag, rows.len(), affected, strict_counts)?
        {
            shortfalls.push(shortfall);
        }
    }

    Ok(TaskWrite {
        task_id,
        shortfalls,
    })
}

fn check_count(
    task_id: &str,
    kind: AssociationKind,
    submitted: usize,
    affected: u64,
    strict: bool,
) -> Result<Option<AssociationShortfall>, ActionPlanError> {
    if affected == submitted as u64 {
        return Ok(None);
    }

    let shortfall = AssociationShortfall {
        task_id: task_id.to_string(),
        kind,
        submitted,
        affected,
    };
    if strict {
        return Err(shortfall.into_error());
    }
    warn!(
        "Task {}: {} of {} {} associations written",
        task_id, affected, submitted, kind
    );
    Ok(Some(shortfall))
}
