//! Canonicalization of client-chosen task identifiers.
//!
//! Client ids are provisional and scoped to one submitted batch. Every id
//! value seen in the batch (own id, parent reference, original reference) is
//! substituted through a single old -> new map built lazily during one pass,
//! so references keep pointing at the same task after the rewrite.

use std::collections::{HashMap, HashSet};
use tracing::warn;
use uuid::Uuid;

use crate::model::{CreateTaskPayload, PlannedTask};

pub fn new_canonical_id() -> String {
    Uuid::new_v4().to_string()
}

pub struct IdentifierRemapper<G = fn() -> String> {
    id_map: HashMap<String, String>,
    generate: G,
}

impl IdentifierRemapper {
    pub fn new() -> Self {
        Self::with_generator(new_canonical_id)
    }
}

impl Default for IdentifierRemapper {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: FnMut() -> String> IdentifierRemapper<G> {
    pub fn with_generator(generate: G) -> Self {
        Self {
            id_map: HashMap::new(),
            generate,
        }
    }

    /// Canonical id for a client id; absent stays absent
    pub fn resolve(&mut self, client_id: Option<&str>) -> Option<String> {
        let client_id = client_id?;
        if let Some(mapped) = self.id_map.get(client_id) {
            return Some(mapped.clone());
        }
        let fresh = (self.generate)();
        self.id_map.insert(client_id.to_string(), fresh.clone());
        Some(fresh)
    }

    /// Rewrite `id`, `original_task_id` and `parent_task_id` of every task.
    ///
    /// Tasks without a client id, and repeated declarations of the same client
    /// id, get a fresh id of their own. References that do not resolve to a
    /// task of this batch, or that point a task at itself, are cleared.
    pub fn remap(mut self, tasks: &[CreateTaskPayload]) -> Vec<PlannedTask> {
        let mut declared: HashSet<String> = HashSet::with_capacity(tasks.len());
        let mut planned = Vec::with_capacity(tasks.len());

        for task in tasks {
            let id = match self.resolve(task.id.as_deref()) {
                Some(canonical) if !declared.contains(&canonical) => canonical,
                Some(_) => {
                    warn!(
                        "Client task id '{}' is declared more than once; assigning a fresh id",
                        task.id.as_deref().unwrap_or_default()
                    );
                    (self.generate)()
                }
                None => (self.generate)(),
            };
            declared.insert(id.clone());

            let original_task_id = self.resolve(task.original_task_id.as_deref());
            let parent_task_id = self.resolve(task.parent_task_id.as_deref());

            planned.push(PlannedTask::from_payload(
                task,
                id,
                original_task_id,
                parent_task_id,
            ));
        }

        for task in &mut planned {
            if clear_self_reference(&mut task.parent_task_id, &task.id) {
                warn!("Task '{}' names itself as parent; reference dropped", task.name);
            }
            if clear_self_reference(&mut task.original_task_id, &task.id) {
                warn!(
                    "Task '{}' names itself as original task; reference dropped",
                    task.name
                );
            }
            if clear_dangling(&mut task.parent_task_id, &declared) {
                warn!(
                    "Task '{}' references a parent outside the batch; reference dropped",
                    task.name
                );
            }
            if clear_dangling(&mut task.original_task_id, &declared) {
                warn!(
                    "Task '{}' references an original task outside the batch; reference dropped",
                    task.name
                );
            }
        }

        planned
    }
}

fn clear_dangling(reference: &mut Option<String>, declared: &HashSet<String>) -> bool {
    match reference {
        Some(id) if !declared.contains(id.as_str()) => {
            *reference = None;
            true
        }
        _ => false,
    }
}

fn clear_self_reference(reference: &mut Option<String>, own_id: &str) -> bool {
    if reference.as_deref() == Some(own_id) {
        *reference = None;
        return true;
    }
    false
}

/// Remap a batch with freshly generated UUIDs
pub fn remap_task_ids(tasks: &[CreateTaskPayload]) -> Vec<PlannedTask> {
    IdentifierRemapper::new().remap(tasks)
}
