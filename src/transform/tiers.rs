//! Three-way dependency classification of planned tasks.
//!
//! Tasks are written tier by tier so that every parent/original reference
//! points at a row that already exists: independent tasks first, then tasks
//! derived from an original, then sub-tasks.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::PlannedTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// No parent, no original
    Independent,
    /// Has an original, no parent
    Derived,
    /// Has a parent, with or without an original
    Subtask,
}

impl Tier {
    pub const ORDER: [Tier; 3] = [Tier::Independent, Tier::Derived, Tier::Subtask];

    pub fn of(task: &PlannedTask) -> Tier {
        if task.parent_task_id.is_some() {
            Tier::Subtask
        } else if task.original_task_id.is_some() {
            Tier::Derived
        } else {
            Tier::Independent
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Independent => write!(f, "independent"),
            Tier::Derived => write!(f, "derived"),
            Tier::Subtask => write!(f, "subtask"),
        }
    }
}

/// Tasks grouped by tier, each group in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct TierPlan {
    pub independent: Vec<PlannedTask>,
    pub derived: Vec<PlannedTask>,
    pub subtasks: Vec<PlannedTask>,
}

/// A task whose parent or original lives in its own tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedReference {
    pub task_id: String,
    pub referenced_id: String,
    pub tier: Tier,
}

impl TierPlan {
    /// Stable single-pass partition
    pub fn partition(tasks: Vec<PlannedTask>) -> Self {
        let mut plan = TierPlan::default();
        for task in tasks {
            match Tier::of(&task) {
                Tier::Independent => plan.independent.push(task),
                Tier::Derived => plan.derived.push(task),
                Tier::Subtask => plan.subtasks.push(task),
            }
        }
        plan
    }

    pub fn tier(&self, tier: Tier) -> &[PlannedTask] {
        match tier {
            Tier::Independent => &self.independent,
            Tier::Derived => &self.derived,
            Tier::Subtask => &self.subtasks,
        }
    }

    /// Tiers in write order
    pub fn tiers(&self) -> impl Iterator<Item = (Tier, &[PlannedTask])> {
        Tier::ORDER.into_iter().map(move |tier| (tier, self.tier(tier)))
    }

    pub fn len(&self) -> usize {
        self.independent.len() + self.derived.len() + self.subtasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tasks(&self) -> impl Iterator<Item = &PlannedTask> {
        self.independent
            .iter()
            .chain(&self.derived)
            .chain(&self.subtasks)
    }

    /// References the three-tier order cannot satisfy.
    ///
    /// Tasks of one tier are written concurrently, so a sub-task whose parent
    /// is itself a sub-task (or a derived task whose original is derived) has
    /// no guarantee its target row exists when it is inserted. Self
    /// references are dropped during remapping and are not reported.
    pub fn nested_references(&self) -> Vec<NestedReference> {
        let tier_of: HashMap<&str, Tier> = self
            .tiers()
            .flat_map(|(tier, tasks)| tasks.iter().map(move |t| (t.id.as_str(), tier)))
            .collect();

        let mut nested = Vec::new();
        for (tier, tasks) in self.tiers() {
            for task in tasks {
                let references = [&task.parent_task_id, &task.original_task_id];
                for referenced in references.into_iter().flatten() {
                    if referenced != &task.id && tier_of.get(referenced.as_str()) == Some(&tier) {
                        nested.push(NestedReference {
                            task_id: task.id.clone(),
                            referenced_id: referenced.clone(),
                            tier,
                        });
                    }
                }
            }
        }
        nested
    }
}
