//! Domain types shared by the transformation stage, the store and the CLI.

mod diagnostic;
mod payload;
mod records;

pub use diagnostic::{ActingUser, Diagnostic, DiagnosticStatus, IndicatorScore};
pub use payload::{AssigneeType, CreateActionPlanPayload, CreateTaskPayload, PlannedTask};
pub use records::{NewActionPlan, NewTag, NewTask, SuggestedTask, TaskAssignee, TaskTagLink};
