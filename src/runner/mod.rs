mod orchestrator;
mod persist;
mod retry;
mod tags;

pub use orchestrator::{ActionPlanOrchestrator, CreationReport, TierReport};
pub use persist::{
    persist_tier, AssociationKind, AssociationShortfall, PartialWriteHook, TaskWrite,
    WriteLedger, WrittenRows,
};
pub use retry::{retry_read, retry_with_backoff};
pub use tags::{distinct_tag_names, ResolvedTag, TagMap, TagResolver};
