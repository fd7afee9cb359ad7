//! Pure transformation of a client task batch into write-ready tiers:
//! identifier canonicalization, score computation, tier partitioning.

pub mod remap;
pub mod score;
pub mod tiers;

pub use remap::{remap_task_ids, IdentifierRemapper};
pub use score::{HeadroomFormula, ScoreCalculator, ScoringFormula};
pub use tiers::{NestedReference, Tier, TierPlan};
