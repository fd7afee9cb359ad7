//! Action plan creation: validate a diagnostic, canonicalize client task
//! identifiers, score tasks against the diagnostic and persist them tier by
//! tier with batch-wide tag deduplication.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod runner;
pub mod store;
pub mod transform;

#[cfg(test)]
mod testing;
