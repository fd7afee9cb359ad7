use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub template_lookup: TemplateLookup,

    /// Fail the workflow when an association batch writes fewer rows than submitted
    #[serde(default)]
    pub strict_association_counts: bool,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ScoringConfig {
    /// Ceiling of an indicator score
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_score: default_max_score(),
        }
    }
}

/// How suggested-task templates are fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateLookup {
    /// One concurrent lookup per task
    #[default]
    PerTask,
    /// A single lookup for every distinct template id
    Batched,
}

impl std::fmt::Display for TemplateLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateLookup::PerTask => write!(f, "per_task"),
            TemplateLookup::Batched => write!(f, "batched"),
        }
    }
}

/// Backoff for transient read failures; writes are never retried
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}
