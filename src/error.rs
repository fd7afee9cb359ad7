use std::path::PathBuf;
use thiserror::Error;

use crate::model::DiagnosticStatus;
use crate::runner::AssociationKind;

/// Classification of workflow failures for callers that map errors to
/// transport-level codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    NotReady,
    Other,
}

#[derive(Error, Debug)]
pub enum ActionPlanError {
    #[error("Diagnostic not found: '{0}'")]
    NotFound(String),

    #[error("Partner '{partner_id}' is not authorized for diagnostic '{diagnostic_id}'")]
    Unauthorized {
        diagnostic_id: String,
        partner_id: String,
    },

    #[error("Diagnostic '{diagnostic_id}' is not ready (status: {status})")]
    NotReady {
        diagnostic_id: String,
        status: DiagnosticStatus,
    },

    #[error("Tag '{0}' has no resolved identifier")]
    UnresolvedTag(String),

    #[error("{kind} associations for task '{task_id}': {affected} of {submitted} rows written")]
    AssociationShortfall {
        task_id: String,
        kind: AssociationKind,
        submitted: usize,
        affected: u64,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ActionPlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionPlanError::NotFound(_) => ErrorKind::NotFound,
            ActionPlanError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ActionPlanError::NotReady { .. } => ErrorKind::NotReady,
            _ => ErrorKind::Other,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Foreign key violated: {0}")]
    ForeignKey(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal store error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether repeating the same read may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
