// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

/// Errors raised while loading, assembling or reshaping a workflow.
///
/// Everything here is a construction-time failure: it is reported before
/// any job runs. Failures of individual job actions are *not* errors at this
/// level; they are recorded on the job (see [`crate::dag::ActionError`]).
#[derive(Error, Debug)]
pub enum LifedagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Duplicate job id: {0}")]
    DuplicateJob(String),

    #[error("Cycle detected in workflow involving job '{0}'")]
    Cycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LifedagError>;
