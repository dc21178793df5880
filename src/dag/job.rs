// src/dag/job.rs

//! Jobs and the action capability they carry.

use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

/// Stable, human-chosen identifier of a job (e.g. `"load-images"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Why a job's action did not succeed.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("exited with status {0}")]
    Exited(i32),

    #[error("terminated by a signal")]
    Terminated,

    #[error("could not be launched: {0}")]
    Launch(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

/// Future returned by [`Action::run`].
pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ActionError>> + Send + 'a>>;

/// The opaque unit of work a job performs.
///
/// The orchestrator knows nothing about transports: an action may run a
/// local process, an ssh command, or anything else that eventually reports
/// success or failure.
pub trait Action: Send + Sync {
    fn run(&self) -> ActionFuture<'_>;
}

/// A node of the workflow graph.
///
/// Cloning a job is cheap: the action is shared.
#[derive(Clone)]
pub struct Job {
    id: JobId,
    label: String,
    critical: bool,
    action: Arc<dyn Action>,
}

impl Job {
    /// New critical job whose label defaults to its id.
    pub fn new(id: impl Into<JobId>, action: Arc<dyn Action>) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            critical: true,
            action,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A critical job failing (or being skipped) fails the whole run.
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn action(&self) -> Arc<dyn Action> {
        Arc::clone(&self.action)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("critical", &self.critical)
            .finish_non_exhaustive()
    }
}
