// src/dag/job_state.rs

//! Per-run job state and the description of a job ready to be dispatched.

use std::fmt;
use std::sync::Arc;

use crate::dag::job::{Action, Job, JobId};

/// State of a job within one orchestration run.
///
/// `Idle -> Ready -> Running -> {Succeeded | Failed}`, or `Idle -> Skipped`
/// when a requirement did not succeed or the run was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting for requirements.
    Idle,
    /// All requirements succeeded; about to be dispatched.
    Ready,
    /// Action dispatched and not yet reported back.
    Running,
    Succeeded,
    Failed,
    /// Never ran in this run.
    Skipped,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed | JobState::Skipped)
    }

    /// Terminal, but not a success.
    pub fn is_unsuccessful(self) -> bool {
        matches!(self, JobState::Failed | JobState::Skipped)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Ready => "ready",
            JobState::Running => "running",
            JobState::Succeeded => "ok",
            JobState::Failed => "FAILED",
            JobState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Why a job was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipCause {
    /// This requirement failed or was itself skipped.
    Requirement(JobId),
    /// A critical job failed and no new job may start in this run.
    Aborted(JobId),
}

impl fmt::Display for SkipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCause::Requirement(id) => write!(f, "requirement '{id}' did not succeed"),
            SkipCause::Aborted(id) => write!(f, "run aborted after critical job '{id}' failed"),
        }
    }
}

/// Per-run bookkeeping for one job.
#[derive(Debug, Clone)]
pub(crate) struct JobRecord {
    pub state: JobState,
    /// Failure reason reported by the action.
    pub failure: Option<String>,
    pub skip_cause: Option<SkipCause>,
}

impl JobRecord {
    pub fn idle() -> Self {
        Self {
            state: JobState::Idle,
            failure: None,
            skip_cause: None,
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self.state {
            JobState::Failed => self.failure.clone(),
            JobState::Skipped => self.skip_cause.as_ref().map(|c| c.to_string()),
            _ => None,
        }
    }
}

/// A job the scheduler wants the executor to run now.
#[derive(Clone)]
pub struct ScheduledJob {
    pub id: JobId,
    pub label: String,
    pub critical: bool,
    pub action: Arc<dyn Action>,
    /// All jobs dispatched during the same orchestration share a `run_id`.
    pub run_id: u64,
}

impl ScheduledJob {
    pub fn from_job(job: &Job, run_id: u64) -> Self {
        Self {
            id: job.id().clone(),
            label: job.label().to_string(),
            critical: job.is_critical(),
            action: job.action(),
            run_id,
        }
    }
}

impl fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("id", &self.id)
            .field("critical", &self.critical)
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}
