// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::job::JobId;
use crate::dag::job_state::ScheduledJob;

/// Structured result of a single scheduler "step".
///
/// The orchestrator dispatches `newly_ready`; tests can step the scheduler
/// by hand and assert on the rest.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Jobs whose requirements are now all satisfied.
    pub newly_ready: Vec<ScheduledJob>,
    /// Jobs newly marked `Skipped` in this step.
    pub newly_skipped: Vec<JobId>,
    /// Whether this step brought the run to its fixed point.
    pub run_just_finished: bool,
}
