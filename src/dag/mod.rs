// src/dag/mod.rs

//! Workflow graph and per-run scheduling.
//!
//! - [`job`] defines jobs and the [`Action`] capability they carry.
//! - [`graph`] holds the job arena and requirement edges, plus cycle checks.
//! - [`surgery`] derives sub-workflows: extraction, elision, grafting.
//! - [`scheduler`] is the synchronous per-run state machine.
//! - [`job_state`] and [`scheduler_step`] are its state and step types.
//! - [`debrief`] is the post-mortem report.

pub mod debrief;
pub mod graph;
pub mod job;
pub mod job_state;
pub mod scheduler;
pub mod scheduler_step;
pub mod surgery;

pub use debrief::{Debrief, DebriefEntry};
pub use graph::Graph;
pub use job::{Action, ActionError, ActionFuture, Job, JobId};
pub use job_state::{JobState, ScheduledJob, SkipCause};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
