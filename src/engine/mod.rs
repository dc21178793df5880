// src/engine/mod.rs

//! Orchestration engine for lifedag.
//!
//! The pure scheduling semantics live in [`crate::dag::Scheduler`]; this
//! module is the async shell around it:
//! - launching every ready job's action as its own Tokio task
//! - collecting completions over a channel
//! - feeding them back into the scheduler until the run reaches its fixed
//!   point

use crate::dag::JobId;

/// Outcome of a job's action as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    /// Human-readable failure reason.
    Failed(String),
}

/// Options for a single `orchestrate` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestrateOptions {
    /// Validate and report success without running anything.
    pub dry_run: bool,
}

/// Events flowing into the orchestrator from running actions.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A job's action finished.
    JobCompleted {
        job: JobId,
        run_id: u64,
        outcome: JobOutcome,
    },
}

pub mod orchestrator;

pub use orchestrator::Orchestrator;
