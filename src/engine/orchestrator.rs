// src/engine/orchestrator.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::{Debrief, Graph, JobState, ScheduledJob, Scheduler, SchedulerStep};
use crate::errors::Result;
use crate::exec::spawn_job;

use super::{OrchestrateOptions, RuntimeEvent};

/// Runs a workflow graph to completion.
///
/// This is the async IO shell around [`Scheduler`]: the scheduler decides,
/// the orchestrator launches actions and reports their outcomes back. Every
/// ready job is launched at once; there is no concurrency cap.
///
/// The graph is frozen once handed over. Each `orchestrate` call starts a
/// fresh run from `Idle`, so a failed run can simply be retried.
pub struct Orchestrator {
    scheduler: Scheduler,
    options: OrchestrateOptions,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("scheduler", &self.scheduler)
            .field("options", &self.options)
            .finish()
    }
}

impl Orchestrator {
    /// Fails if `graph` is cyclic.
    pub fn new(graph: Graph, options: OrchestrateOptions) -> Result<Self> {
        Ok(Self {
            scheduler: Scheduler::new(graph)?,
            options,
        })
    }

    pub fn graph(&self) -> &Graph {
        self.scheduler.graph()
    }

    pub fn state_of(&self, job: &str) -> Option<JobState> {
        self.scheduler.state_of(job)
    }

    /// Run every job, respecting requirements, until nothing is left to run.
    ///
    /// Returns `true` iff no critical job failed or was skipped. A critical
    /// failure stops new jobs from starting; jobs already running are left to
    /// finish on their own.
    pub async fn orchestrate(&mut self) -> bool {
        if self.options.dry_run {
            info!(
                jobs = self.scheduler.graph().len(),
                "dry run: not starting any job"
            );
            return true;
        }

        let capacity = self.scheduler.graph().len().max(1);
        let (tx, mut rx) = mpsc::channel::<RuntimeEvent>(capacity);

        let step = self.scheduler.start_new_run();
        let run_id = self.scheduler.current_run_id();
        self.dispatch(step, &tx);

        while !self.scheduler.is_finished() {
            if self.scheduler.running_count() == 0 {
                // Nothing in flight can unblock the remaining jobs.
                error!(?run_id, "no job running but run not finished; giving up");
                break;
            }

            let Some(event) = rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };
            debug!(?event, "orchestrator received event");

            match event {
                RuntimeEvent::JobCompleted {
                    job,
                    run_id,
                    outcome,
                } => {
                    let step = self.scheduler.handle_completion(job.as_str(), run_id, outcome);
                    self.dispatch(step, &tx);
                }
            }
        }

        let succeeded = self.scheduler.succeeded();
        info!(?run_id, succeeded, "orchestration finished");
        succeeded
    }

    /// Explanation of the last run's failure (see [`Scheduler::why`]).
    pub fn why(&self) -> String {
        self.scheduler.why()
    }

    /// Per-job terminal states of the last run.
    pub fn debrief(&self) -> Debrief {
        self.scheduler.debrief()
    }

    fn dispatch(&mut self, step: SchedulerStep, tx: &mpsc::Sender<RuntimeEvent>) {
        if !step.newly_skipped.is_empty() {
            debug!(skipped = ?step.newly_skipped, "jobs skipped");
        }

        let ready: Vec<ScheduledJob> = step
            .newly_ready
            .into_iter()
            .filter(|job| self.scheduler.mark_running(job.id.as_str()))
            .collect();

        if ready.is_empty() {
            return;
        }

        let names: Vec<_> = ready.iter().map(|j| j.id.as_str()).collect();
        debug!(?names, "launching ready jobs");

        for job in ready {
            spawn_job(job, tx.clone());
        }
    }
}
