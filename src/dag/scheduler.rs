use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;
use tracing::{debug, error, info, warn};

use crate::dag::debrief::{Debrief, DebriefEntry};
use crate::dag::graph::Graph;
use crate::dag::job::JobId;
use crate::dag::job_state::{JobRecord, JobState, ScheduledJob, SkipCause};
use crate::dag::scheduler_step::SchedulerStep;
use crate::engine::JobOutcome;
use crate::errors::Result;

/// Scheduler holds the (frozen) workflow graph plus mutable per-run state.
///
/// It is a synchronous state machine: it never runs anything itself. It is
/// responsible for:
/// - resetting every job to `Idle` when a run starts
/// - deciding when a job is `Ready` (all requirements succeeded)
/// - skipping jobs whose requirements failed or were skipped
/// - stopping new work once a critical job fails
/// - answering `why` / `debrief` once the run is over
#[derive(Debug)]
pub struct Scheduler {
    graph: Graph,
    /// Topological order, computed once; the graph never changes afterwards.
    order: Vec<NodeIndex>,
    records: HashMap<NodeIndex, JobRecord>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
    /// Critical job whose failure stopped scheduling in this run.
    aborted_by: Option<NodeIndex>,
}

impl Scheduler {
    /// Take ownership of a graph for execution.
    ///
    /// Fails if the graph is cyclic.
    pub fn new(graph: Graph) -> Result<Self> {
        graph.check_cycles()?;
        let order = graph.ordered_keys()?;
        let records = order.iter().map(|ix| (*ix, JobRecord::idle())).collect();

        Ok(Self {
            graph,
            order,
            records,
            run_counter: 0,
            current_run_id: None,
            aborted_by: None,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// ID of the most recent run, finished or not.
    pub fn last_run_id(&self) -> Option<u64> {
        (self.run_counter > 0).then_some(self.run_counter)
    }

    pub fn state_of(&self, job: &str) -> Option<JobState> {
        let ix = self.graph.key_of(job).ok()?;
        self.records.get(&ix).map(|r| r.state)
    }

    /// No job is left `Idle`, `Ready` or `Running`.
    pub fn is_finished(&self) -> bool {
        self.records.values().all(|r| r.state.is_terminal())
    }

    /// Number of jobs currently `Running`.
    pub fn running_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.state == JobState::Running)
            .count()
    }

    /// Overall verdict: no critical job failed or was skipped.
    pub fn succeeded(&self) -> bool {
        self.first_critical_casualty().is_none()
    }

    /// Start a new run: every job goes back to `Idle`, then the jobs with no
    /// requirements become `Ready`.
    pub fn start_new_run(&mut self) -> SchedulerStep {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);
        self.aborted_by = None;

        for record in self.records.values_mut() {
            *record = JobRecord::idle();
        }

        info!(
            run_id = self.run_counter,
            jobs = self.order.len(),
            "scheduler: starting new run"
        );
        self.advance()
    }

    /// Move a `Ready` job to `Running`.
    ///
    /// Returns `false` (and changes nothing) if the job is not `Ready`, e.g.
    /// because the run was aborted after it was collected.
    pub fn mark_running(&mut self, job: &str) -> bool {
        let Ok(ix) = self.graph.key_of(job) else {
            warn!(job = %job, "mark_running for unknown job; ignoring");
            return false;
        };
        match self.records.get_mut(&ix) {
            Some(record) if record.state == JobState::Ready => {
                record.state = JobState::Running;
                true
            }
            _ => false,
        }
    }

    /// Record the outcome of a job's action and work out what happens next.
    pub fn handle_completion(&mut self, job: &str, run_id: u64, outcome: JobOutcome) -> SchedulerStep {
        if self.current_run_id != Some(run_id) {
            warn!(
                job = %job,
                run_id,
                current = ?self.current_run_id,
                "completion for a run that is not active; ignoring"
            );
            return SchedulerStep::default();
        }

        let Ok(ix) = self.graph.key_of(job) else {
            warn!(job = %job, "completion for unknown job; ignoring");
            return SchedulerStep::default();
        };

        let critical = self.graph.job_at(ix).is_critical();
        let Some(record) = self.records.get_mut(&ix) else {
            return SchedulerStep::default();
        };
        if record.state != JobState::Running {
            warn!(job = %job, state = %record.state, "completion for a job that is not running; ignoring");
            return SchedulerStep::default();
        }

        let mut newly_skipped = Vec::new();
        match outcome {
            JobOutcome::Success => {
                record.state = JobState::Succeeded;
                info!(job = %job, run_id, "job succeeded");
            }
            JobOutcome::Failed(reason) => {
                record.state = JobState::Failed;
                record.failure = Some(reason.clone());
                if critical {
                    error!(job = %job, run_id, reason = %reason, "critical job failed; no new job will start");
                    if self.aborted_by.is_none() {
                        self.aborted_by = Some(ix);
                        newly_skipped = self.skip_all_pending(ix);
                    }
                } else {
                    warn!(job = %job, run_id, reason = %reason, "non-critical job failed; skipping its dependents");
                }
            }
        }

        let mut step = self.advance();
        newly_skipped.append(&mut step.newly_skipped);
        step.newly_skipped = newly_skipped;
        step
    }

    /// Short explanation of why the last run failed.
    ///
    /// Names the first critical job, in topological order, that failed or
    /// was skipped. Completion timing never changes the answer; the job
    /// whose failure stopped scheduling is mentioned when it is another one.
    pub fn why(&self) -> String {
        if self.run_counter == 0 {
            return "no run has happened yet".to_string();
        }
        let Some(ix) = self.first_critical_casualty() else {
            return if self.is_finished() {
                "all critical jobs succeeded".to_string()
            } else {
                "run still in progress".to_string()
            };
        };

        let mut why = self.explain(ix);
        if let Some(culprit) = self.aborted_by.filter(|c| *c != ix) {
            let culprit_id = self.graph.job_at(culprit).id();
            let already_named = matches!(
                &self.records[&ix].skip_cause,
                Some(SkipCause::Aborted(id)) if id == culprit_id
            );
            if !already_named {
                why.push_str(&format!(" (run aborted after critical job '{culprit_id}' failed)"));
            }
        }
        why
    }

    /// Per-job terminal state of the last run.
    pub fn debrief(&self) -> Debrief {
        let entries = self
            .order
            .iter()
            .map(|ix| {
                let job = self.graph.job_at(*ix);
                let record = &self.records[ix];
                DebriefEntry {
                    id: job.id().clone(),
                    label: job.label().to_string(),
                    critical: job.is_critical(),
                    state: record.state,
                    detail: record.detail(),
                }
            })
            .collect();

        Debrief {
            run_id: self.last_run_id(),
            succeeded: self.succeeded(),
            entries,
        }
    }

    fn explain(&self, ix: NodeIndex) -> String {
        let job = self.graph.job_at(ix);
        let record = &self.records[&ix];
        let what = match (record.state, record.detail()) {
            (JobState::Failed, Some(detail)) => format!("failed: {detail}"),
            (JobState::Failed, None) => "failed".to_string(),
            (JobState::Skipped, Some(detail)) => format!("was skipped: {detail}"),
            (state, _) => format!("ended in state {state}"),
        };
        format!("critical job '{}' ({}) {}", job.id(), job.label(), what)
    }

    fn first_critical_casualty(&self) -> Option<NodeIndex> {
        self.order.iter().copied().find(|ix| {
            self.graph.job_at(*ix).is_critical() && self.records[ix].state.is_unsuccessful()
        })
    }

    /// Skip every job that has not started yet.
    fn skip_all_pending(&mut self, culprit: NodeIndex) -> Vec<JobId> {
        let culprit_id = self.graph.job_at(culprit).id().clone();
        let mut skipped = Vec::new();

        for ix in &self.order {
            let Some(record) = self.records.get_mut(ix) else {
                continue;
            };
            if matches!(record.state, JobState::Idle | JobState::Ready) {
                record.state = JobState::Skipped;
                record.skip_cause = Some(SkipCause::Aborted(culprit_id.clone()));
                skipped.push(self.graph.job_at(*ix).id().clone());
            }
        }

        if !skipped.is_empty() {
            debug!(culprit = %culprit_id, skipped = skipped.len(), "skipped jobs after critical failure");
        }
        skipped
    }

    /// Propagate the current states one pass in topological order.
    ///
    /// Requirements are visited before their dependents, so a single pass
    /// reaches the fixed point: skips cascade and newly satisfied jobs become
    /// `Ready`.
    fn advance(&mut self) -> SchedulerStep {
        let run_id = self.current_run_id.unwrap_or(0);
        let mut step = SchedulerStep::default();

        for ix in self.order.clone() {
            if self.records[&ix].state != JobState::Idle {
                continue;
            }

            let mut all_succeeded = true;
            let mut blocker = None;
            for req in self.graph.requirement_keys(ix) {
                match self.records[&req].state {
                    JobState::Succeeded => {}
                    JobState::Failed | JobState::Skipped => {
                        blocker = Some(req);
                        break;
                    }
                    _ => all_succeeded = false,
                }
            }

            let job = self.graph.job_at(ix);
            let Some(record) = self.records.get_mut(&ix) else {
                continue;
            };
            if let Some(req) = blocker {
                let req_id = self.graph.job_at(req).id().clone();
                debug!(job = %job.id(), requirement = %req_id, "requirement did not succeed; skipping");
                record.state = JobState::Skipped;
                record.skip_cause = Some(SkipCause::Requirement(req_id));
                step.newly_skipped.push(job.id().clone());
            } else if all_succeeded {
                debug!(job = %job.id(), run_id, "requirements satisfied; marking Ready");
                record.state = JobState::Ready;
                step.newly_ready.push(ScheduledJob::from_job(job, run_id));
            }
        }

        if self.current_run_id.is_some() && self.is_finished() {
            info!(run_id, succeeded = self.succeeded(), "scheduler: all jobs terminal; run finished");
            self.current_run_id = None;
            step.run_just_finished = true;
        }

        step
    }
}
