// src/workflow/mod.rs

//! The full lifecycle workflow and how a runnable plan is derived from it.
//!
//! A [`Workflow`] holds one graph describing every step from the initial
//! state to full teardown. [`Workflow::plan`] projects it onto a [`Mode`]:
//!
//! 1. keep only the jobs between the mode's frontiers,
//! 2. elide optional steps that are switched off,
//! 3. make every remaining entry job require the prerequisite,
//! 4. check for cycles.

pub mod mode;
pub mod toggles;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ConfigFile, JobConfig};
use crate::dag::{Action, Graph, Job, JobId};
use crate::errors::{LifedagError, Result};
use crate::types::{Mode, OptionalDefault};

pub use mode::{Anchors, PrunePolicy};
pub use toggles::Toggles;

/// The complete lifecycle graph plus what is needed to carve modes out of it.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    graph: Graph,
    prerequisite: Option<Job>,
    anchors: Anchors,
    optional: HashMap<JobId, OptionalDefault>,
    tags: HashMap<JobId, Vec<String>>,
}

/// A runnable sub-workflow for one mode.
#[derive(Debug, Clone)]
pub struct Plan {
    pub mode: Mode,
    pub graph: Graph,
    /// Optional jobs that were bypassed, in the order they were removed.
    pub elided: Vec<JobId>,
    /// One-line description, e.g. `run mode (skipped: load-images)`.
    pub purpose: String,
    /// The mode that usually follows once this one succeeded.
    pub next: Option<Mode>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, graph: Graph, anchors: Anchors) -> Self {
        Self {
            name: name.into(),
            graph,
            prerequisite: None,
            anchors,
            optional: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    /// Job that every plan's entry jobs will require. It must not be part of
    /// the lifecycle graph.
    pub fn with_prerequisite(mut self, job: Job) -> Result<Self> {
        if self.graph.contains(job.id().as_str()) {
            return Err(LifedagError::DuplicateJob(job.id().to_string()));
        }
        self.prerequisite = Some(job);
        Ok(self)
    }

    /// Mark a job of the lifecycle graph as an optional step.
    pub fn with_optional(mut self, id: impl Into<JobId>, default: OptionalDefault) -> Result<Self> {
        let id = id.into();
        self.graph.key_of(id.as_str())?;
        self.optional.insert(id, default);
        Ok(self)
    }

    /// Extra selector names for a job.
    pub fn with_tags<I, S>(mut self, id: impl Into<JobId>, tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        self.graph.key_of(id.as_str())?;
        self.tags
            .entry(id)
            .or_default()
            .extend(tags.into_iter().map(Into::into));
        Ok(self)
    }

    /// Build a workflow from a validated workflow file.
    ///
    /// `make_action` supplies the action of each job; the binary passes one
    /// that builds a [`crate::exec::ShellAction`] from `cmd`.
    pub fn assemble<F>(cfg: &ConfigFile, mut make_action: F) -> Result<Self>
    where
        F: FnMut(&JobId, &JobConfig) -> Arc<dyn Action>,
    {
        let prereq_id = cfg.workflow.prerequisite.as_deref();
        let mut prerequisite = None;
        let mut lifecycle = Vec::new();

        for (id, jc) in cfg.job.iter() {
            let job_id = JobId::new(id.as_str());
            let job = Job::new(job_id.clone(), make_action(&job_id, jc))
                .with_label(jc.effective_label(id))
                .with_critical(jc.critical);

            if Some(id.as_str()) == prereq_id {
                prerequisite = Some(job);
            } else {
                let reqs: Vec<JobId> = jc.after.iter().map(|r| JobId::new(r.as_str())).collect();
                lifecycle.push((job, reqs));
            }
        }

        let graph = Graph::from_jobs(lifecycle)?;
        let anchors = Anchors {
            start: to_ids(&cfg.anchors.start),
            stop: to_ids(&cfg.anchors.stop),
            cleanup: to_ids(&cfg.anchors.cleanup),
        };

        let mut workflow = Self::new(cfg.name(), graph, anchors);
        if let Some(job) = prerequisite {
            workflow = workflow.with_prerequisite(job)?;
        }
        for (id, jc) in cfg.job.iter() {
            if Some(id.as_str()) == prereq_id {
                continue;
            }
            if let Some(default) = jc.optional {
                workflow = workflow.with_optional(id.as_str(), default)?;
            }
            if !jc.tags.is_empty() {
                workflow = workflow.with_tags(id.as_str(), jc.tags.iter().cloned())?;
            }
        }

        info!(
            workflow = %workflow.name,
            jobs = workflow.graph.len(),
            optional = workflow.optional.len(),
            prerequisite = workflow.prerequisite.is_some(),
            "assembled lifecycle workflow"
        );
        Ok(workflow)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full lifecycle graph (without the prerequisite).
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn anchors(&self) -> &Anchors {
        &self.anchors
    }

    pub fn prerequisite(&self) -> Option<&Job> {
        self.prerequisite.as_ref()
    }

    pub fn is_optional(&self, id: &str) -> bool {
        self.optional.contains_key(id)
    }

    /// Derive the runnable graph for `mode`.
    pub fn plan(&self, mode: Mode, toggles: &Toggles) -> Result<Plan> {
        let policy = PrunePolicy::for_mode(mode, &self.anchors)?;
        let mut graph =
            self.graph
                .keep_only_between(&policy.starts, &policy.ends, policy.keep_ends)?;
        debug!(%mode, kept = graph.len(), "extracted mode subgraph");

        let compiled = toggles.compile()?;
        self.check_selectors(&compiled)?;

        let mut elided = Vec::new();
        let candidates: Vec<JobId> = graph
            .topological_order()?
            .into_iter()
            .map(|job| job.id().clone())
            .filter(|id| self.optional.contains_key(id))
            .collect();

        for id in candidates {
            let default = self.optional[&id];
            let names = self.names_of(&id);
            if !compiled.keeps(&names, default) {
                graph = graph.bypass_and_remove(id.as_str())?;
                info!(job = %id, %mode, "optional job elided");
                elided.push(id);
            }
        }

        if graph.is_empty() {
            return Err(LifedagError::ConfigError(format!(
                "mode '{mode}' leaves no job to run"
            )));
        }

        if let Some(job) = &self.prerequisite {
            graph = graph.with_prerequisite(job.clone())?;
        }
        graph.check_cycles()?;

        let mut purpose = format!("{mode} mode");
        if !elided.is_empty() {
            let names: Vec<&str> = elided.iter().map(|id| id.as_str()).collect();
            purpose.push_str(&format!(" (skipped: {})", names.join(", ")));
        }

        let next = self.next_mode(mode, &elided);
        Ok(Plan {
            mode,
            graph,
            elided,
            purpose,
            next,
        })
    }

    /// `run` stops short of the stop anchors (and before the start anchors
    /// when those were elided); each later mode picks up where the previous
    /// one stopped.
    fn next_mode(&self, mode: Mode, elided: &[JobId]) -> Option<Mode> {
        match mode {
            Mode::Run | Mode::Start if self.anchors.stop.is_empty() => None,
            Mode::Run if self.anchors.start.iter().any(|id| elided.contains(id)) => {
                Some(Mode::Start)
            }
            Mode::Run | Mode::Start => Some(Mode::Stop),
            Mode::Stop if !self.anchors.cleanup.is_empty() => Some(Mode::Cleanup),
            Mode::Stop | Mode::Cleanup => None,
        }
    }

    fn names_of<'a>(&'a self, id: &'a JobId) -> Vec<&'a str> {
        let mut names = vec![id.as_str()];
        if let Some(tags) = self.tags.get(id) {
            names.extend(tags.iter().map(|t| t.as_str()));
        }
        names
    }

    /// Selectors may only reach optional jobs; unmatched ones are reported.
    fn check_selectors(&self, compiled: &toggles::CompiledToggles) -> Result<()> {
        let mut matched: BTreeSet<&str> = BTreeSet::new();

        for job in self.graph.jobs() {
            let names = self.names_of(job.id());
            let mut hits = compiled.enable.matching(&names);
            hits.extend(compiled.disable.matching(&names));
            if hits.is_empty() {
                continue;
            }
            if !self.optional.contains_key(job.id()) {
                return Err(LifedagError::ConfigError(format!(
                    "selector '{}' matches job '{}', which is not optional",
                    hits[0],
                    job.id()
                )));
            }
            matched.extend(hits);
        }

        for pattern in compiled.enable.patterns().chain(compiled.disable.patterns()) {
            if !matched.contains(pattern) {
                warn!(selector = %pattern, "selector matches no optional job");
            }
        }
        Ok(())
    }
}

fn to_ids(ids: &[String]) -> Vec<JobId> {
    ids.iter().map(|id| JobId::new(id.as_str())).collect()
}
