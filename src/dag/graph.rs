// src/dag/graph.rs

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::dag::job::{Job, JobId};
use crate::errors::{LifedagError, Result};

/// The workflow graph: jobs plus requirement edges.
///
/// Jobs live in a `petgraph` arena with stable indices; `index` maps the
/// human-readable [`JobId`] onto that arena. Edges point from a dependent
/// job to a job it requires, so:
///
/// - a job with no outgoing edge is an *entry job* (source),
/// - a job with no incoming edge is a *sink* (nothing requires it).
///
/// Structural operations that reshape a whole graph (see `surgery`) return a
/// new `Graph` and leave the receiver untouched.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: StableDiGraph<Job, ()>,
    index: HashMap<JobId, NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from jobs and their requirement lists.
    ///
    /// All jobs are inserted before any edge, so requirements may refer to
    /// jobs appearing later in the iterator. The result is checked for
    /// cycles.
    pub fn from_jobs<I, R>(jobs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Job, R)>,
        R: IntoIterator<Item = JobId>,
    {
        let mut graph = Self::new();
        let mut pending = Vec::new();

        for (job, requirements) in jobs {
            let id = job.id().clone();
            graph.insert(job)?;
            pending.push((id, requirements));
        }

        for (id, requirements) in pending {
            for req in requirements {
                graph.require(id.as_str(), req.as_str())?;
            }
        }

        graph.check_cycles()?;
        Ok(graph)
    }

    /// Add a job with no edges. Ids must be unique.
    pub fn insert(&mut self, job: Job) -> Result<()> {
        if self.index.contains_key(job.id()) {
            return Err(LifedagError::DuplicateJob(job.id().to_string()));
        }
        let id = job.id().clone();
        let ix = self.inner.add_node(job);
        self.index.insert(id, ix);
        Ok(())
    }

    /// Record that `dependent` requires `requirement`.
    ///
    /// Both jobs must already be present. Adding an existing edge again is a
    /// no-op. This does not check for cycles; call [`Graph::check_cycles`]
    /// once all edges are in.
    pub fn require(&mut self, dependent: &str, requirement: &str) -> Result<()> {
        let from = self.key_of(dependent)?;
        let to = self.key_of(requirement)?;
        if from == to {
            return Err(LifedagError::Cycle(dependent.to_string()));
        }
        if self.inner.find_edge(from, to).is_none() {
            self.inner.add_edge(from, to, ());
        }
        Ok(())
    }

    /// Fail with [`LifedagError::Cycle`] if any job transitively requires
    /// itself.
    pub fn check_cycles(&self) -> Result<()> {
        match toposort(&self.inner, None) {
            Ok(_) => Ok(()),
            Err(cycle) => {
                let id = self.inner[cycle.node_id()].id().to_string();
                Err(LifedagError::Cycle(id))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.index.get(id).map(|ix| &self.inner[*ix])
    }

    /// All jobs, in arena order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.inner.node_weights()
    }

    /// Number of requirement edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Jobs that `id` directly requires.
    pub fn requirements_of(&self, id: &str) -> Vec<&JobId> {
        self.neighbours(id, Direction::Outgoing)
    }

    /// Jobs that directly require `id`.
    pub fn dependents_of(&self, id: &str) -> Vec<&JobId> {
        self.neighbours(id, Direction::Incoming)
    }

    /// True if `dependent` directly requires `requirement`.
    pub fn requires(&self, dependent: &str, requirement: &str) -> bool {
        match (self.index.get(dependent), self.index.get(requirement)) {
            (Some(from), Some(to)) => self.inner.find_edge(*from, *to).is_some(),
            _ => false,
        }
    }

    /// Current sources: jobs with no requirements, in topological order.
    pub fn entry_jobs(&self) -> Vec<&Job> {
        self.filtered_in_order(|ix| {
            self.inner
                .neighbors_directed(ix, Direction::Outgoing)
                .next()
                .is_none()
        })
    }

    /// Current sinks: jobs nothing requires, in topological order.
    pub fn sink_jobs(&self) -> Vec<&Job> {
        self.filtered_in_order(|ix| {
            self.inner
                .neighbors_directed(ix, Direction::Incoming)
                .next()
                .is_none()
        })
    }

    /// Jobs ordered so that every job comes after all of its requirements.
    ///
    /// Ties are broken by arena order, so the result is deterministic.
    pub fn topological_order(&self) -> Result<Vec<&Job>> {
        Ok(self
            .ordered_keys()?
            .into_iter()
            .map(|ix| &self.inner[ix])
            .collect())
    }

    pub(crate) fn key_of(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| LifedagError::JobNotFound(id.to_string()))
    }

    pub(crate) fn job_at(&self, ix: NodeIndex) -> &Job {
        &self.inner[ix]
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub(crate) fn requirement_keys(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.neighbors_directed(ix, Direction::Outgoing)
    }

    pub(crate) fn dependent_keys(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.neighbors_directed(ix, Direction::Incoming)
    }

    pub(crate) fn inner_mut(&mut self) -> &mut StableDiGraph<Job, ()> {
        &mut self.inner
    }

    /// Drop index entries whose node is gone from the arena.
    pub(crate) fn reindex(&mut self) {
        let inner = &self.inner;
        self.index.retain(|_, ix| inner.contains_node(*ix));
    }

    /// Kahn's algorithm over requirement counts.
    pub(crate) fn ordered_keys(&self) -> Result<Vec<NodeIndex>> {
        let mut remaining: HashMap<NodeIndex, usize> = self
            .inner
            .node_indices()
            .map(|ix| (ix, self.requirement_keys(ix).count()))
            .collect();

        let mut available: BinaryHeap<Reverse<NodeIndex>> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(ix, _)| Reverse(*ix))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse(ix)) = available.pop() {
            order.push(ix);
            for dependent in self.dependent_keys(ix) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        available.push(Reverse(dependent));
                    }
                }
            }
        }

        if order.len() != self.len() {
            self.check_cycles()?;
        }
        Ok(order)
    }

    fn neighbours(&self, id: &str, dir: Direction) -> Vec<&JobId> {
        let Some(ix) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&JobId> = self
            .inner
            .neighbors_directed(*ix, dir)
            .map(|n| self.inner[n].id())
            .collect();
        ids.sort();
        ids
    }

    fn filtered_in_order(&self, keep: impl Fn(NodeIndex) -> bool) -> Vec<&Job> {
        // Filtering never needs a valid order to be meaningful; fall back to
        // arena order if the graph is (invalidly) cyclic.
        let order = self
            .ordered_keys()
            .unwrap_or_else(|_| self.inner.node_indices().collect());
        order
            .into_iter()
            .filter(|ix| keep(*ix))
            .map(|ix| &self.inner[ix])
            .collect()
    }
}

/// Job listing, one line per job in topological order.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = self.topological_order().map_err(|_| fmt::Error)?;
        writeln!(f, "jobs ({}):", order.len())?;
        for (n, job) in order.iter().enumerate() {
            let kind = if job.is_critical() { "critical" } else { "non-critical" };
            writeln!(f, "  {:>3}. {} [{}] {}", n + 1, job.id(), kind, job.label())?;
            let reqs = self.requirements_of(job.id().as_str());
            if !reqs.is_empty() {
                let reqs: Vec<&str> = reqs.iter().map(|r| r.as_str()).collect();
                writeln!(f, "         after: {}", reqs.join(", "))?;
            }
        }
        Ok(())
    }
}
