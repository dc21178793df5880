// src/dag/surgery.rs

//! Structural operations that derive a runnable sub-workflow from the full
//! lifecycle graph.
//!
//! Every operation here takes `&self` and returns a fresh [`Graph`], so a
//! single lifecycle graph can be projected into any mode without being
//! rebuilt.

use std::collections::HashSet;

use petgraph::stable_graph::NodeIndex;
use tracing::debug;

use crate::dag::graph::Graph;
use crate::dag::job::{Job, JobId};
use crate::errors::Result;

impl Graph {
    /// Keep only the jobs lying between a start frontier and an end frontier.
    ///
    /// - `starts` keeps the start jobs and everything that (transitively)
    ///   requires them. Empty means no forward restriction.
    /// - `ends` keeps the end jobs and everything they (transitively)
    ///   require. Empty means no backward restriction.
    /// - with `keep_ends == false` the end jobs themselves are dropped, their
    ///   ancestors stay.
    ///
    /// Edges touching a dropped job go with it. An empty result is returned
    /// as-is; deciding whether that is acceptable is up to the caller.
    pub fn keep_only_between(
        &self,
        starts: &[JobId],
        ends: &[JobId],
        keep_ends: bool,
    ) -> Result<Graph> {
        let start_keys = self.keys_for(starts)?;
        let end_keys = self.keys_for(ends)?;

        let down = if start_keys.is_empty() {
            self.keys().collect()
        } else {
            self.closure(&start_keys, |g, ix| g.dependent_keys(ix).collect())
        };
        let up = if end_keys.is_empty() {
            self.keys().collect()
        } else {
            self.closure(&end_keys, |g, ix| g.requirement_keys(ix).collect())
        };

        let mut kept: HashSet<NodeIndex> = down.intersection(&up).copied().collect();
        if !keep_ends {
            for ix in &end_keys {
                kept.remove(ix);
            }
        }

        let mut pruned = self.clone();
        pruned.inner_mut().retain_nodes(|_, ix| kept.contains(&ix));
        pruned.reindex();

        debug!(
            before = self.len(),
            after = pruned.len(),
            keep_ends,
            "kept jobs between frontiers"
        );
        debug_assert!(pruned.check_cycles().is_ok());
        Ok(pruned)
    }

    /// Remove `id` while preserving ordering between its neighbours.
    ///
    /// Every job that required `id` now directly requires each job `id`
    /// required (without duplicating an edge that already exists).
    pub fn bypass_and_remove(&self, id: &str) -> Result<Graph> {
        let target = self.key_of(id)?;
        let dependents: Vec<NodeIndex> = self.dependent_keys(target).collect();
        let requirements: Vec<NodeIndex> = self.requirement_keys(target).collect();

        let mut elided = self.clone();
        let inner = elided.inner_mut();
        for p in &dependents {
            for q in &requirements {
                if inner.find_edge(*p, *q).is_none() {
                    inner.add_edge(*p, *q, ());
                }
            }
        }
        inner.remove_node(target);
        elided.reindex();

        debug!(
            job = %id,
            dependents = dependents.len(),
            requirements = requirements.len(),
            "bypassed and removed job"
        );
        debug_assert!(elided.check_cycles().is_ok());
        Ok(elided)
    }

    /// Insert `job` and make every current entry job require it.
    ///
    /// This gates whatever survived pruning behind a single shared
    /// precondition.
    pub fn with_prerequisite(&self, job: Job) -> Result<Graph> {
        let entries: Vec<JobId> = self.entry_jobs().iter().map(|j| j.id().clone()).collect();
        let prerequisite = job.id().clone();

        let mut grafted = self.clone();
        grafted.insert(job)?;
        for entry in &entries {
            grafted.require(entry.as_str(), prerequisite.as_str())?;
        }

        debug!(
            job = %prerequisite,
            entries = entries.len(),
            "grafted prerequisite onto entry jobs"
        );
        grafted.check_cycles()?;
        Ok(grafted)
    }

    fn keys_for(&self, ids: &[JobId]) -> Result<Vec<NodeIndex>> {
        ids.iter().map(|id| self.key_of(id.as_str())).collect()
    }

    /// `seeds` plus every job reachable from them through `next`.
    fn closure(
        &self,
        seeds: &[NodeIndex],
        next: impl Fn(&Graph, NodeIndex) -> Vec<NodeIndex>,
    ) -> HashSet<NodeIndex> {
        let mut stack: Vec<NodeIndex> = seeds.to_vec();
        let mut visited: HashSet<NodeIndex> = HashSet::new();

        while let Some(ix) = stack.pop() {
            if !visited.insert(ix) {
                continue;
            }
            stack.extend(next(self, ix));
        }

        visited
    }
}
