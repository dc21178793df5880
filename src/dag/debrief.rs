// src/dag/debrief.rs

//! Post-mortem report of a run.

use std::fmt;

use crate::dag::job::JobId;
use crate::dag::job_state::JobState;

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebriefEntry {
    pub id: JobId,
    pub label: String,
    pub critical: bool,
    pub state: JobState,
    /// Failure reason or skip cause, when there is one.
    pub detail: Option<String>,
}

/// Per-job outcome of the last run, in topological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debrief {
    /// `None` if no run has happened yet.
    pub run_id: Option<u64>,
    pub succeeded: bool,
    pub entries: Vec<DebriefEntry>,
}

impl Debrief {
    pub fn entry(&self, id: &str) -> Option<&DebriefEntry> {
        self.entries.iter().find(|e| e.id.as_str() == id)
    }

    pub fn count(&self, state: JobState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }
}

impl fmt::Display for Debrief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.run_id {
            Some(run_id) => writeln!(
                f,
                "debrief of run {run_id}: {}",
                if self.succeeded { "OK" } else { "KO" }
            )?,
            None => writeln!(f, "debrief: no run yet")?,
        }

        let width = self
            .entries
            .iter()
            .map(|e| e.id.as_str().len())
            .max()
            .unwrap_or(0);

        for e in &self.entries {
            let marker = if e.critical { '*' } else { ' ' };
            write!(f, "  {marker} {:<width$}  {:<8} {}", e.id.as_str(), e.state.to_string(), e.label)?;
            if let Some(detail) = &e.detail {
                write!(f, " ({detail})")?;
            }
            writeln!(f)?;
        }

        writeln!(
            f,
            "  {} ok, {} failed, {} skipped (* = critical)",
            self.count(JobState::Succeeded),
            self.count(JobState::Failed),
            self.count(JobState::Skipped)
        )
    }
}
