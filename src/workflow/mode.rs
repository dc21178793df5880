// src/workflow/mode.rs

//! Mapping lifecycle modes onto extraction frontiers.

use crate::dag::JobId;
use crate::errors::{LifedagError, Result};
use crate::types::Mode;

/// Frontiers used by the lifecycle modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchors {
    pub start: Vec<JobId>,
    pub stop: Vec<JobId>,
    pub cleanup: Vec<JobId>,
}

/// Arguments of one `keep_only_between` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunePolicy {
    pub starts: Vec<JobId>,
    pub ends: Vec<JobId>,
    pub keep_ends: bool,
}

impl PrunePolicy {
    /// The policy for `mode`, given the workflow's anchors.
    ///
    /// `start`, `stop` and `cleanup` need their own anchor list; `run` works
    /// without any (an empty `stop` list means "run everything").
    pub fn for_mode(mode: Mode, anchors: &Anchors) -> Result<Self> {
        let policy = match mode {
            Mode::Run => Self {
                starts: Vec::new(),
                ends: anchors.stop.clone(),
                keep_ends: false,
            },
            Mode::Start => Self {
                starts: required(mode, "start", &anchors.start)?,
                ends: anchors.stop.clone(),
                keep_ends: false,
            },
            Mode::Stop => Self {
                starts: required(mode, "stop", &anchors.stop)?,
                ends: anchors.cleanup.clone(),
                keep_ends: false,
            },
            Mode::Cleanup => Self {
                starts: required(mode, "cleanup", &anchors.cleanup)?,
                ends: Vec::new(),
                keep_ends: true,
            },
        };
        Ok(policy)
    }
}

fn required(mode: Mode, list: &str, ids: &[JobId]) -> Result<Vec<JobId>> {
    if ids.is_empty() {
        return Err(LifedagError::ConfigError(format!(
            "mode '{mode}' needs at least one job in [anchors].{list}"
        )));
    }
    Ok(ids.to_vec())
}
