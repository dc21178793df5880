// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::OptionalDefault;

/// Top-level workflow file as read from TOML.
///
/// ```toml
/// [workflow]
/// name = "oai5g demo"
/// prerequisite = "check-lease"
///
/// [anchors]
/// start = ["start-demo"]
/// stop = ["stop-demo"]
/// cleanup = ["cleanup"]
///
/// [job.check-lease]
/// cmd = "rhubarbe leases --check"
///
/// [job.load-images]
/// label = "Load images on worker nodes"
/// cmd = "rhubarbe load 1 2 3 4"
/// optional = "disabled"
/// ```
///
/// Every section except `[job.*]` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub workflow: WorkflowSection,

    #[serde(default)]
    pub anchors: AnchorsSection,

    /// All jobs from `[job.<id>]`, keyed by job id.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// A workflow file that passed validation (see `config::validate`).
///
/// Can only be obtained through `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workflow: WorkflowSection,
    pub anchors: AnchorsSection,
    pub job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        workflow: WorkflowSection,
        anchors: AnchorsSection,
        job: BTreeMap<String, JobConfig>,
    ) -> Self {
        Self {
            workflow,
            anchors,
            job,
        }
    }

    /// Display name of the workflow.
    pub fn name(&self) -> &str {
        self.workflow.name.as_deref().unwrap_or("workflow")
    }
}

/// `[workflow]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowSection {
    #[serde(default)]
    pub name: Option<String>,

    /// Job required by every entry job of whatever graph survives mode
    /// planning. It is kept out of the lifecycle graph itself.
    #[serde(default)]
    pub prerequisite: Option<String>,
}

/// `[anchors]` section: the frontiers the lifecycle modes are cut along.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnchorsSection {
    #[serde(default)]
    pub start: Vec<String>,

    #[serde(default)]
    pub stop: Vec<String>,

    #[serde(default)]
    pub cleanup: Vec<String>,
}

impl AnchorsSection {
    /// All anchors with the name of the list they come from.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &String)> {
        self.start
            .iter()
            .map(|id| ("start", id))
            .chain(self.stop.iter().map(|id| ("stop", id)))
            .chain(self.cleanup.iter().map(|id| ("cleanup", id)))
    }
}

/// `[job.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Human-readable description; defaults to the job id.
    #[serde(default)]
    pub label: Option<String>,

    /// Command line run by the job's action.
    pub cmd: String,

    /// Jobs that must succeed before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// A critical job failing (or being skipped) fails the whole run.
    #[serde(default = "default_critical")]
    pub critical: bool,

    /// Present for steps that can be elided from a run.
    #[serde(default)]
    pub optional: Option<OptionalDefault>,

    /// Extra names `--enable` / `--disable` selectors can match.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_critical() -> bool {
    true
}

impl JobConfig {
    pub fn effective_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(id)
    }
}
