#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use lifedag::config::{AnchorsSection, ConfigFile, JobConfig, RawConfigFile, WorkflowSection};
use lifedag::dag::{Action, Graph, Job, JobId};
use lifedag::types::OptionalDefault;

use crate::fake_action::{CallLog, ScriptedAction};

/// Builder for `Graph` whose jobs run [`ScriptedAction`]s sharing one log.
pub struct GraphBuilder {
    entries: Vec<(Job, Vec<JobId>)>,
    log: CallLog,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            entries: Vec::new(),
            log,
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// A critical job that succeeds.
    pub fn job(self, id: &str, after: &[&str]) -> Self {
        let action = ScriptedAction::succeed(id, self.log.clone());
        self.job_with(id, after, action)
    }

    /// A critical job that fails with exit code 1.
    pub fn failing(self, id: &str, after: &[&str]) -> Self {
        let action = ScriptedAction::failing(id, self.log.clone());
        self.job_with(id, after, action)
    }

    pub fn job_with(mut self, id: &str, after: &[&str], action: ScriptedAction) -> Self {
        let action: Arc<dyn Action> = Arc::new(action);
        self.entries.push((Job::new(id, action), ids(after)));
        self
    }

    /// Mark an already added job as non-critical.
    pub fn non_critical(mut self, id: &str) -> Self {
        let entry = self
            .entries
            .iter_mut()
            .find(|(job, _)| job.id().as_str() == id)
            .expect("non_critical: unknown job");
        entry.0 = entry.0.clone().with_critical(false);
        self
    }

    pub fn build(self) -> Graph {
        Graph::from_jobs(self.entries).expect("Failed to build valid graph from builder")
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                workflow: WorkflowSection::default(),
                anchors: AnchorsSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.config.workflow.name = Some(name.to_string());
        self
    }

    pub fn prerequisite(mut self, id: &str) -> Self {
        self.config.workflow.prerequisite = Some(id.to_string());
        self
    }

    pub fn start_anchor(mut self, id: &str) -> Self {
        self.config.anchors.start.push(id.to_string());
        self
    }

    pub fn stop_anchor(mut self, id: &str) -> Self {
        self.config.anchors.stop.push(id.to_string());
        self
    }

    pub fn cleanup_anchor(mut self, id: &str) -> Self {
        self.config.anchors.cleanup.push(id.to_string());
        self
    }

    pub fn with_job(mut self, id: &str, job: JobConfig) -> Self {
        self.config.job.insert(id.to_string(), job);
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            job: JobConfig {
                label: None,
                cmd: cmd.to_string(),
                after: vec![],
                critical: true,
                optional: None,
                tags: vec![],
            },
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.job.label = Some(label.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn non_critical(mut self) -> Self {
        self.job.critical = false;
        self
    }

    pub fn optional(mut self, default: OptionalDefault) -> Self {
        self.job.optional = Some(default);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.job.tags.push(tag.to_string());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

/// Action factory for `Workflow::assemble` that turns each job's `cmd` into
/// a [`ScriptedAction`] (see [`ScriptedAction::from_cmd`]).
pub fn scripted_factory(log: CallLog) -> impl FnMut(&JobId, &JobConfig) -> Arc<dyn Action> {
    move |id: &JobId, job: &JobConfig| -> Arc<dyn Action> {
        Arc::new(ScriptedAction::from_cmd(id.as_str(), &job.cmd, log.clone()))
    }
}

pub fn ids(names: &[&str]) -> Vec<JobId> {
    names.iter().map(|n| JobId::new(*n)).collect()
}

/// Job ids of a graph, sorted.
pub fn job_names(graph: &Graph) -> Vec<String> {
    let mut names: Vec<String> = graph.jobs().map(|j| j.id().to_string()).collect();
    names.sort();
    names
}
