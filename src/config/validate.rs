// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LifedagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LifedagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.workflow, raw.anchors, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_job_requirements(cfg)?;
    validate_prerequisite(cfg)?;
    validate_anchors(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(LifedagError::ConfigError(
            "workflow must contain at least one [job.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_requirements(cfg: &RawConfigFile) -> Result<()> {
    for (id, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            if !cfg.job.contains_key(dep) {
                return Err(LifedagError::ConfigError(format!(
                    "job '{}' has unknown requirement '{}' in `after`",
                    id, dep
                )));
            }
            if dep == id {
                return Err(LifedagError::ConfigError(format!(
                    "job '{}' cannot require itself in `after`",
                    id
                )));
            }
        }
    }
    Ok(())
}

fn validate_prerequisite(cfg: &RawConfigFile) -> Result<()> {
    let Some(prereq) = cfg.workflow.prerequisite.as_deref() else {
        return Ok(());
    };

    let Some(job) = cfg.job.get(prereq) else {
        return Err(LifedagError::ConfigError(format!(
            "[workflow].prerequisite names unknown job '{}'",
            prereq
        )));
    };

    if !job.after.is_empty() {
        return Err(LifedagError::ConfigError(format!(
            "prerequisite job '{}' cannot have requirements in `after`",
            prereq
        )));
    }
    if job.optional.is_some() {
        return Err(LifedagError::ConfigError(format!(
            "prerequisite job '{}' cannot be optional",
            prereq
        )));
    }

    if let Some((id, _)) = cfg
        .job
        .iter()
        .find(|(_, j)| j.after.iter().any(|dep| dep == prereq))
    {
        return Err(LifedagError::ConfigError(format!(
            "job '{}' lists prerequisite '{}' in `after`; it is attached to entry jobs automatically",
            id, prereq
        )));
    }

    Ok(())
}

fn validate_anchors(cfg: &RawConfigFile) -> Result<()> {
    for (list, id) in cfg.anchors.iter() {
        if !cfg.job.contains_key(id) {
            return Err(LifedagError::ConfigError(format!(
                "[anchors].{} names unknown job '{}'",
                list, id
            )));
        }
        if cfg.workflow.prerequisite.as_deref() == Some(id.as_str()) {
            return Err(LifedagError::ConfigError(format!(
                "[anchors].{} cannot name the prerequisite job '{}'",
                list, id
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction matches the workflow graph: job -> requirement.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in cfg.job.keys() {
        graph.add_node(id.as_str());
    }

    for (id, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            graph.add_edge(id.as_str(), dep.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(LifedagError::Cycle(cycle.node_id().to_string())),
    }
}
