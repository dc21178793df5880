// src/workflow/toggles.rs

//! Command-line selection of optional steps.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{LifedagError, Result};
use crate::types::OptionalDefault;

/// `--enable` / `--disable` selectors as given on the command line.
///
/// Each selector is a glob matched against job ids and tags, e.g.
/// `load-images`, `leave-join-*` or a tag such as `k8s-reset`.
#[derive(Debug, Clone, Default)]
pub struct Toggles {
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}

impl Toggles {
    pub(crate) fn compile(&self) -> Result<CompiledToggles> {
        Ok(CompiledToggles {
            enable: Selectors::new(&self.enable)?,
            disable: Selectors::new(&self.disable)?,
        })
    }
}

pub(crate) struct CompiledToggles {
    pub enable: Selectors,
    pub disable: Selectors,
}

impl CompiledToggles {
    /// Whether an optional job stays in the run. Disabling wins over
    /// enabling.
    pub fn keeps(&self, names: &[&str], default: OptionalDefault) -> bool {
        if self.disable.matches_any(names) {
            false
        } else if self.enable.matches_any(names) {
            true
        } else {
            default == OptionalDefault::Enabled
        }
    }
}

/// A compiled list of glob selectors that remembers which ones matched.
pub(crate) struct Selectors {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Selectors {
    fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for p in patterns {
            let glob = Glob::new(p).map_err(|e| {
                LifedagError::ConfigError(format!("invalid job selector '{}': {}", p, e))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| LifedagError::ConfigError(format!("invalid job selectors: {e}")))?;

        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn matches_any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.set.is_match(n))
    }

    /// Selectors that match at least one of `names`.
    pub fn matching(&self, names: &[&str]) -> Vec<&str> {
        let mut hits: Vec<usize> = names
            .iter()
            .flat_map(|n| self.set.matches(n))
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(|i| self.patterns[i].as_str()).collect()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|s| s.as_str())
    }
}
