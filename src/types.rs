use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Which part of the lifecycle to run.
///
/// Each mode is a projection of the single full lifecycle graph, bounded by
/// the `[anchors]` of the workflow file:
///
/// - `Run`: from the very beginning up to (excluding) the `stop` anchors.
/// - `Start`: from the `start` anchors up to (excluding) the `stop` anchors.
/// - `Stop`: from the `stop` anchors up to (excluding) the `cleanup` anchors.
/// - `Cleanup`: from the `cleanup` anchors to the very end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    Start,
    Stop,
    Cleanup,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Run
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Run => "run",
            Mode::Start => "start",
            Mode::Stop => "stop",
            Mode::Cleanup => "cleanup",
        };
        f.write_str(s)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run" => Ok(Mode::Run),
            "start" => Ok(Mode::Start),
            "stop" => Ok(Mode::Stop),
            "cleanup" => Ok(Mode::Cleanup),
            other => Err(format!(
                "invalid mode: {other} (expected \"run\", \"start\", \"stop\" or \"cleanup\")"
            )),
        }
    }
}

/// Whether an optional job takes part in a run when no selector mentions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionalDefault {
    /// Kept unless disabled on the command line.
    Enabled,
    /// Elided unless enabled on the command line.
    Disabled,
}
