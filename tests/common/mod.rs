#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

use lifedag_test_utils::builders::GraphBuilder;
use lifedag_test_utils::fake_action::CallLog;

/// The demo lifecycle as one linear chain:
/// Lease <- Load <- Join <- Deploy <- Stop <- Leave <- Off
/// (each job requires the one on its left).
pub const CHAIN: [&str; 7] = ["Lease", "Load", "Join", "Deploy", "Stop", "Leave", "Off"];

/// Builder for the chain; jobs named in `failing` fail, the rest succeed.
pub fn chain_builder(log: CallLog, failing: &[&str]) -> GraphBuilder {
    let mut builder = GraphBuilder::with_log(log);
    for (i, id) in CHAIN.iter().enumerate() {
        let after: Vec<&str> = if i == 0 { vec![] } else { vec![CHAIN[i - 1]] };
        builder = if failing.contains(id) {
            builder.failing(id, &after)
        } else {
            builder.job(id, &after)
        };
    }
    builder
}

/// Write `contents` to a temporary workflow file.
pub fn workflow_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

/// The chain as a workflow file, with `Lease` as prerequisite and `Load` as
/// a disabled-by-default optional step.
pub const DEMO_TOML: &str = r#"
[workflow]
name = "demo"
prerequisite = "Lease"

[anchors]
start = ["Deploy"]
stop = ["Stop"]
cleanup = ["Off"]

[job.Lease]
cmd = "check lease"

[job.Load]
label = "Load images"
cmd = "load images"
optional = "disabled"
tags = ["images"]

[job.Join]
cmd = "join"
after = ["Load"]

[job.Deploy]
cmd = "deploy"
after = ["Join"]

[job.Stop]
cmd = "stop"
after = ["Deploy"]

[job.Leave]
cmd = "leave"
after = ["Stop"]
critical = false

[job.Off]
cmd = "off"
after = ["Leave"]
"#;
