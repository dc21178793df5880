// tests/workflow_modes.rs

mod common;
use crate::common::{DEMO_TOML, workflow_file};

use lifedag::config::{load_and_validate, ConfigFile};
use lifedag::dag::JobState;
use lifedag::engine::{OrchestrateOptions, Orchestrator};
use lifedag::errors::LifedagError;
use lifedag::types::{Mode, OptionalDefault};
use lifedag::workflow::{Anchors, Plan, PrunePolicy, Toggles, Workflow};
use lifedag_test_utils::builders::{
    ConfigFileBuilder, JobConfigBuilder, ids, job_names, scripted_factory,
};
use lifedag_test_utils::fake_action::CallLog;
use lifedag_test_utils::{init_tracing, with_timeout};

fn demo_config() -> ConfigFile {
    let file = workflow_file(DEMO_TOML);
    load_and_validate(file.path()).unwrap()
}

fn demo(log: CallLog) -> Workflow {
    Workflow::assemble(&demo_config(), scripted_factory(log)).unwrap()
}

fn plan(mode: Mode, enable: &[&str], disable: &[&str]) -> Plan {
    let toggles = Toggles {
        enable: enable.iter().map(|s| s.to_string()).collect(),
        disable: disable.iter().map(|s| s.to_string()).collect(),
    };
    demo(CallLog::new()).plan(mode, &toggles).unwrap()
}

fn names(v: &[&str]) -> Vec<String> {
    let mut v: Vec<String> = v.iter().map(|s| s.to_string()).collect();
    v.sort();
    v
}

#[test]
fn assemble_keeps_the_prerequisite_out_of_the_lifecycle() {
    let wf = demo(CallLog::new());
    assert_eq!(wf.name(), "demo");
    assert_eq!(wf.graph().len(), 6);
    assert!(!wf.graph().contains("Lease"));
    assert_eq!(wf.prerequisite().map(|j| j.id().as_str()), Some("Lease"));
    assert!(wf.is_optional("Load"));
    assert!(!wf.graph().get("Leave").unwrap().is_critical());
    assert_eq!(wf.graph().get("Load").unwrap().label(), "Load images");
}

#[test]
fn policies_per_mode() {
    let anchors = Anchors {
        start: ids(&["Deploy"]),
        stop: ids(&["Stop"]),
        cleanup: ids(&["Off"]),
    };

    let run = PrunePolicy::for_mode(Mode::Run, &anchors).unwrap();
    assert!(run.starts.is_empty());
    assert_eq!(run.ends, ids(&["Stop"]));
    assert!(!run.keep_ends);

    let cleanup = PrunePolicy::for_mode(Mode::Cleanup, &anchors).unwrap();
    assert_eq!(cleanup.starts, ids(&["Off"]));
    assert!(cleanup.ends.is_empty());
    assert!(cleanup.keep_ends);

    let err = PrunePolicy::for_mode(Mode::Start, &Anchors::default()).unwrap_err();
    assert!(matches!(err, LifedagError::ConfigError(msg) if msg.contains("[anchors].start")));
}

#[test]
fn run_mode_elides_disabled_optional_step() {
    let plan = plan(Mode::Run, &[], &[]);

    assert_eq!(job_names(&plan.graph), names(&["Lease", "Join", "Deploy"]));
    assert!(plan.graph.requires("Join", "Lease"));
    assert!(plan.graph.requires("Deploy", "Join"));
    assert_eq!(plan.elided, ids(&["Load"]));
    assert_eq!(plan.purpose, "run mode (skipped: Load)");
}

#[test]
fn enable_by_tag_keeps_optional_step() {
    let plan = plan(Mode::Run, &["images"], &[]);

    assert_eq!(job_names(&plan.graph), names(&["Lease", "Load", "Join", "Deploy"]));
    assert!(plan.graph.requires("Load", "Lease"));
    assert!(plan.graph.requires("Join", "Load"));
    assert!(plan.elided.is_empty());
    assert_eq!(plan.purpose, "run mode");
}

#[test]
fn disable_wins_over_enable() {
    let plan = plan(Mode::Run, &["Load"], &["Lo*"]);
    assert!(!plan.graph.contains("Load"));
}

#[test]
fn start_mode_is_deploy_behind_lease() {
    let plan = plan(Mode::Start, &[], &[]);
    assert_eq!(job_names(&plan.graph), names(&["Lease", "Deploy"]));
    assert!(plan.graph.requires("Deploy", "Lease"));
    assert!(plan.elided.is_empty());
}

#[test]
fn stop_and_cleanup_modes() {
    let stop = plan(Mode::Stop, &[], &[]);
    assert_eq!(job_names(&stop.graph), names(&["Lease", "Stop", "Leave"]));
    assert!(stop.graph.requires("Stop", "Lease"));

    let cleanup = plan(Mode::Cleanup, &[], &[]);
    assert_eq!(job_names(&cleanup.graph), names(&["Lease", "Off"]));
    assert!(cleanup.graph.requires("Off", "Lease"));
}

#[test]
fn each_mode_points_at_the_next_one() {
    assert_eq!(plan(Mode::Run, &[], &[]).next, Some(Mode::Stop));
    assert_eq!(plan(Mode::Start, &[], &[]).next, Some(Mode::Stop));
    assert_eq!(plan(Mode::Stop, &[], &[]).next, Some(Mode::Cleanup));
    assert_eq!(plan(Mode::Cleanup, &[], &[]).next, None);
}

#[test]
fn run_without_its_start_step_points_at_start() {
    let cfg = ConfigFileBuilder::new()
        .start_anchor("serve")
        .stop_anchor("halt")
        .with_job("prepare", JobConfigBuilder::new("true").build())
        .with_job(
            "serve",
            JobConfigBuilder::new("true")
                .after("prepare")
                .optional(OptionalDefault::Disabled)
                .build(),
        )
        .with_job("halt", JobConfigBuilder::new("true").after("serve").build())
        .build();
    let wf = Workflow::assemble(&cfg, scripted_factory(CallLog::new())).unwrap();

    let run = wf.plan(Mode::Run, &Toggles::default()).unwrap();
    assert_eq!(run.elided, ids(&["serve"]));
    assert_eq!(run.next, Some(Mode::Start));

    let toggles = Toggles {
        enable: vec!["serve".to_string()],
        disable: vec![],
    };
    assert_eq!(wf.plan(Mode::Run, &toggles).unwrap().next, Some(Mode::Stop));
}

#[test]
fn without_later_anchors_there_is_no_next_mode() {
    let cfg = ConfigFileBuilder::new()
        .with_job("a", JobConfigBuilder::new("true").build())
        .with_job("b", JobConfigBuilder::new("true").after("a").build())
        .build();
    let wf = Workflow::assemble(&cfg, scripted_factory(CallLog::new())).unwrap();
    assert_eq!(wf.plan(Mode::Run, &Toggles::default()).unwrap().next, None);
}

#[test]
fn selecting_a_non_optional_job_is_an_error() {
    let toggles = Toggles {
        enable: vec![],
        disable: vec!["Deploy".to_string()],
    };
    let err = demo(CallLog::new()).plan(Mode::Run, &toggles).unwrap_err();
    assert!(matches!(err, LifedagError::ConfigError(msg) if msg.contains("not optional")));
}

#[test]
fn unmatched_selector_is_only_a_warning() {
    init_tracing();
    let plan = plan(Mode::Run, &["no-such-step"], &[]);
    assert!(!plan.graph.contains("Load"));
}

#[test]
fn invalid_glob_is_a_config_error() {
    let toggles = Toggles {
        enable: vec!["[".to_string()],
        disable: vec![],
    };
    let err = demo(CallLog::new()).plan(Mode::Run, &toggles).unwrap_err();
    assert!(matches!(err, LifedagError::ConfigError(_)));
}

#[test]
fn mode_leaving_nothing_is_an_error() {
    let cfg = ConfigFileBuilder::new()
        .stop_anchor("only")
        .with_job("only", JobConfigBuilder::new("true").build())
        .build();
    let wf = Workflow::assemble(&cfg, scripted_factory(CallLog::new())).unwrap();

    let err = wf.plan(Mode::Run, &Toggles::default()).unwrap_err();
    assert!(matches!(err, LifedagError::ConfigError(msg) if msg.contains("no job")));
}

#[test]
fn optional_enabled_by_default_can_be_disabled() {
    let cfg = ConfigFileBuilder::new()
        .with_job("a", JobConfigBuilder::new("true").build())
        .with_job(
            "b",
            JobConfigBuilder::new("true")
                .after("a")
                .optional(OptionalDefault::Enabled)
                .build(),
        )
        .with_job("c", JobConfigBuilder::new("true").after("b").build())
        .build();
    let wf = Workflow::assemble(&cfg, scripted_factory(CallLog::new())).unwrap();

    let kept = wf.plan(Mode::Run, &Toggles::default()).unwrap();
    assert!(kept.graph.contains("b"));

    let toggles = Toggles {
        enable: vec![],
        disable: vec!["b".to_string()],
    };
    let elided = wf.plan(Mode::Run, &toggles).unwrap();
    assert!(!elided.graph.contains("b"));
    assert!(elided.graph.requires("c", "a"));
}

#[tokio::test]
async fn planned_run_executes_only_planned_jobs() {
    init_tracing();
    let log = CallLog::new();
    let wf = demo(log.clone());
    let plan = wf.plan(Mode::Run, &Toggles::default()).unwrap();

    let mut orch = Orchestrator::new(plan.graph, OrchestrateOptions::default()).unwrap();
    assert!(with_timeout(orch.orchestrate()).await);
    assert_eq!(log.calls(), vec!["Lease", "Join", "Deploy"]);
}

#[tokio::test]
async fn failing_prerequisite_stops_the_mode() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .prerequisite("lease")
        .with_job("lease", JobConfigBuilder::new("false").build())
        .with_job("a", JobConfigBuilder::new("true").build())
        .with_job("b", JobConfigBuilder::new("true").after("a").build())
        .build();
    let log = CallLog::new();
    let wf = Workflow::assemble(&cfg, scripted_factory(log.clone())).unwrap();
    let plan = wf.plan(Mode::Run, &Toggles::default()).unwrap();

    let mut orch = Orchestrator::new(plan.graph, OrchestrateOptions::default()).unwrap();
    assert!(!with_timeout(orch.orchestrate()).await);
    assert_eq!(orch.state_of("a"), Some(JobState::Skipped));
    assert_eq!(log.calls(), vec!["lease"]);
    assert!(orch.why().contains("'lease'"));
}
