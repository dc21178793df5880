// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod workflow;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::dag::Action;
use crate::engine::{OrchestrateOptions, Orchestrator};
use crate::exec::ShellAction;
use crate::workflow::{Toggles, Workflow};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the workflow file, plans the requested mode, then
/// runs it. Returns whether the run succeeded; configuration problems are
/// reported as errors.
pub async fn run(args: CliArgs) -> Result<bool> {
    let cfg = load_and_validate(&args.config)?;

    let workflow = Workflow::assemble(&cfg, |id, job| -> Arc<dyn Action> {
        Arc::new(ShellAction::new(id.clone(), job.cmd.clone()))
    })?;

    let toggles = Toggles {
        enable: args.enable.clone(),
        disable: args.disable.clone(),
    };
    let plan = workflow.plan(args.mode, &toggles)?;

    println!("{}: {}", workflow.name(), plan.purpose);
    if args.list || args.dry_run {
        print!("{}", plan.graph);
    }

    let options = OrchestrateOptions {
        dry_run: args.dry_run,
    };
    let mut orchestrator = Orchestrator::new(plan.graph, options)?;
    info!(mode = %plan.mode, jobs = orchestrator.graph().len(), "starting orchestration");

    let ok = orchestrator.orchestrate().await;
    if args.dry_run {
        debug!("dry run complete (no execution)");
        println!("{} dry run OK", plan.mode);
        return Ok(true);
    }

    if ok {
        println!("{} OK", plan.mode);
        if let Some(next) = plan.next {
            println!(
                "next: lifedag --config {} --mode {next}",
                args.config.display()
            );
        }
    } else {
        println!("{} KO: {}", plan.mode, orchestrator.why());
    }
    print!("{}", orchestrator.debrief());

    Ok(ok)
}
