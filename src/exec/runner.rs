// src/exec/runner.rs

//! Launching a single job's action.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::ScheduledJob;
use crate::engine::{JobOutcome, RuntimeEvent};

/// Run `job`'s action in its own Tokio task and report the outcome as a
/// `JobCompleted` event.
///
/// The action runs in a nested task so that a panic inside it is observed
/// as a `JoinError` and reported as a failure rather than lost.
pub fn spawn_job(job: ScheduledJob, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        info!(
            job = %job.id,
            run_id = job.run_id,
            critical = job.critical,
            label = %job.label,
            "starting job"
        );

        let action = job.action.clone();
        let outcome = match tokio::spawn(async move { action.run().await }).await {
            Ok(Ok(())) => {
                info!(job = %job.id, run_id = job.run_id, "job action succeeded");
                JobOutcome::Success
            }
            Ok(Err(err)) => {
                warn!(job = %job.id, run_id = job.run_id, error = %err, "job action failed");
                JobOutcome::Failed(err.to_string())
            }
            Err(join_err) => {
                error!(job = %job.id, run_id = job.run_id, error = %join_err, "job action panicked");
                JobOutcome::Failed(format!("action panicked: {join_err}"))
            }
        };

        let event = RuntimeEvent::JobCompleted {
            job: job.id.clone(),
            run_id: job.run_id,
            outcome,
        };
        if runtime_tx.send(event).await.is_err() {
            warn!(job = %job.id, "orchestrator gone; dropping job completion");
        }
    });
}
