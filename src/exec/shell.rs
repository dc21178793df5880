// src/exec/shell.rs

//! Shell command action used by the `lifedag` binary.
//!
//! Remote execution is expressed in the command itself (e.g. `ssh node
//! ...`); this module only knows how to run a command line and read its exit
//! status.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::dag::{Action, ActionError, ActionFuture, JobId};

/// Runs `cmd` through the platform shell; success means exit status 0.
#[derive(Debug, Clone)]
pub struct ShellAction {
    job: JobId,
    cmd: String,
}

impl ShellAction {
    pub fn new(job: JobId, cmd: impl Into<String>) -> Self {
        Self {
            job,
            cmd: cmd.into(),
        }
    }

    async fn run_inner(&self) -> Result<(), ActionError> {
        info!(job = %self.job, cmd = %self.cmd, "starting job process");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdout_task = child.stdout.take().map(|stdout| {
            let job = self.job.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(job = %job, "stdout: {}", line);
                }
            })
        });

        // Always consume stderr so buffers don't fill; log at debug.
        let stderr_task = child.stderr.take().map(|stderr| {
            let job = self.job.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(job = %job, "stderr: {}", line);
                }
            })
        });

        let status = child.wait().await?;
        // Background children may hold the pipes open past the shell's exit.
        for task in [stdout_task, stderr_task].into_iter().flatten() {
            if let Err(err) = task.await {
                debug!(job = %self.job, error = %err, "output reader ended abnormally");
            }
        }
        info!(
            job = %self.job,
            exit_code = ?status.code(),
            success = status.success(),
            "job process exited"
        );

        if status.success() {
            Ok(())
        } else {
            match status.code() {
                Some(code) => Err(ActionError::Exited(code)),
                None => Err(ActionError::Terminated),
            }
        }
    }
}

impl Action for ShellAction {
    fn run(&self) -> ActionFuture<'_> {
        Box::pin(self.run_inner())
    }
}
