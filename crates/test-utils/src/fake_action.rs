use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Barrier;
use lifedag::dag::{Action, ActionError, ActionFuture};

/// What a [`ScriptedAction`] does once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Succeed,
    /// Fail as if the command exited with this code.
    Fail(i32),
    Panic,
}

/// Shared record of which actions were started, in start order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|n| *n == name).count()
    }

    pub fn ran(&self, name: &str) -> bool {
        self.count(name) > 0
    }
}

/// A fake action that:
/// - records its start in a [`CallLog`]
/// - optionally waits on a barrier and/or sleeps
/// - then succeeds, fails or panics as scripted.
#[derive(Debug, Clone)]
pub struct ScriptedAction {
    name: String,
    script: Script,
    delay: Option<Duration>,
    gate: Option<Arc<Barrier>>,
    log: CallLog,
}

impl ScriptedAction {
    pub fn new(name: &str, script: Script, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            script,
            delay: None,
            gate: None,
            log,
        }
    }

    pub fn succeed(name: &str, log: CallLog) -> Self {
        Self::new(name, Script::Succeed, log)
    }

    pub fn failing(name: &str, log: CallLog) -> Self {
        Self::new(name, Script::Fail(1), log)
    }

    /// Interpret a workflow `cmd` as a script: `false` fails, `panic`
    /// panics, anything else succeeds.
    pub fn from_cmd(name: &str, cmd: &str, log: CallLog) -> Self {
        let script = match cmd.trim() {
            "false" => Script::Fail(1),
            "panic" => Script::Panic,
            _ => Script::Succeed,
        };
        Self::new(name, script, log)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block until every party of `gate` has started.
    pub fn with_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Action for ScriptedAction {
    fn run(&self) -> ActionFuture<'_> {
        Box::pin(async move {
            self.log.record(&self.name);

            if let Some(gate) = &self.gate {
                gate.wait().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.script {
                Script::Succeed => Ok(()),
                Script::Fail(code) => Err(ActionError::Exited(code)),
                Script::Panic => panic!("scripted panic in {}", self.name),
            }
        })
    }
}
