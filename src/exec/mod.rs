// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`runner`] launches one scheduled job's action as a Tokio task and
//!   reports the outcome back to the orchestrator via `RuntimeEvent`s.
//! - [`shell`] provides [`ShellAction`], the command-line action the binary
//!   wires into every configured job. Tests inject their own actions.

pub mod runner;
pub mod shell;

pub use runner::spawn_job;
pub use shell::ShellAction;
