use std::process::Command;

use super::Invocation;
use crate::core::SaoHostError;

/// Executes invocations and reports their exit code.
///
/// This is the only seam where processes are spawned; tests swap in
/// recording implementations.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<i32, SaoHostError>;
}

/// Runs commands as child processes with inherited stdio.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Log each command line before it runs.
    pub echo: bool,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self { echo: true }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<i32, SaoHostError> {
        if self.echo {
            tracing::info!("{}", invocation);
        }
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| SaoHostError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        // A signal-terminated child has no code.
        let code = status.code().unwrap_or(1);
        tracing::debug!("{} exited with {}", invocation.program.display(), code);
        Ok(code)
    }
}
