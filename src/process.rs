//! External process execution.
//!
//! Steps never spawn processes themselves. They describe the command as a
//! [`CommandLine`] and hand it to an [`Execute`] implementation, so tests can
//! swap in a recorder without touching the installers.
//!
//! Secrets go through [`CommandLine::env`], never through arguments:
//! arguments are visible in `/proc/<pid>/cmdline` and in our own logs.

use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::error::{InstallError, Result};

/// A fully described external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined for logging. Env values are left out.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output from a process execution.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Standard output from the process.
    pub stdout: String,
    /// Standard error from the process.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the process exited successfully (exit code 0).
    pub success: bool,
}

impl ProcessOutput {
    /// A successful run with no output
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            ..Default::default()
        }
    }

    /// Check if the process succeeded and return a step error if not.
    pub fn ensure_success(&self, step: &str, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            Err(InstallError::step(
                step,
                format!("{} failed (exit code {}): {}", context, code, self.stderr.trim()),
            ))
        }
    }
}

/// Capability to run an external command to completion.
///
/// A non-zero exit is reported through [`ProcessOutput::success`], not as an
/// error; `Err` means the process could not be run at all.
pub trait Execute {
    fn run(&self, command: &CommandLine) -> Result<ProcessOutput>;
}

/// Runs commands as real child processes, capturing stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Execute for ProcessExecutor {
    fn run(&self, command: &CommandLine) -> Result<ProcessOutput> {
        info!("Running: {}", command.display());
        debug!(
            env = ?command.env.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            "Process environment"
        );

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|e| {
            InstallError::process(format!("failed to spawn {}: {}", command.program, e))
        })?;

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        };

        if result.success {
            debug!("{} exited successfully", command.program);
        } else {
            info!(
                "{} failed with exit code {}",
                command.program,
                result.exit_code.unwrap_or(-1)
            );
        }
        Ok(result)
    }
}
