//! Subprocess execution for build steps.
//!
//! Every step runs synchronously from the caller's point of view, in a given
//! working directory, with stdout/stderr inherited so the operator sees tool
//! output on the service's own streams. Success means exit code zero.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::str::FromStr;

use async_trait::async_trait;
use pipeline::ConfigError;
use thiserror::Error;
use tokio::process::Command;

// ---------------------------------------------------------------------------
// Command lines
// ---------------------------------------------------------------------------

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Creates a command line from a program and arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The executable to run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Splits on whitespace; no quoting is supported.
impl FromStr for CommandLine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| ConfigError::new("command line must not be empty"))?;
        Ok(Self::new(program, words))
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runners
// ---------------------------------------------------------------------------

/// Why a command did not succeed.
#[derive(Debug, Error)]
pub enum CommandFailure {
    /// The process could not be started.
    #[error("{0}")]
    Spawn(#[from] std::io::Error),

    /// The process exited unsuccessfully.
    #[error("{0}")]
    Exit(ExitStatus),
}

/// Runs one command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` in `dir` and waits for it to exit.
    async fn run(&self, dir: &Path, command: &CommandLine) -> Result<(), CommandFailure>;
}

/// Spawns real child processes with inherited stdout/stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, dir: &Path, command: &CommandLine) -> Result<(), CommandFailure> {
        let status = Command::new(command.program())
            .args(command.args())
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(CommandFailure::Exit(status))
        }
    }
}
