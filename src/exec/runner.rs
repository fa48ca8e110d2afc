// src/exec/runner.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;
use tracing::debug;

use crate::errors::{BundlegateError, Result};
use crate::types::ProcessStatus;

/// Everything needed to start the bundler once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Working directory; always the project root.
    pub cwd: PathBuf,
    /// Variables added on top of the inherited process environment.
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Build an invocation from a `[program, args...]` command line.
    ///
    /// A relative program that contains a path separator (e.g.
    /// `./bin/webpack`) is resolved against `cwd`; bare names are left for
    /// `PATH` lookup.
    pub fn from_command(
        command: &[String],
        cwd: &Path,
        env: BTreeMap<String, String>,
    ) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| {
            BundlegateError::ConfigError("bundler command is empty".to_string())
        })?;

        let program_path = Path::new(program);
        let program = if program_path.is_relative() && program.contains(['/', '\\']) {
            cwd.join(program_path)
        } else {
            program_path.to_path_buf()
        };

        Ok(Self {
            program,
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            env,
        })
    }

    /// Human-readable command line for logs.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of one bundler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Trait abstracting how the bundler is executed.
///
/// Implementations block until the process exits. An `Err` means the process
/// could not be run at all; a non-zero exit is reported through
/// `ProcessOutput::status`.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs the bundler with `std::process::Command`, capturing both streams.
#[derive(Debug, Clone, Default)]
pub struct RealProcessRunner;

impl ProcessRunner for RealProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!(
            cmd = %invocation.display_command(),
            cwd = ?invocation.cwd,
            "spawning bundler process"
        );

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("running bundler {:?}", invocation.program))?;

        Ok(ProcessOutput {
            status: ProcessStatus::from_exit_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
