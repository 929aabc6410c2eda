// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command invocation.
//!
//! Everything lesson-mirror knows about the outside world comes from running
//! some other program: rclone for the cloud drive, and git for the published
//! working copy. This module is the one place where processes get spawned.
//!
//! Callers never change the working directory of the current process. Instead,
//! each [`Invocation`] carries the directory it should run in, if any.

use std::{
    ffi::OsString,
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    process::Command,
};
use tracing::{debug, instrument};

/// One call to an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    /// Construct new invocation of target program.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a listing of arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run program inside target directory.
    pub fn current_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(path.into());
        self
    }

    /// Arguments as lossy strings, mostly for logs and tests.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(fmt, " {}", arg.to_string_lossy())?;
        }

        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Construct successful output with given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Construct failed output with given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr.
    ///
    /// Sync tools like rclone print their transfer summary to stderr, so
    /// anything that scans output should look at both.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        combined.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            combined.push('\n');
        }
        combined.push_str(&self.stderr);
        combined
    }

    /// Turn non-zero exit into [`CommandError::Status`].
    ///
    /// # Errors
    ///
    /// - Return [`CommandError::Status`] if exit code is not zero.
    pub fn into_success(self, invocation: &Invocation) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        Err(CommandError::Status {
            command: invocation.to_string(),
            code: self.code,
            stderr: chomp(&self.stderr).to_string(),
        })
    }
}

/// Layer of indirection for running external programs.
///
/// Lets the sync and publish logic be exercised without rclone or git being
/// installed.
pub trait CommandRunner: Send + Sync {
    /// Run invocation to completion, capturing its output.
    ///
    /// A non-zero exit status is __not__ an error here. Only failure to spawn
    /// or wait on the process is.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

impl<R> CommandRunner for &R
where
    R: CommandRunner + ?Sized,
{
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).run(invocation)
    }
}

impl<R> CommandRunner for std::sync::Arc<R>
where
    R: CommandRunner + ?Sized,
{
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Run programs through [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(skip(self), fields(command = %invocation), level = "debug")]
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|err| CommandError::Spawn {
            source: err,
            command: invocation.to_string(),
        })?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        };
        debug!("exit code {:?}", output.code);

        Ok(output)
    }
}

/// Chomp trailing newlines.
pub(crate) fn chomp(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}

/// External command error types.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Process could not be started or waited on.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Process finished with non-zero exit status.
    #[error("command {command:?} failed with exit code {code:?}: {stderr}")]
    Status {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = CommandError> = std::result::Result<T, E>;
