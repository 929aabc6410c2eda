// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Publishing the working copy through git.
//!
//! The working copy is an ordinary git repository with a configured upstream.
//! Publishing stages everything, commits it with a timestamped message, and
//! pushes. If `git status --porcelain` reports nothing, publishing succeeds
//! without touching the repository.
//!
//! Every git call runs with the working copy as its current directory. The
//! current directory of lesson-mirror itself never changes.

use crate::{
    clock::sync_timestamp,
    command::{chomp, CommandError, CommandRunner, Invocation},
};

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

/// Commit message for an automatic sync at given timestamp.
pub fn commit_message(timestamp: &str) -> String {
    format!("Auto sync from Google Drive at {timestamp}")
}

/// What publishing did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing was pending.
    NothingToCommit,

    /// Changes were committed with the given message and pushed.
    Pushed { message: String },
}

/// Commit and push a working copy through the git executable.
#[derive(Debug)]
pub struct Publisher<R>
where
    R: CommandRunner,
{
    runner: R,
    git: String,
}

impl<R> Publisher<R>
where
    R: CommandRunner,
{
    /// Construct new publisher.
    pub fn new(runner: R, git: impl Into<String>) -> Self {
        Self {
            runner,
            git: git.into(),
        }
    }

    /// Publish working copy with a message stamped at the current time.
    ///
    /// # Errors
    ///
    /// - Return [`PublishError`] naming the git step that failed.
    pub fn publish(&self, work_tree: impl AsRef<Path>) -> Result<PublishOutcome> {
        self.publish_with_message(work_tree, commit_message(&sync_timestamp()))
    }

    /// Publish working copy with given commit message.
    ///
    /// Stops at the first failing step. Nothing already done is undone.
    ///
    /// # Errors
    ///
    /// - Return [`PublishError::Status`] if the change probe fails.
    /// - Return [`PublishError::Stage`] if staging fails.
    /// - Return [`PublishError::Commit`] if committing fails.
    /// - Return [`PublishError::Push`] if pushing fails.
    #[instrument(skip(self, work_tree, message), level = "debug")]
    pub fn publish_with_message(
        &self,
        work_tree: impl AsRef<Path>,
        message: impl Into<String>,
    ) -> Result<PublishOutcome> {
        let work_tree = work_tree.as_ref();
        let message = message.into();

        let status = self
            .git(work_tree, ["status", "--porcelain"])
            .map_err(PublishError::Status)?;
        if status.trim().is_empty() {
            info!("nothing to commit in {:?}", work_tree.display());
            return Ok(PublishOutcome::NothingToCommit);
        }

        info!("stage changes in {:?}", work_tree.display());
        self.git(work_tree, ["add", "."])
            .map_err(PublishError::Stage)?;

        info!("commit: {message}");
        self.git(work_tree, ["commit", "-m", message.as_str()])
            .map_err(PublishError::Commit)?;

        info!("push {:?} to remote", work_tree.display());
        self.git(work_tree, ["push"])
            .map_err(PublishError::Push)?;
        info!("published {:?}", work_tree.display());

        Ok(PublishOutcome::Pushed { message })
    }

    fn git(
        &self,
        work_tree: &Path,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<String, CommandError> {
        let invocation = Invocation::new(&self.git)
            .args(args)
            .current_dir(PathBuf::from(work_tree));
        let output = self.runner.run(&invocation)?.into_success(&invocation)?;

        Ok(chomp(&output.stdout).to_string())
    }
}

/// Publishing error types.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Change probe failed, e.g. not a git repository.
    #[error("failed to check working copy status")]
    Status(#[source] CommandError),

    #[error("failed to stage changes")]
    Stage(#[source] CommandError),

    #[error("failed to commit changes")]
    Commit(#[source] CommandError),

    #[error("failed to push changes")]
    Push(#[source] CommandError),
}

/// Friendly result alias :3
pub type Result<T, E = PublishError> = std::result::Result<T, E>;
