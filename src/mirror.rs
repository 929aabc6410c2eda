// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! One-way mirroring of a cloud drive tree.
//!
//! A __sync target__ pairs a tree on an rclone remote with a local working
//! copy. Mirroring that target happens in two steps:
//!
//! 1. __Detection__: a dry-run sync reports what would be transferred. Its
//!    summary decides whether there is anything to do at all.
//! 2. __Resync__: a real sync in update mode that only pulls files newer on
//!    the remote. It is a full directory sync, so files deleted on the remote
//!    are deleted locally as well.
//!
//! There is also an additive __fetch__ for seeding a fresh working copy, which
//! never deletes anything.

pub mod summary;

use crate::{
    command::{chomp, CommandError, CommandOutput, CommandRunner, Invocation},
    config::SyncSettings,
};

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

pub use summary::Summary;

/// One mirrored tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Name of the rclone remote.
    pub remote: String,

    /// Path of the tree inside the remote.
    pub remote_path: String,

    /// Local working copy.
    pub local_path: PathBuf,
}

impl SyncTarget {
    /// Construct new sync target.
    pub fn new(
        remote: impl Into<String>,
        remote_path: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            remote: remote.into(),
            remote_path: remote_path.into(),
            local_path: local_path.into(),
        }
    }

    /// Source argument as rclone expects it, e.g. `gdrive:/PROJECTS/LESSONS`.
    pub fn source(&self) -> String {
        format!(
            "{}:/{}",
            self.remote,
            self.remote_path.trim_start_matches('/')
        )
    }
}

/// Outcome of a dry-run comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    /// Whether a resync is needed.
    pub changed: bool,

    /// Everything the sync tool printed.
    pub raw_output: String,
}

/// Mirror a sync target through rclone.
#[derive(Debug)]
pub struct Mirror<R>
where
    R: CommandRunner,
{
    runner: R,
    rclone: String,
    settings: SyncSettings,
}

impl<R> Mirror<R>
where
    R: CommandRunner,
{
    /// Construct new mirror.
    pub fn new(runner: R, rclone: impl Into<String>, settings: SyncSettings) -> Self {
        Self {
            runner,
            rclone: rclone.into(),
            settings,
        }
    }

    /// Ask the sync tool what a sync would change, without changing anything.
    ///
    /// # Errors
    ///
    /// - Return [`MirrorError::Detect`] if the dry run cannot be spawned or
    ///   exits with non-zero status.
    #[instrument(skip(self, target), fields(source = %target.source()), level = "debug")]
    pub fn detect_changes(&self, target: &SyncTarget) -> Result<ChangeReport> {
        info!("check {} for changes", target.source());
        let invocation = self.sync_invocation(target).arg("--dry-run");
        let output = self
            .runner
            .run(&invocation)
            .map_err(MirrorError::Detect)?;
        let raw_output = output.combined();
        debug!("{}", chomp(&raw_output));

        output.into_success(&invocation).map_err(MirrorError::Detect)?;

        let changed = summary::classify(&raw_output) == Summary::ChangeFound;
        if changed {
            info!("changes found on {}", target.source());
        } else {
            info!("no changes on {}", target.source());
        }

        Ok(ChangeReport {
            changed,
            raw_output,
        })
    }

    /// Pull everything newer on the remote into the working copy.
    ///
    /// Creates the working copy directory first if it does not exist yet.
    ///
    /// # Errors
    ///
    /// - Return [`MirrorError::CreateLocal`] if working copy cannot be created.
    /// - Return [`MirrorError::Resync`] if the sync tool fails.
    #[instrument(skip(self, target), fields(source = %target.source()), level = "debug")]
    pub fn resync(&self, target: &SyncTarget) -> Result<PathBuf> {
        ensure_local_dir(&target.local_path)?;
        info!(
            "sync {} into {:?}",
            target.source(),
            target.local_path.display()
        );

        let invocation = self.sync_invocation(target).args([
            "--update".to_string(),
            "--transfers".to_string(),
            self.settings.transfers.to_string(),
            "--checkers".to_string(),
            self.settings.checkers.to_string(),
            "--verbose".to_string(),
        ]);
        self.run_transfer(&invocation).map_err(MirrorError::Resync)?;
        info!("synced into {:?}", target.local_path.display());

        Ok(target.local_path.clone())
    }

    /// Copy the remote tree into the working copy without deleting anything.
    ///
    /// # Errors
    ///
    /// - Return [`MirrorError::CreateLocal`] if working copy cannot be created.
    /// - Return [`MirrorError::Fetch`] if the sync tool fails.
    #[instrument(skip(self, target), fields(source = %target.source()), level = "debug")]
    pub fn fetch(&self, target: &SyncTarget) -> Result<PathBuf> {
        ensure_local_dir(&target.local_path)?;
        info!(
            "copy {} into {:?}",
            target.source(),
            target.local_path.display()
        );

        let invocation = Invocation::new(&self.rclone)
            .arg("copy")
            .arg(target.source())
            .arg(&target.local_path);
        self.run_transfer(&invocation).map_err(MirrorError::Fetch)?;
        info!("copied into {:?}", target.local_path.display());

        Ok(target.local_path.clone())
    }

    fn sync_invocation(&self, target: &SyncTarget) -> Invocation {
        let mut invocation = Invocation::new(&self.rclone)
            .arg("sync")
            .arg(target.source())
            .arg(&target.local_path);
        for pattern in &self.settings.exclude {
            invocation = invocation.arg("--exclude").arg(pattern);
        }

        invocation
    }

    fn run_transfer(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let output = self.runner.run(invocation)?;
        if !output.is_success() {
            error!("{}", chomp(&output.stderr));
        } else if !output.stderr.is_empty() {
            // rclone --verbose logs every transferred file on stderr.
            debug!("{}", chomp(&output.stderr));
        }

        output.into_success(invocation)
    }
}

fn ensure_local_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    warn!("create missing working copy {:?}", path.display());
    mkdirp::mkdirp(path).map_err(|err| MirrorError::CreateLocal {
        source: err,
        path: path.to_path_buf(),
    })?;

    Ok(())
}

/// Mirroring error types.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Dry-run comparison could not be completed.
    #[error("failed to check remote for changes")]
    Detect(#[source] CommandError),

    /// Update-mode sync failed.
    #[error("failed to sync remote into working copy")]
    Resync(#[source] CommandError),

    /// Additive copy failed.
    #[error("failed to copy remote into working copy")]
    Fetch(#[source] CommandError),

    /// Working copy directory could not be created.
    #[error("failed to create working copy at {:?}", path.display())]
    CreateLocal {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = MirrorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn settings() -> SyncSettings {
        SyncSettings {
            exclude: Vec::new(),
            ..SyncSettings::default()
        }
    }

    fn target() -> SyncTarget {
        SyncTarget::new("gdrive", "PROJECTS/GEN8-LESSONS", "lessons")
    }

    #[test]
    fn source_is_rendered_for_rclone() {
        assert_eq!(target().source(), "gdrive:/PROJECTS/GEN8-LESSONS");
        let target = SyncTarget::new("gdrive", "/already/rooted", "x");
        assert_eq!(target.source(), "gdrive:/already/rooted");
    }

    #[test]
    fn detect_runs_dry_run_sync() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().reply(CommandOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: "Transferred:            0 / 0, -\n".into(),
        });
        let mirror = Mirror::new(&runner, "rclone", settings());

        let report = mirror.detect_changes(&target())?;
        assert!(!report.changed);
        assert_eq!(report.raw_output, "Transferred:            0 / 0, -\n");
        assert_eq!(
            runner.command_lines(),
            vec!["rclone sync gdrive:/PROJECTS/GEN8-LESSONS lessons --dry-run"]
        );

        Ok(())
    }

    #[test]
    fn detect_reports_change() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().reply(CommandOutput::success("Transferred: 3 / 5, 60%\n"));
        let mirror = Mirror::new(&runner, "rclone", settings());

        assert!(mirror.detect_changes(&target())?.changed);

        Ok(())
    }

    #[test]
    fn detect_fails_when_dry_run_fails() {
        let runner = ScriptedRunner::new().reply(CommandOutput::failure(3, "directory not found"));
        let mirror = Mirror::new(&runner, "rclone", settings());
        assert!(matches!(
            mirror.detect_changes(&target()),
            Err(MirrorError::Detect(CommandError::Status { .. }))
        ));

        let runner = ScriptedRunner::new().fail_spawn();
        let mirror = Mirror::new(&runner, "rclone", settings());
        assert!(matches!(
            mirror.detect_changes(&target()),
            Err(MirrorError::Detect(CommandError::Spawn { .. }))
        ));
    }

    #[test]
    fn excludes_are_passed_to_every_sync() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().reply(CommandOutput::success("Transferred: 0 / 0\n"));
        let mirror = Mirror::new(&runner, "rclone", SyncSettings::default());
        mirror.detect_changes(&target())?;

        assert_eq!(
            runner.calls()[0].args_lossy(),
            vec![
                "sync",
                "gdrive:/PROJECTS/GEN8-LESSONS",
                "lessons",
                "--exclude",
                "/.git/**",
                "--dry-run",
            ]
        );

        Ok(())
    }

    #[sealed_test]
    fn resync_creates_working_copy_and_pulls_updates() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().reply(CommandOutput::success(""));
        let mirror = Mirror::new(&runner, "rclone", settings());

        let path = mirror.resync(&target())?;
        assert_eq!(path, PathBuf::from("lessons"));
        assert!(Path::new("lessons").is_dir());
        assert_eq!(
            runner.command_lines(),
            vec!["rclone sync gdrive:/PROJECTS/GEN8-LESSONS lessons --update --transfers 4 --checkers 8 --verbose"]
        );

        Ok(())
    }

    #[sealed_test]
    fn resync_failure_surfaces_stderr() {
        let runner = ScriptedRunner::new().reply(CommandOutput::failure(1, "quota exceeded\n"));
        let mirror = Mirror::new(&runner, "rclone", settings());

        match mirror.resync(&target()) {
            Err(MirrorError::Resync(CommandError::Status { stderr, .. })) => {
                assert_eq!(stderr, "quota exceeded");
            }
            other => panic!("expected resync failure, got {other:?}"),
        }
    }

    #[sealed_test]
    fn fetch_copies_without_sync() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().reply(CommandOutput::success(""));
        let mirror = Mirror::new(&runner, "rclone", SyncSettings::default());

        mirror.fetch(&target())?;
        assert_eq!(
            runner.command_lines(),
            vec!["rclone copy gdrive:/PROJECTS/GEN8-LESSONS lessons"]
        );

        Ok(())
    }
}
