// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! One pass of the mirror pipeline.
//!
//! ```text
//! Idle -> Checking -+-> Unchanged                          (success)
//!                   +-> ChangeFound -> Syncing -+-> SyncOk -> index -> publish (success)
//!                   |                           +-> SyncFailed                 (failure)
//!                   +-> DetectFailed                                           (failure)
//! ```
//!
//! A pass never panics or returns an error on account of an external tool.
//! Each failure is logged and folded into [`PassOutcome`]. Once the sync
//! itself succeeded the pass counts as a success, even if indexing or
//! publishing did not work out; the next pass publishes whatever is left.

use crate::{
    catalog::Indexer,
    command::CommandRunner,
    config::MirrorConfig,
    mirror::{Mirror, SyncTarget},
    publish::Publisher,
};

use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// How a single pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Dry run found nothing to pull. Nothing else ran.
    Unchanged(PathBuf),

    /// Working copy was synced, then indexed and published.
    Synced {
        local_path: PathBuf,
        indexed: bool,
        published: bool,
    },

    /// Dry run itself could not be completed, so no sync was attempted.
    DetectFailed,

    /// Sync ran and failed. Nothing was published.
    SyncFailed,
}

impl PassOutcome {
    /// Whether the periodic driver should treat the pass as successful.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Unchanged(_) | Self::Synced { .. })
    }

    /// Working copy path on success, `None` on failure.
    pub fn local_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Unchanged(path) => Some(path),
            Self::Synced { local_path, .. } => Some(local_path),
            Self::DetectFailed | Self::SyncFailed => None,
        }
    }
}

/// Check, sync, index, and publish one sync target.
#[derive(Debug)]
pub struct Pipeline<R>
where
    R: CommandRunner + Clone,
{
    mirror: Mirror<R>,
    indexer: Indexer,
    publisher: Publisher<R>,
}

impl<R> Pipeline<R>
where
    R: CommandRunner + Clone,
{
    /// Construct new pipeline from configuration.
    pub fn new(runner: R, config: &MirrorConfig) -> Self {
        Self {
            mirror: Mirror::new(runner.clone(), &config.tools.rclone, config.sync_settings()),
            indexer: Indexer::new(config.catalog.clone()),
            publisher: Publisher::new(runner, &config.tools.git),
        }
    }

    /// Run one pass.
    #[instrument(skip(self, target), fields(source = %target.source()), level = "debug")]
    pub fn run_once(&self, target: &SyncTarget) -> PassOutcome {
        let report = match self.mirror.detect_changes(target) {
            Ok(report) => report,
            Err(err) => {
                error!("{}", error_chain(&err));
                return PassOutcome::DetectFailed;
            }
        };

        if !report.changed {
            info!("skip sync, nothing changed");
            return PassOutcome::Unchanged(target.local_path.clone());
        }

        let local_path = match self.mirror.resync(target) {
            Ok(path) => path,
            Err(err) => {
                error!("{}", error_chain(&err));
                return PassOutcome::SyncFailed;
            }
        };

        let indexed = match self.indexer.write(&local_path) {
            Ok(_) => true,
            Err(err) => {
                warn!("sync succeeded but indexing failed: {}", error_chain(&err));
                false
            }
        };

        let published = match self.publisher.publish(&local_path) {
            Ok(_) => true,
            Err(err) => {
                warn!("sync succeeded but publishing failed: {}", error_chain(&err));
                false
            }
        };

        if indexed && published {
            info!("sync and publish of {:?} complete", local_path.display());
        }

        PassOutcome::Synced {
            local_path,
            indexed,
            published,
        }
    }
}

/// Render an error with all of its sources on one line.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{testing::ScriptedRunner, CommandOutput};
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{fs, path::Path, sync::Arc};

    fn config() -> MirrorConfig {
        let mut config = MirrorConfig::default();
        config.sync.exclude.clear();
        config
    }

    fn target() -> SyncTarget {
        SyncTarget::new("gdrive", "LESSONS", "lessons")
    }

    fn programs(runner: &ScriptedRunner) -> Vec<String> {
        runner
            .calls()
            .iter()
            .map(|call| format!("{} {}", call.program.to_string_lossy(), call.args_lossy()[0]))
            .collect()
    }

    #[test]
    fn unchanged_remote_short_circuits() {
        let runner = Arc::new(ScriptedRunner::new().reply(CommandOutput::success("Transferred: 0 / 0, -\n")));
        let pipeline = Pipeline::new(runner.clone(), &config());

        let outcome = pipeline.run_once(&target());
        assert_eq!(outcome, PassOutcome::Unchanged(PathBuf::from("lessons")));
        assert!(outcome.is_success());
        assert_eq!(programs(&runner), vec!["rclone sync"]);
    }

    #[test]
    fn catalog_file_is_excluded_from_sync() {
        let runner = Arc::new(ScriptedRunner::new().reply(CommandOutput::success("Transferred: 0 / 0, -\n")));
        let mut config = config();
        config.catalog.index = "catalog.json".into();
        let pipeline = Pipeline::new(runner.clone(), &config);

        pipeline.run_once(&target());
        let args = runner.calls()[0].args_lossy();
        assert!(args.windows(2).any(|pair| pair == ["--exclude", "/catalog.json"]));
        assert!(!args.contains(&"/lessons.json".to_string()));
    }

    #[test]
    fn detector_failure_skips_sync() {
        let runner = Arc::new(ScriptedRunner::new().fail_spawn());
        let pipeline = Pipeline::new(runner.clone(), &config());

        let outcome = pipeline.run_once(&target());
        assert_eq!(outcome, PassOutcome::DetectFailed);
        assert!(!outcome.is_success());
        assert_eq!(outcome.local_path(), None);
        assert_eq!(runner.calls().len(), 1);
    }

    #[sealed_test]
    fn sync_failure_skips_publish() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .reply(CommandOutput::success("Transferred: 2 / 2, 100%\n"))
                .reply(CommandOutput::failure(1, "googleapi: Error 403: quota exceeded")),
        );
        let pipeline = Pipeline::new(runner.clone(), &config());

        let outcome = pipeline.run_once(&target());
        assert_eq!(outcome, PassOutcome::SyncFailed);
        assert_eq!(programs(&runner), vec!["rclone sync", "rclone sync"]);
    }

    #[sealed_test]
    fn change_is_synced_indexed_and_published() -> anyhow::Result<()> {
        fs::create_dir_all("lessons/slides/unit-1")?;
        fs::write("lessons/slides/unit-1/index.html", "<h1>Hi</h1>")?;

        let runner = Arc::new(
            ScriptedRunner::new()
                .reply(CommandOutput::success("Transferred: 1 / 1, 100%\n"))
                .reply(CommandOutput::success(""))
                .reply(CommandOutput::success("?? lessons.json\n"))
                .reply(CommandOutput::success(""))
                .reply(CommandOutput::success(""))
                .reply(CommandOutput::success("")),
        );
        let pipeline = Pipeline::new(runner.clone(), &config());

        let outcome = pipeline.run_once(&target());
        assert_eq!(
            outcome,
            PassOutcome::Synced {
                local_path: PathBuf::from("lessons"),
                indexed: true,
                published: true,
            }
        );
        assert!(Path::new("lessons/lessons.json").is_file());
        assert_eq!(
            programs(&runner),
            vec![
                "rclone sync",
                "rclone sync",
                "git status",
                "git add",
                "git commit",
                "git push",
            ]
        );

        Ok(())
    }

    #[sealed_test]
    fn publish_failure_still_counts_as_synced() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .reply(CommandOutput::success("Transferred: 1 / 1, 100%\n"))
                .reply(CommandOutput::success(""))
                .reply(CommandOutput::failure(128, "not a git repository")),
        );
        let pipeline = Pipeline::new(runner.clone(), &config());

        let outcome = pipeline.run_once(&target());
        assert!(outcome.is_success());
        assert!(matches!(
            outcome,
            PassOutcome::Synced { published: false, indexed: true, .. }
        ));
    }
}
