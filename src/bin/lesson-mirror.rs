// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use lesson_mirror::{
    config::MirrorConfig, mirror::Mirror, path::default_config_path, Backfiller, Backoff, Indexer,
    Pipeline, PublishOutcome, Publisher, SyncTarget, SystemRunner,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "lesson-mirror [options] [<command>]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let config = load_config(self.config)?;
        match self.command.unwrap_or(Command::Sync) {
            Command::Sync => run_sync(config),
            Command::Watch(opts) => run_watch(config, opts).await,
            Command::Fetch => run_fetch(config),
            Command::Index => run_index(config),
            Command::Backfill => run_backfill(config),
            Command::Publish => run_publish(config),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Check remote for changes, sync, rebuild catalog, and publish once.
    #[command(override_usage = "lesson-mirror sync [options]")]
    Sync,

    /// Keep syncing on a fixed interval until interrupted.
    #[command(override_usage = "lesson-mirror watch [options]")]
    Watch(WatchOptions),

    /// Copy remote tree into working copy without deleting anything.
    #[command(override_usage = "lesson-mirror fetch [options]")]
    Fetch,

    /// Rebuild lesson catalog of working copy.
    #[command(override_usage = "lesson-mirror index [options]")]
    Index,

    /// Scrape lesson descriptions into sidecar files.
    #[command(override_usage = "lesson-mirror backfill [options]")]
    Backfill,

    /// Commit and push pending changes of working copy.
    #[command(override_usage = "lesson-mirror publish [options]")]
    Publish,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct WatchOptions {
    /// Seconds to wait between passes.
    #[arg(short, long, value_name = "secs")]
    pub interval: Option<u64>,

    /// Failures in a row before waiting twice as long.
    #[arg(short, long, value_name = "count")]
    pub max_retries: Option<u32>,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

fn load_config(path: Option<PathBuf>) -> Result<MirrorConfig> {
    if let Some(path) = path {
        return Ok(MirrorConfig::load(&path)?);
    }

    match default_config_path() {
        Ok(path) if path.is_file() => Ok(MirrorConfig::load(&path)?),
        Ok(_) => Ok(MirrorConfig::default()),
        Err(err) => {
            warn!("{err}, using built-in configuration");
            Ok(MirrorConfig::default())
        }
    }
}

fn sync_target(config: &MirrorConfig) -> Result<SyncTarget> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    Ok(config.sync_target(cwd))
}

fn run_sync(config: MirrorConfig) -> Result<()> {
    let target = sync_target(&config)?;
    info!("start sync of {} into {:?}", target.source(), target.local_path.display());

    let pipeline = Pipeline::new(SystemRunner, &config);
    let outcome = pipeline.run_once(&target);
    if !outcome.is_success() {
        bail!("sync of {} did not complete", target.source());
    }

    Ok(())
}

async fn run_watch(mut config: MirrorConfig, opts: WatchOptions) -> Result<()> {
    if let Some(interval) = opts.interval {
        config.watch.interval = interval;
    }
    if let Some(max_retries) = opts.max_retries {
        config.watch.max_retries = max_retries;
    }

    let target = sync_target(&config)?;
    let backoff = Backoff::new(config.watch.interval(), config.watch.max_retries);
    let pipeline = Arc::new(Pipeline::new(SystemRunner, &config));
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupted, stop syncing"),
            Err(err) => {
                warn!("cannot listen for interrupt: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    lesson_mirror::run_periodic(pipeline, target, backoff, shutdown).await;

    Ok(())
}

fn run_fetch(config: MirrorConfig) -> Result<()> {
    let target = sync_target(&config)?;
    let mirror = Mirror::new(SystemRunner, &config.tools.rclone, config.sync_settings());
    mirror.fetch(&target)?;

    Ok(())
}

fn run_index(config: MirrorConfig) -> Result<()> {
    let target = sync_target(&config)?;
    Indexer::new(config.catalog).write(&target.local_path)?;

    Ok(())
}

fn run_backfill(config: MirrorConfig) -> Result<()> {
    let target = sync_target(&config)?;
    let summary = Backfiller::new(config.catalog).run(&target.local_path);
    if summary.updated > 0 {
        info!("run `lesson-mirror index` to refresh the catalog");
    }

    Ok(())
}

fn run_publish(config: MirrorConfig) -> Result<()> {
    let target = sync_target(&config)?;
    let publisher = Publisher::new(SystemRunner, &config.tools.git);
    match publisher.publish(&target.local_path)? {
        PublishOutcome::NothingToCommit => info!("working copy already published"),
        PublishOutcome::Pushed { message } => info!("published: {message}"),
    }

    Ok(())
}
