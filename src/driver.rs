// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Periodic pipeline driver.
//!
//! Runs the pipeline forever on a fixed interval. Passes never overlap: the
//! next one starts only after the previous one finished and the sleep ran
//! out. Only an interrupt signal stops the loop.
//!
//! # Back-off
//!
//! Failed passes are retried after the usual interval. After `max_retries`
//! failures in a row the driver sleeps twice the interval once, then starts
//! counting again. Any successful pass resets the count.

use crate::{
    command::CommandRunner,
    mirror::SyncTarget,
    pipeline::{PassOutcome, Pipeline},
};

use std::{future::Future, sync::Arc, time::Duration};
use tokio::{task, time::sleep};
use tracing::{error, info, instrument, warn};

/// Retry counter deciding how long to sleep after each pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    interval: Duration,
    max_retries: u32,
    retries: u32,
}

impl Backoff {
    /// Construct new back-off policy.
    pub fn new(interval: Duration, max_retries: u32) -> Self {
        Self {
            interval,
            max_retries,
            retries: 0,
        }
    }

    /// Consecutive failures counted so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Record a successful pass and return how long to sleep.
    pub fn success(&mut self) -> Duration {
        self.retries = 0;
        self.interval
    }

    /// Record a failed pass and return how long to sleep.
    pub fn failure(&mut self) -> Duration {
        self.retries += 1;
        if self.retries >= self.max_retries {
            warn!(
                "failed {} times in a row, sleep {}s before retrying",
                self.retries,
                (self.interval * 2).as_secs()
            );
            self.retries = 0;
            return self.interval * 2;
        }

        warn!(
            "retry {}/{} in {}s",
            self.retries,
            self.max_retries,
            self.interval.as_secs()
        );
        self.interval
    }

    /// Sleep after a pass that could not even report an outcome.
    ///
    /// Leaves the retry count alone.
    pub fn unexpected(&self) -> Duration {
        self.interval
    }
}

/// Run pipeline on target until `shutdown` resolves.
///
/// Every pass runs on a blocking worker thread. A pass that panics is logged
/// and followed by one plain interval of sleep.
#[instrument(skip_all, fields(source = %target.source()), level = "debug")]
pub async fn run_periodic<R>(
    pipeline: Arc<Pipeline<R>>,
    target: SyncTarget,
    mut backoff: Backoff,
    shutdown: impl Future<Output = ()>,
) where
    R: CommandRunner + Clone + 'static,
{
    tokio::pin!(shutdown);
    info!(
        "mirror {} into {:?} every {}s",
        target.source(),
        target.local_path.display(),
        backoff.interval.as_secs()
    );

    loop {
        info!("{} - start pass", crate::clock::sync_timestamp());
        let pass = {
            let pipeline = Arc::clone(&pipeline);
            let target = target.clone();
            task::spawn_blocking(move || pipeline.run_once(&target))
        };

        let delay = tokio::select! {
            joined = pass => match joined {
                Ok(outcome) => next_delay(&mut backoff, &outcome),
                Err(err) => {
                    error!("pass aborted unexpectedly: {err}");
                    backoff.unexpected()
                }
            },
            _ = &mut shutdown => break,
        };

        info!("wait {}s before next pass", delay.as_secs());
        tokio::select! {
            _ = sleep(delay) => {}
            _ = &mut shutdown => break,
        }
    }

    info!("stop mirroring {}", target.source());
}

fn next_delay(backoff: &mut Backoff, outcome: &PassOutcome) -> Duration {
    if outcome.is_success() {
        backoff.success()
    } else {
        backoff.failure()
    }
}
