// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! One-way lesson mirror.
//!
//! Pull a lesson tree from a cloud drive through rclone, rebuild the lesson
//! catalog, and publish the result through git. See [`pipeline`] for the shape
//! of a single pass, and [`driver`] for running passes on a schedule.

pub mod backfill;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod driver;
pub mod mirror;
pub mod path;
pub mod pipeline;
pub mod publish;

pub use backfill::{BackfillSummary, Backfiller};
pub use catalog::{Catalog, Category, ContentUnit, Indexer};
pub use command::{CommandRunner, Invocation, SystemRunner};
pub use config::MirrorConfig;
pub use driver::{run_periodic, Backoff};
pub use mirror::{ChangeReport, Mirror, SyncTarget};
pub use pipeline::{PassOutcome, Pipeline};
pub use publish::{PublishOutcome, Publisher};
