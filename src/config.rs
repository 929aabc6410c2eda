// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the mirror configuration file to simplify the process
//! of serialization and deserialization. Every field has a default, so an
//! empty file (or no file at all) describes the stock lesson mirror:
//! `gdrive:/PROJECTS/GEN8-LESSONS` pulled into `lessons`.

use crate::mirror::SyncTarget;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// Mirror configuration layout.
///
/// # General Layout
///
/// - `[remote]`: which tree on the cloud drive to mirror.
/// - `[local]`: where the working copy lives.
/// - `[tools]`: executables to call for syncing and publishing.
/// - `[sync]`: knobs passed through to the sync tool.
/// - `[watch]`: periodic driver timing.
/// - `[catalog]`: file names that make up a lesson and its index.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub remote: RemoteSettings,
    pub local: LocalSettings,
    pub tools: ToolSettings,
    pub sync: SyncSettings,
    pub watch: WatchSettings,
    pub catalog: CatalogSettings,
}

impl MirrorConfig {
    /// Load configuration file at target path.
    ///
    /// A relative local path is resolved against the directory holding the
    /// configuration file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = read_to_string(path).map_err(|err| ConfigError::Read {
            source: err,
            path: path.to_path_buf(),
        })?;

        let mut config: MirrorConfig = data.parse()?;
        if let Some(parent) = path.parent() {
            config.local.path = parent.join(&config.local.path);
        }

        Ok(config)
    }

    /// Build sync target for this configuration.
    ///
    /// Relative local paths are resolved against `base`.
    pub fn sync_target(&self, base: impl AsRef<Path>) -> SyncTarget {
        SyncTarget::new(
            self.remote.name.clone(),
            self.remote.path.clone(),
            base.as_ref().join(&self.local.path),
        )
    }

    /// Sync settings with the catalog file added to the excludes.
    ///
    /// The catalog only exists locally, so a full sync would delete it.
    pub fn sync_settings(&self) -> SyncSettings {
        let mut settings = self.sync.clone();
        let catalog = format!("/{}", self.catalog.index.trim_start_matches('/'));
        if !settings.exclude.contains(&catalog) {
            settings.exclude.push(catalog);
        }

        settings
    }
}

impl FromStr for MirrorConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: MirrorConfig = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on local path field.
        config.local.path = PathBuf::from(
            shellexpand::full(config.local.path.to_string_lossy().as_ref())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        );

        Ok(config)
    }
}

impl Display for MirrorConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Remote tree on the cloud drive.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Name of the rclone remote.
    pub name: String,

    /// Path of the mirrored tree inside the remote.
    pub path: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            name: "gdrive".into(),
            path: "PROJECTS/GEN8-LESSONS".into(),
        }
    }
}

/// Local working copy.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalSettings {
    /// Path to working copy, which is also the published git repository.
    pub path: PathBuf,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("lessons"),
        }
    }
}

/// External executables.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolSettings {
    pub rclone: String,
    pub git: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            rclone: "rclone".into(),
            git: "git".into(),
        }
    }
}

/// Knobs passed to the sync tool.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Number of file transfers to run in parallel.
    pub transfers: u32,

    /// Number of existence checkers to run in parallel.
    pub checkers: u32,

    /// Local-only paths the sync tool must never delete.
    ///
    /// A full directory sync removes anything the remote lacks, which would
    /// include the git directory. The catalog file is always added on top,
    /// see [`MirrorConfig::sync_settings`].
    pub exclude: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            transfers: 4,
            checkers: 8,
            exclude: vec!["/.git/**".into()],
        }
    }
}

/// Periodic driver timing.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Seconds to sleep between passes.
    pub interval: u64,

    /// Consecutive failures before the sleep is doubled once.
    pub max_retries: u32,
}

impl WatchSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval: 300,
            max_retries: 3,
        }
    }
}

/// File names making up a lesson and the catalog.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Marker page whose presence makes a folder a lesson.
    pub marker: String,

    /// Optional per-lesson metadata file.
    pub sidecar: String,

    /// Catalog file written at the top of the working copy.
    pub index: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            marker: "index.html".into(),
            sidecar: "info.txt".into(),
            index: "lessons.json".into(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
