// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Lesson catalog generation.
//!
//! The __catalog__ is a JSON index of everything in the working copy that a
//! front end needs to list lessons: which categories exist, and which lessons
//! live in them.
//!
//! # Lessons
//!
//! A __lesson__ (content unit) is any folder below the working copy root that
//! directly contains the marker page, `index.html` by default. The root itself
//! never counts. A lesson's path relative to the root decides where it goes:
//!
//! - `slides/unit-1-vocab` belongs to the `slides` category and is titled
//!   "Unit 1 Vocab" unless told otherwise.
//! - `welcome` has no category, and is titled "Welcome".
//!
//! Title, author, and description can be overridden per lesson through a
//! sidecar file, see [`metadata`].
//!
//! # Regeneration
//!
//! The catalog is always rebuilt from scratch. It is never patched, so a
//! deleted lesson folder can never linger in it. The walk is sorted by file
//! name, and entries keep the order the walk found them in, so indexing an
//! unchanged tree twice gives byte-identical files.

pub mod metadata;
pub mod naming;

use crate::{
    catalog::{
        metadata::UnitMetadata,
        naming::{category_icon, default_title, display_name, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION},
    },
    config::CatalogSettings,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    fs::{read, write},
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

/// Lesson category, keyed by the first path segment of its lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub name: String,
    pub icon: String,
}

impl Category {
    /// Derive category from its key.
    pub fn from_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: display_name(&key),
            icon: category_icon(&key).to_string(),
            key,
        }
    }
}

/// One lesson folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Path relative to catalog root, always `/` separated.
    pub path: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: Option<String>,
}

impl ContentUnit {
    /// Derive lesson from its relative path, using defaults for everything
    /// the path cannot tell.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let segments = path.split('/').collect::<Vec<_>>();
        let (category, title) = match segments.as_slice() {
            [single] => (None, display_name(single)),
            [first, rest @ ..] => (Some(first.to_string()), default_title(rest.iter().copied())),
            [] => (None, String::new()),
        };

        Self {
            title,
            author: DEFAULT_AUTHOR.into(),
            description: DEFAULT_DESCRIPTION.into(),
            category,
            path,
        }
    }

    /// Override defaults with whatever sidecar metadata provides.
    pub fn apply(&mut self, metadata: UnitMetadata) {
        if let Some(title) = metadata.title {
            self.title = title;
        }
        if let Some(author) = metadata.author {
            self.author = author;
        }
        if let Some(description) = metadata.description {
            self.description = description;
        }
    }
}

/// Full lesson index.
///
/// Both maps keep insertion order, which is the walk order of the indexer.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: IndexMap<String, Category>,
    pub lessons: IndexMap<String, ContentUnit>,
}

impl Catalog {
    /// Add lesson, registering its category if new.
    pub fn insert(&mut self, unit: ContentUnit) {
        if let Some(key) = &unit.category {
            self.categories
                .entry(key.clone())
                .or_insert_with(|| Category::from_key(key.clone()));
        }
        self.lessons.insert(unit.path.clone(), unit);
    }

    /// Render catalog as pretty JSON with a trailing newline.
    ///
    /// Non-ASCII text is written as-is, never escaped.
    ///
    /// # Errors
    ///
    /// - Return [`CatalogError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"  ");
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        buffer.push(b'\n');

        // INVARIANT: serde_json only ever emits valid UTF-8.
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Result of writing the catalog to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Catalog file was created or its content changed.
    Written,

    /// Catalog file already had identical content.
    Unchanged,
}

/// Build catalogs for a working copy.
#[derive(Debug, Clone)]
pub struct Indexer {
    settings: CatalogSettings,
}

impl Indexer {
    /// Construct new indexer.
    pub fn new(settings: CatalogSettings) -> Self {
        Self { settings }
    }

    /// Path of catalog file for target root.
    pub fn index_path(&self, root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(&self.settings.index)
    }

    /// Walk root and collect every lesson into a fresh catalog.
    ///
    /// Sidecar failures are logged and the lesson keeps its defaults. Walk
    /// errors on single entries are logged and skipped.
    #[instrument(skip(self, root), level = "debug")]
    pub fn build(&self, root: impl AsRef<Path>) -> Catalog {
        let root = root.as_ref();
        let mut catalog = Catalog::default();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_git_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skip unreadable entry: {err}");
                    continue;
                }
            };

            if !entry.file_type().is_dir() || !entry.path().join(&self.settings.marker).is_file() {
                continue;
            }

            let Some(relative) = relative_key(root, entry.path()) else {
                continue;
            };

            let mut unit = ContentUnit::from_path(relative);
            let sidecar = entry.path().join(&self.settings.sidecar);
            match UnitMetadata::read_optional(&sidecar) {
                Ok(Some(metadata)) => unit.apply(metadata),
                Ok(None) => {}
                Err(err) => warn!("{err}, using defaults for {:?}", unit.path),
            }

            debug!("found lesson {:?}", unit.path);
            catalog.insert(unit);
        }

        info!(
            "indexed {} lessons in {} categories",
            catalog.lessons.len(),
            catalog.categories.len()
        );

        catalog
    }

    /// Build catalog for root and write it to the catalog file.
    ///
    /// The file is left untouched if its content would not change.
    ///
    /// # Errors
    ///
    /// - Return [`CatalogError::Serialize`] if serialization fails.
    /// - Return [`CatalogError::Write`] if catalog file cannot be written.
    #[instrument(skip(self, root), level = "debug")]
    pub fn write(&self, root: impl AsRef<Path>) -> Result<WriteOutcome> {
        let root = root.as_ref();
        let json = self.build(root).to_json()?;
        let path = self.index_path(root);

        if read(&path).is_ok_and(|current| current == json.as_bytes()) {
            info!("catalog {:?} is up to date", path.display());
            return Ok(WriteOutcome::Unchanged);
        }

        write(&path, json.as_bytes()).map_err(|err| CatalogError::Write {
            source: err,
            path: path.clone(),
        })?;
        info!("wrote catalog {:?}", path.display());

        Ok(WriteOutcome::Written)
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ".git"
}

/// Relative path from root as a `/` separated key.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>();

    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Catalog error types.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog cannot be serialized.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// Catalog file cannot be written.
    #[error("failed to write catalog to {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
