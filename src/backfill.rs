// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Description backfilling from lesson pages.
//!
//! Lessons in the `slides` and `worksheets` categories rarely come with a
//! written description. Their marker page usually opens with a heading or a
//! paragraph that says what the lesson is about, so that text is scraped and
//! stored in the lesson's sidecar file.
//!
//! Only the description is owned by this pass. A title or author already in
//! the sidecar is kept, and missing ones are filled with the same defaults the
//! indexer would use. The sidecar is only rewritten when its content actually
//! changes. The catalog is not touched; run the indexer afterwards.

use crate::{
    catalog::{
        metadata::{MetadataError, UnitMetadata},
        naming::{display_name, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION},
    },
    config::CatalogSettings,
};

use scraper::{ElementRef, Html, Selector};
use std::{
    fs::{read_dir, read_to_string, write},
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, info, instrument, warn};

/// Categories whose lessons get their descriptions backfilled.
pub const BACKFILL_CATEGORIES: [&str; 2] = ["slides", "worksheets"];

/// Longest description kept, in characters, ellipsis included.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Appended to descriptions cut short.
pub const ELLIPSIS: &str = "...";

/// Fallback for worksheets whose page has no usable text.
pub const WORKSHEET_DESCRIPTION: &str = "Bài tập bổ trợ cho học sinh.";

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

selector!(BODY_SELECTOR, "body");

/// Tags searched for description text, most preferred first.
const TAG_PRIORITY: [&str; 5] = ["h1", "h2", "h3", "p", "div"];

static TAG_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    TAG_PRIORITY
        .iter()
        .map(|tag| Selector::parse(tag).unwrap())
        .collect()
});

/// Pull a short description out of an HTML page.
///
/// Searches `<body>` for the first `h1`, then `h2`, `h3`, `p`, and `div` with
/// any visible text. Returns `None` if nothing has text.
pub fn extract_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let body = document.select(&BODY_SELECTOR).next()?;

    TAG_SELECTORS.iter().find_map(|selector| {
        body.select(selector)
            .map(visible_text)
            .find(|text| !text.is_empty())
            .map(|text| shorten(&text, MAX_DESCRIPTION_CHARS))
    })
}

/// Description for a lesson page, with the category fallback applied.
pub fn description_for(html: &str, category: &str) -> String {
    extract_description(html).unwrap_or_else(|| fallback_description(category).to_string())
}

/// Fallback used when a page yields no text.
pub fn fallback_description(category: &str) -> &'static str {
    if category == "worksheets" {
        WORKSHEET_DESCRIPTION
    } else {
        DEFAULT_DESCRIPTION
    }
}

/// Text nodes of an element, trimmed, joined by single spaces.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shorten text to at most `max` characters.
///
/// Text that fits is returned unchanged. Otherwise it is cut back to the last
/// whole word that leaves room for [`ELLIPSIS`], which is then appended. A
/// single word longer than the limit is cut mid-word.
pub fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let budget = max.saturating_sub(ELLIPSIS.chars().count());
    let cut = text
        .char_indices()
        .nth(budget)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let (head, tail) = text.split_at(cut);

    let head = if tail.starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(space) => &head[..space],
            None => head,
        }
    };

    format!("{}{ELLIPSIS}", head.trim_end())
}

/// Tally of one backfill pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillSummary {
    /// Sidecar files created or rewritten.
    pub updated: usize,

    /// Sidecar files already up to date.
    pub unchanged: usize,

    /// Folders without a marker page, or whose sidecar could not be written.
    pub skipped: usize,
}

/// Rewrite lesson sidecars with scraped descriptions.
#[derive(Debug, Clone)]
pub struct Backfiller {
    settings: CatalogSettings,
}

impl Backfiller {
    /// Construct new backfiller.
    pub fn new(settings: CatalogSettings) -> Self {
        Self { settings }
    }

    /// Backfill every lesson directly below the backfilled categories.
    ///
    /// Failures on single lessons are logged and counted as skipped.
    #[instrument(skip(self, root), level = "debug")]
    pub fn run(&self, root: impl AsRef<Path>) -> BackfillSummary {
        let root = root.as_ref();
        let mut summary = BackfillSummary::default();

        for category in BACKFILL_CATEGORIES {
            for lesson in child_dirs(&root.join(category)) {
                match self.backfill_lesson(&lesson, category) {
                    Ok(true) => summary.updated += 1,
                    Ok(false) => summary.unchanged += 1,
                    Err(err) => {
                        warn!("{err}");
                        summary.skipped += 1;
                    }
                }
            }
        }

        info!(
            "backfilled descriptions: {} updated, {} unchanged, {} skipped",
            summary.updated, summary.unchanged, summary.skipped
        );

        summary
    }

    /// Backfill one lesson folder.
    ///
    /// Returns whether the sidecar was written.
    ///
    /// # Errors
    ///
    /// - Return [`BackfillError::MissingMarker`] if the folder has no marker
    ///   page.
    /// - Return [`BackfillError::Metadata`] if the sidecar cannot be written.
    pub fn backfill_lesson(&self, lesson: &Path, category: &str) -> Result<bool> {
        let marker = lesson.join(&self.settings.marker);
        if !marker.is_file() {
            return Err(BackfillError::MissingMarker { lesson: lesson.to_path_buf() });
        }

        let description = match read_to_string(&marker) {
            Ok(html) => description_for(&html, category),
            Err(err) => {
                warn!("cannot read {:?}: {err}", marker.display());
                DEFAULT_DESCRIPTION.to_string()
            }
        };

        let sidecar = lesson.join(&self.settings.sidecar);
        let current = match read_to_string(&sidecar) {
            Ok(content) => Some(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                // Unreadable sidecar gets replaced with folder defaults.
                warn!("cannot read {:?}: {err}", sidecar.display());
                None
            }
        };

        let mut metadata = current
            .as_deref()
            .map(UnitMetadata::parse)
            .unwrap_or_default();
        if metadata.title.is_none() {
            let folder = lesson
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            metadata.title = Some(display_name(&folder));
        }
        if metadata.author.is_none() {
            metadata.author = Some(DEFAULT_AUTHOR.into());
        }
        metadata.description = Some(description);

        let rendered = metadata.to_string();
        if current.as_deref().map(str::trim) == Some(rendered.trim()) {
            debug!("{:?} is up to date", sidecar.display());
            return Ok(false);
        }

        write(&sidecar, rendered.as_bytes()).map_err(|err| MetadataError::Write {
            source: err,
            path: sidecar.clone(),
        })?;
        info!("updated description in {:?}", sidecar.display());

        Ok(true)
    }
}

/// Sorted child directories, empty if the parent cannot be listed.
fn child_dirs(parent: &Path) -> Vec<PathBuf> {
    let entries = match read_dir(parent) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("skip {:?}: {err}", parent.display());
            return Vec::new();
        }
    };

    let mut dirs = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    dirs.sort();
    dirs
}

/// Backfill error types.
#[derive(Debug, thiserror::Error)]
pub enum BackfillError {
    /// Folder lacks a marker page.
    #[error("skip {:?}: marker page not found", lesson.display())]
    MissingMarker { lesson: PathBuf },

    /// Sidecar file cannot be written.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Friendly result alias :3
pub type Result<T, E = BackfillError> = std::result::Result<T, E>;
