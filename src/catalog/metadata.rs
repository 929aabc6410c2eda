// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Per-lesson sidecar metadata.
//!
//! Every lesson folder may carry a small hand-editable text file next to its
//! marker page that overrides the title, author, and description the indexer
//! would otherwise derive from the folder name:
//!
//! ```text
//! Title: Unit 1 - Greetings
//! Author: Ms. Lan
//! Description: Vocabulary and phrases for saying hello.
//! ```
//!
//! # Parser Contract
//!
//! - Input is split into lines. Lines without a colon are ignored.
//! - Each line is split at its __first__ colon into key and value.
//! - Keys are trimmed and case-folded, values are trimmed.
//! - `title`, `author`, and `description` are recognized. A later line with
//!   the same key replaces an earlier one. Empty values count as absent.
//! - Any other key is kept verbatim in [`UnitMetadata::extra`], so rewriting a
//!   hand-edited file never throws information away.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
};

/// Structured contents of a sidecar file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnitMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,

    /// Unrecognized `key: value` pairs in file order, key as written.
    pub extra: Vec<(String, String)>,
}

impl UnitMetadata {
    /// Parse sidecar text.
    ///
    /// Never fails: anything that does not fit the contract is skipped.
    pub fn parse(content: &str) -> Self {
        let mut metadata = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };

            let key = key.trim();
            let value = value.trim();
            let slot = match key.to_lowercase().as_str() {
                "title" => &mut metadata.title,
                "author" => &mut metadata.author,
                "description" => &mut metadata.description,
                _ => {
                    if !key.is_empty() {
                        metadata.extra.push((key.to_string(), value.to_string()));
                    }
                    continue;
                }
            };

            *slot = (!value.is_empty()).then(|| value.to_string());
        }

        metadata
    }

    /// Read sidecar file at target path.
    ///
    /// # Errors
    ///
    /// - Return [`MetadataError::Read`] if the file exists but cannot be read.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        read_to_string(path)
            .map(|content| Self::parse(&content))
            .map_err(|err| MetadataError::Read {
                source: err,
                path: path.to_path_buf(),
            })
    }

    /// Read sidecar file if it exists.
    ///
    /// # Errors
    ///
    /// - Return [`MetadataError::Read`] if the file exists but cannot be read.
    pub fn read_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        Self::read(path).map(Some)
    }
}

impl Display for UnitMetadata {
    /// Render as `Title:`, `Author:`, `Description:` lines followed by any
    /// extra pairs. Absent fields are left out. No trailing newline.
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let known = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Description", &self.description),
        ];
        let lines = known
            .into_iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (key, value)))
            .chain(
                self.extra
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );

        for (index, (key, value)) in lines.enumerate() {
            if index > 0 {
                fmt.write_str("\n")?;
            }
            write!(fmt, "{key}: {value}")?;
        }

        Ok(())
    }
}

/// Sidecar metadata error types.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Sidecar file cannot be read.
    #[error("failed to read metadata file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Sidecar file cannot be written.
    #[error("failed to write metadata file at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = MetadataError> = std::result::Result<T, E>;
