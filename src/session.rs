// SPDX-License-Identifier: AGPL-3.0-only

//! Session-log location and parsing.
//!
//! One session log holds one animal's data for one date. The apparatus
//! writes a fixed-size header (length differs by export era) followed by
//! whitespace-tokenized rows tagged with a leading label token (`R:`, `S:`,
//! a block letter, ...). Rows of interest are found by literal substring
//! scan — a missing marker is a normal outcome for short sessions, so
//! lookup returns `Option` rather than an error.

use crate::error::LeverlogError;
use std::path::{Path, PathBuf};

/// Header length of a session log, by data-generation era.
///
/// The apparatus firmware was updated between cohorts; older exports carry
/// a 19-line preamble, newer lever-press exports a 25-line one. The header
/// is discarded at load time because its free text can collide with marker
/// substring search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEra {
    /// Lever-press era exports: 25 header lines.
    LeverPress,
    /// Legacy exports: 19 header lines.
    Legacy,
}

impl LogEra {
    /// Number of leading lines discarded on load.
    #[must_use]
    pub const fn header_lines(&self) -> usize {
        match self {
            Self::LeverPress => 25,
            Self::Legacy => 19,
        }
    }

    /// Parse from CLI argument string.
    #[must_use]
    pub fn from_arg(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "legacy" | "19" => Self::Legacy,
            "leverpress" | "lever-press" | "25" | "default" => Self::LeverPress,
            _ => {
                eprintln!("  WARNING: Unknown log era '{s}', using lever-press (25)");
                Self::LeverPress
            }
        }
    }
}

/// One parsed session log: the post-header lines of one animal's file for
/// one date. Read-only; discarded after the session's blocks are extracted.
#[derive(Debug, Clone)]
pub struct SessionLog {
    lines: Vec<String>,
    path: PathBuf,
}

impl SessionLog {
    /// Read a session log, discarding the era's header slice.
    ///
    /// # Errors
    ///
    /// Returns `LeverlogError::Io` if the file cannot be read.
    pub fn load(path: &Path, era: LogEra) -> Result<Self, LeverlogError> {
        let text = std::fs::read_to_string(path)?;
        let lines: Vec<String> = text
            .lines()
            .skip(era.header_lines())
            .map(str::to_owned)
            .collect();
        Ok(Self {
            lines,
            path: path.to_path_buf(),
        })
    }

    /// Build a log directly from lines (tests, synthetic sessions).
    #[must_use]
    pub fn from_lines(lines: Vec<String>, path: PathBuf) -> Self {
        Self { lines, path }
    }

    /// Index of the first line containing `substring` literally, scanning
    /// from the top. `None` when absent — common for short sessions, so
    /// callers must handle it explicitly.
    #[must_use]
    pub fn find_marker(&self, substring: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.contains(substring))
    }

    /// Like [`find_marker`](Self::find_marker) but required: converts a
    /// missing marker into a typed error carrying the marker and file path.
    ///
    /// # Errors
    ///
    /// Returns `LeverlogError::MarkerNotFound` if the marker is absent.
    pub fn require_marker(&self, substring: &str) -> Result<usize, LeverlogError> {
        self.find_marker(substring)
            .ok_or_else(|| LeverlogError::MarkerNotFound {
                marker: substring.to_string(),
                path: self.path.clone(),
            })
    }

    /// Line at `index`, if present.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Numeric fields of the row at `index`: the row is whitespace-tokenized
    /// and the leading label token dropped. Tokens that fail to parse as
    /// `f64` are dropped too (trailing apparatus junk).
    #[must_use]
    pub fn data_row(&self, index: usize) -> Vec<f64> {
        self.lines
            .get(index)
            .map(|l| {
                l.split_whitespace()
                    .skip(1)
                    .filter_map(|t| t.parse::<f64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of post-header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the log holds no post-header lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Path the log was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Locate the one session log for an animal and date token.
///
/// Matches filenames of the form `{century_prefix}{date_token}_*{animal_id}*`
/// within `dir`. Zero matches is a typed `FileNotFound` the caller recovers
/// from by skipping that date. Multiple matches take the lexicographically
/// first file after a warning, so reruns are deterministic regardless of
/// directory order.
///
/// # Errors
///
/// Returns `LeverlogError::FileNotFound` when nothing matches, or
/// `LeverlogError::Io` when the directory cannot be read.
pub fn locate_session_file(
    dir: &Path,
    century_prefix: &str,
    date_token: &str,
    animal_id: &str,
) -> Result<PathBuf, LeverlogError> {
    let prefix = format!("{century_prefix}{date_token}_");
    let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.contains(animal_id))
        })
        .collect();

    matches.sort();

    match matches.len() {
        0 => Err(LeverlogError::FileNotFound {
            pattern: format!("{}/{prefix}*{animal_id}*", dir.display()),
        }),
        1 => Ok(matches.remove(0)),
        n => {
            eprintln!(
                "  WARNING: {n} session files match {prefix}*{animal_id}*, taking {}",
                matches[0].display()
            );
            Ok(matches.remove(0))
        }
    }
}
