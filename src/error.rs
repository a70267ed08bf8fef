// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for session-log parsing and sequence analysis.
//!
//! Replaces `Result<_, String>` in public APIs with a proper enum so callers
//! can pattern-match on failure modes (missing file, missing marker,
//! degenerate sequence) rather than parsing opaque strings.

use std::fmt;
use std::path::PathBuf;

/// Errors arising from session location, log parsing, or metric computation.
#[derive(Debug)]
pub enum LeverlogError {
    /// No session log matches the expected filename pattern.
    /// Recoverable per-date: callers skip the date with a warning.
    FileNotFound {
        /// The pattern that matched nothing, e.g. `20231201_*LSDB04*`.
        pattern: String,
    },

    /// An expected row marker (`R:`, `S:`, a block letter) is absent
    /// from a parsed session log.
    MarkerNotFound {
        /// The marker substring that was searched for.
        marker: String,
        /// The session file the marker was missing from.
        path: PathBuf,
    },

    /// A trial sequence contains no winning run (all zeros), so the
    /// win-streak metric is undefined.
    NoWinRun,

    /// A metric was requested over an empty (or all-missing) sequence.
    EmptySequence,

    /// Metadata or output table loading/writing failed (path, underlying
    /// IO or parse error).
    DataLoad(String),

    /// Underlying IO failure while reading a session log.
    Io(std::io::Error),
}

impl fmt::Display for LeverlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { pattern } => {
                write!(f, "No session file matching {pattern}")
            }
            Self::MarkerNotFound { marker, path } => {
                write!(f, "Marker '{marker}' not found in {}", path.display())
            }
            Self::NoWinRun => write!(f, "Trial sequence has no winning run"),
            Self::EmptySequence => write!(f, "Trial sequence is empty"),
            Self::DataLoad(msg) => write!(f, "Data loading failed: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for LeverlogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LeverlogError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for LeverlogError {
    fn from(e: csv::Error) -> Self {
        Self::DataLoad(e.to_string())
    }
}
