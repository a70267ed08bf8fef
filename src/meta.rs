// SPDX-License-Identifier: AGPL-3.0-only

//! Per-animal metadata table ingestion.
//!
//! The analysed-summary CSV carries one row per animal with its treatment
//! group, first-block letter, and the session date lists framing the
//! reversal. List-valued columns are serialized as Python-literal-like
//! strings (`"['240101', '240102']"`), so parsing is custom
//! strip-and-split, not JSON.

use crate::error::LeverlogError;
use serde::Deserialize;
use std::path::Path;

/// One animal's metadata row.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimalMeta {
    /// Animal identifier embedded in session filenames.
    #[serde(rename = "Rat_ID")]
    pub rat_id: String,
    /// Treatment group label.
    #[serde(rename = "Treatment")]
    pub treatment: String,
    /// Letter of the first block in this animal's session logs.
    #[serde(rename = "presses_first_block")]
    pub presses_first_block: String,
    /// Date tokens of every pre-reversal session, Python-list encoded.
    #[serde(rename = "dates_toR")]
    pub dates_to_reversal: String,
    /// Date tokens of the post-reversal window, Python-list encoded.
    #[serde(rename = "dates_3DaysPostR")]
    pub dates_post_reversal: String,
}

impl AnimalMeta {
    /// First block letter as a char.
    ///
    /// # Errors
    ///
    /// `DataLoad` when the column is empty or longer than one character.
    pub fn first_block_letter(&self) -> Result<char, LeverlogError> {
        let mut chars = self.presses_first_block.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Ok(c),
            _ => Err(LeverlogError::DataLoad(format!(
                "{}: presses_first_block '{}' is not a single uppercase letter",
                self.rat_id, self.presses_first_block
            ))),
        }
    }

    /// Parsed pre-reversal date tokens.
    #[must_use]
    pub fn to_reversal_dates(&self) -> Vec<String> {
        parse_string_list(&self.dates_to_reversal)
    }

    /// Parsed post-reversal date tokens.
    #[must_use]
    pub fn post_reversal_dates(&self) -> Vec<String> {
        parse_string_list(&self.dates_post_reversal)
    }

    /// The reversal-day date: the last pre-reversal session.
    #[must_use]
    pub fn on_reversal_date(&self) -> Option<String> {
        self.to_reversal_dates().pop()
    }
}

/// Parse a Python-literal string list: `"['240101', '240102']"` →
/// `["240101", "240102"]`. Empty and bare-empty-list inputs yield an
/// empty vec.
#[must_use]
pub fn parse_string_list(raw: &str) -> Vec<String> {
    let inner = raw
        .trim()
        .trim_matches(|c| c == '[' || c == ']' || c == '\'' || c == '"');
    if inner.is_empty() {
        return Vec::new();
    }
    inner
        .split("', '")
        .map(|s| s.trim_matches(|c| c == '\'' || c == '"' || c == ' ').to_string())
        .collect()
}

/// Load the per-animal metadata table.
///
/// # Errors
///
/// `DataLoad` when the file cannot be read or a row fails to deserialize.
pub fn load_metadata(path: &Path) -> Result<Vec<AnimalMeta>, LeverlogError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| LeverlogError::DataLoad(format!("{}: {e}", path.display())))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: AnimalMeta =
            record.map_err(|e| LeverlogError::DataLoad(format!("{}: {e}", path.display())))?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(LeverlogError::DataLoad(format!(
            "{}: metadata table has no rows",
            path.display()
        )));
    }
    Ok(rows)
}
