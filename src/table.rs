// SPDX-License-Identifier: AGPL-3.0-only

//! Sequence-column encoding and CSV table writing.
//!
//! Phase-level sequences are persisted inside CSV cells as Python-literal
//! lists (`[0.0, 1.0, nan]`) with `nan` as the missing-value token. The
//! encoding round-trips exactly: decoding an encoded sequence reproduces
//! the original floats, placeholders included. This matches the legacy
//! tables downstream tooling already consumes.

use crate::error::LeverlogError;
use std::path::Path;

/// Encode a sequence as a Python-literal list string.
#[must_use]
pub fn encode_sequence(values: &[f64]) -> String {
    let mut out = String::from("[");
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if v.is_nan() {
            out.push_str("nan");
        } else {
            out.push_str(&format!("{v:?}"));
        }
    }
    out.push(']');
    out
}

/// Decode a Python-literal list string back into a sequence.
///
/// # Errors
///
/// `DataLoad` when a token is neither `nan` nor a float.
pub fn decode_sequence(raw: &str) -> Result<Vec<f64>, LeverlogError> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|tok| {
            let tok = tok.trim();
            if tok == "nan" {
                Ok(f64::NAN)
            } else {
                tok.parse::<f64>().map_err(|_| {
                    LeverlogError::DataLoad(format!("bad sequence token '{tok}'"))
                })
            }
        })
        .collect()
}

/// Encode an integer sequence as a Python-literal list string
/// (`n_reversals_long` column).
#[must_use]
pub fn encode_usize_list(values: &[usize]) -> String {
    let mut out = String::from("[");
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Format a scalar cell: NaN becomes an empty cell (legacy tables leave
/// missing scalars blank), everything else the shortest round-trip form.
#[must_use]
pub fn encode_scalar(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v}")
    }
}

/// Write a table (header + rows of cells) to `path` as CSV.
///
/// # Errors
///
/// `DataLoad` on any write failure.
pub fn write_csv(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<(), LeverlogError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| LeverlogError::DataLoad(format!("{}: {e}", path.display())))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| LeverlogError::DataLoad(format!("{}: {e}", path.display())))?;
    Ok(())
}
