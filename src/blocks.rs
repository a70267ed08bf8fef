// SPDX-License-Identifier: AGPL-3.0-only

//! Block totals and per-block sequence reconstruction.
//!
//! A session is segmented into "blocks", each tied to one stimulus-response
//! rule and labeled by a single uppercase letter. The `R:` row carries
//! per-block correct-trial counts and the `S:` row incorrect-trial counts;
//! both are laid out 5 values per data row, spanning two consecutive rows
//! when an animal progressed through more than 5 blocks in one session.
//!
//! Outcome data rows for a block follow its `{letter}:` marker, also 5
//! values per row, with one leading sentinel value that belongs to no trial.
//! Latency rows share the geometry but use a session-wide fixed 100-trial
//! layout with no sentinel.

use crate::error::LeverlogError;
use crate::session::SessionLog;

/// Values per data row in the apparatus export.
const VALUES_PER_ROW: usize = 5;

/// Fixed session-wide trial count used by the latency layout.
const LATENCY_TRIALS: usize = 100;

/// The sentinel block: a fixed run of unscored trials. Its data rows carry
/// nothing usable, so its trials are synthesized as missing-value
/// placeholders instead of being parsed.
pub const UNSCORED_BLOCK: char = 'O';

/// Ordered per-block trial totals for one session.
///
/// Letters are consecutive uppercase characters starting at the animal's
/// first-block letter; positions whose correct+incorrect sum is exactly
/// zero (never reached) are dropped before lettering. Counts stay `f64`
/// as parsed; round at use sites.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTotals {
    entries: Vec<(char, f64)>,
}

impl BlockTotals {
    /// Block letters in order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.iter().map(|(l, _)| *l)
    }

    /// Total for a letter, if the block was reached.
    #[must_use]
    pub fn total(&self, letter: char) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, t)| *t)
    }

    /// Entry at block index (0 = first block).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<(char, f64)> {
        self.entries.get(index).copied()
    }

    /// Number of blocks the animal traversed this session. Used as the
    /// per-session "number of reversals" proxy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no block saw any trial.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all block totals.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, t)| t).sum()
    }

    /// Ordered view of `(letter, total)` pairs.
    #[must_use]
    pub fn entries(&self) -> &[(char, f64)] {
        &self.entries
    }
}

/// Read the two data rows following `marker` and concatenate their numeric
/// fields. Two rows are always read: sessions with more than 5 blocks
/// spill counts onto a second row.
fn marker_counts(log: &SessionLog, marker: &str) -> Result<Vec<f64>, LeverlogError> {
    let idx = log.require_marker(marker)?;
    let mut counts = log.data_row(idx + 1);
    counts.extend(log.data_row(idx + 2));
    Ok(counts)
}

/// Resolve per-block trial totals for one session.
///
/// Sums the `R:` (correct) and `S:` (incorrect) counts elementwise, drops
/// exact-zero positions, and assigns consecutive uppercase letters starting
/// at `first_block_letter` (from the animal's metadata).
///
/// # Errors
///
/// Returns `LeverlogError::MarkerNotFound` if either counts row is absent.
pub fn resolve_block_totals(
    log: &SessionLog,
    first_block_letter: char,
) -> Result<BlockTotals, LeverlogError> {
    let correct = marker_counts(log, "R:")?;
    let incorrect = marker_counts(log, "S:")?;

    let totals: Vec<f64> = correct
        .iter()
        .zip(incorrect.iter())
        .map(|(c, i)| c + i)
        .filter(|t| *t != 0.0)
        .collect();

    let alphabet: Vec<char> = ('A'..='Z').collect();
    let start = alphabet
        .iter()
        .position(|&c| c == first_block_letter)
        .ok_or_else(|| {
            LeverlogError::DataLoad(format!(
                "first block letter '{first_block_letter}' is not an uppercase ASCII letter"
            ))
        })?;

    let entries = alphabet[start..]
        .iter()
        .zip(totals)
        .map(|(&l, t)| (l, t))
        .collect();

    Ok(BlockTotals { entries })
}

/// Reconstruct a block's ordered per-trial outcomes (0.0/1.0).
///
/// Reads `ceil((total + 1) / 5)` data rows after the `{letter}:` marker,
/// drops each row's label token, flattens, discards the leading sentinel
/// value, and keeps exactly `total` elements.
///
/// # Errors
///
/// Returns `LeverlogError::MarkerNotFound` if the block marker is absent.
pub fn extract_block_outcomes(
    log: &SessionLog,
    letter: char,
    total: f64,
) -> Result<Vec<f64>, LeverlogError> {
    let idx = log.require_marker(&format!("{letter}:"))?;
    let total = total as usize;
    let rows_needed = (total + 1).div_ceil(VALUES_PER_ROW);

    let mut flat = Vec::with_capacity(rows_needed * VALUES_PER_ROW);
    for i in 1..=rows_needed {
        flat.extend(log.data_row(idx + i));
    }

    // Trials begin at position 1; position 0 is sentinel padding.
    Ok(flat
        .into_iter()
        .skip(1)
        .take(total)
        .collect())
}

/// Extract a full session's latencies under the fixed-100 layout.
///
/// Latency rows hold 5 values each for exactly 100 trials regardless of the
/// resolved block totals; there is no leading sentinel, so 20 rows after the
/// marker are read and flattened.
///
/// # Errors
///
/// Returns `LeverlogError::MarkerNotFound` if the channel marker is absent.
pub fn extract_latencies_fixed100(
    log: &SessionLog,
    channel: char,
) -> Result<Vec<f64>, LeverlogError> {
    let idx = log.require_marker(&format!("{channel}:"))?;
    let rows = (LATENCY_TRIALS + 1).div_ceil(VALUES_PER_ROW) - 1;

    let mut flat = Vec::with_capacity(LATENCY_TRIALS);
    for j in 1..=rows {
        flat.extend(log.data_row(idx + j));
    }
    Ok(flat)
}

/// Extract block-2 latencies: the fixed-100 session latencies sliced to
/// `[block1_total, block1_total + block2_total)` using totals already
/// resolved for this session.
///
/// # Errors
///
/// Returns `MarkerNotFound` if the channel marker is absent, or
/// `DataLoad` if the session has fewer than two blocks.
pub fn extract_block2_latencies(
    log: &SessionLog,
    channel: char,
    totals: &BlockTotals,
) -> Result<Vec<f64>, LeverlogError> {
    let (_, b1) = totals.get(0).ok_or_else(|| {
        LeverlogError::DataLoad(format!("no first block resolved in {}", log.path().display()))
    })?;
    let (_, b2) = totals.get(1).ok_or_else(|| {
        LeverlogError::DataLoad(format!(
            "no second block resolved in {}",
            log.path().display()
        ))
    })?;

    let all = extract_latencies_fixed100(log, channel)?;
    let lo = b1 as usize;
    let hi = (b1 + b2) as usize;
    Ok(all
        .into_iter()
        .skip(lo)
        .take(hi.saturating_sub(lo))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::session::SessionLog;
    use std::path::PathBuf;

    fn synthetic_log(lines: &[&str]) -> SessionLog {
        SessionLog::from_lines(
            lines.iter().map(|s| (*s).to_string()).collect(),
            PathBuf::from("synthetic"),
        )
    }

    /// A session with blocks A (10 trials) and B (15 trials). Markers stand
    /// alone; data rows carry a leading start-index label.
    fn two_block_log() -> SessionLog {
        synthetic_log(&[
            "R:",
            "     0:      6.000      9.000      0.000      0.000      0.000",
            "     5:      0.000      0.000      0.000      0.000      0.000",
            "S:",
            "     0:      4.000      6.000      0.000      0.000      0.000",
            "     5:      0.000      0.000      0.000      0.000      0.000",
            // A: sentinel + 10 outcomes → ceil(11/5) = 3 rows
            "A:",
            "     0:      0.000      1.000      0.000      1.000      1.000",
            "     5:      0.000      0.000      1.000      1.000      0.000",
            "    10:      1.000      0.000      0.000      0.000      0.000",
            // B: sentinel + 15 outcomes → ceil(16/5) = 4 rows
            "B:",
            "     0:      0.000      1.000      1.000      0.000      1.000",
            "     5:      0.000      1.000      1.000      1.000      0.000",
            "    10:      1.000      0.000      1.000      1.000      1.000",
            "    15:      0.000      0.000      0.000      0.000      0.000",
        ])
    }

    #[test]
    fn totals_two_blocks_first_letter_a() {
        let totals = resolve_block_totals(&two_block_log(), 'A').expect("resolve");
        assert_eq!(totals.entries(), &[('A', 10.0), ('B', 15.0)]);
    }

    #[test]
    fn totals_drop_zero_blocks() {
        let totals = resolve_block_totals(&two_block_log(), 'A').expect("resolve");
        assert_eq!(totals.len(), 2);
        assert!(totals.total('C').is_none());
    }

    #[test]
    fn totals_letters_start_at_metadata_letter() {
        let totals = resolve_block_totals(&two_block_log(), 'V').expect("resolve");
        assert_eq!(totals.entries(), &[('V', 10.0), ('W', 15.0)]);
    }

    #[test]
    fn totals_span_two_rows() {
        let log = synthetic_log(&[
            "R:",
            "     0:      5.000      5.000      5.000      5.000      5.000",
            "     5:      5.000      5.000      0.000      0.000      0.000",
            "S:",
            "     0:      5.000      5.000      5.000      5.000      5.000",
            "     5:      5.000      5.000      0.000      0.000      0.000",
        ]);
        let totals = resolve_block_totals(&log, 'A').expect("resolve");
        assert_eq!(totals.len(), 7, "7 nonzero blocks across two count rows");
        assert_eq!(totals.get(6), Some(('G', 10.0)));
    }

    #[test]
    fn totals_missing_marker_is_typed() {
        let log = synthetic_log(&["A: 1.0"]);
        let err = resolve_block_totals(&log, 'A').unwrap_err();
        assert!(matches!(err, LeverlogError::MarkerNotFound { .. }));
    }

    #[test]
    fn totals_bad_first_letter_is_data_load() {
        let err = resolve_block_totals(&two_block_log(), '7').unwrap_err();
        assert!(matches!(err, LeverlogError::DataLoad(_)));
    }

    #[test]
    fn outcomes_length_equals_total() {
        let log = two_block_log();
        let a = extract_block_outcomes(&log, 'A', 10.0).expect("extract A");
        assert_eq!(a.len(), 10);
        let b = extract_block_outcomes(&log, 'B', 15.0).expect("extract B");
        assert_eq!(b.len(), 15);
    }

    #[test]
    fn outcomes_skip_sentinel() {
        let log = two_block_log();
        let a = extract_block_outcomes(&log, 'A', 10.0).expect("extract A");
        // First data value (0.000 sentinel) is dropped; trials start at 1.000
        assert_eq!(a, vec![1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn outcomes_b_block_matches_rows_offset_by_one() {
        let log = two_block_log();
        let b = extract_block_outcomes(&log, 'B', 15.0).expect("extract B");
        assert_eq!(
            b,
            vec![1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn latencies_fixed100_returns_100() {
        let mut lines = vec!["V:".to_string()];
        for row in 0..20 {
            let base = row * 5;
            lines.push(format!(
                "    {base}:    {:.3}    {:.3}    {:.3}    {:.3}    {:.3}",
                base as f64,
                (base + 1) as f64,
                (base + 2) as f64,
                (base + 3) as f64,
                (base + 4) as f64
            ));
        }
        let log = SessionLog::from_lines(lines, PathBuf::from("synthetic"));
        let lats = extract_latencies_fixed100(&log, 'V').expect("latencies");
        assert_eq!(lats.len(), 100);
        assert!((lats[0] - 0.0).abs() < 1e-12);
        assert!((lats[99] - 99.0).abs() < 1e-12);
    }

    #[test]
    fn block2_latency_slice_uses_totals() {
        // R+S → blocks of 40 and 60 trials
        let mut lines = vec![
            "R:".to_string(),
            "     0:     20.000     30.000      0.000      0.000      0.000".to_string(),
            "     5:      0.000      0.000      0.000      0.000      0.000".to_string(),
            "S:".to_string(),
            "     0:     20.000     30.000      0.000      0.000      0.000".to_string(),
            "     5:      0.000      0.000      0.000      0.000      0.000".to_string(),
            "V:".to_string(),
        ];
        for row in 0..20 {
            let base = row * 5;
            lines.push(format!(
                "    {base}: {} {} {} {} {}",
                base,
                base + 1,
                base + 2,
                base + 3,
                base + 4
            ));
        }
        let log = SessionLog::from_lines(lines, PathBuf::from("synthetic"));
        let totals = resolve_block_totals(&log, 'A').expect("totals");
        let b2 = extract_block2_latencies(&log, 'V', &totals).expect("slice");
        assert_eq!(b2.len(), 60, "block-2 slice length equals block-2 total");
        assert!((b2[0] - 40.0).abs() < 1e-12, "slice starts at block-1 total");
        assert!((b2[59] - 99.0).abs() < 1e-12);
    }

    #[test]
    fn block2_latency_needs_two_blocks() {
        let log = synthetic_log(&[
            "R:",
            "     0:     50.000      0.000      0.000      0.000      0.000",
            "     5:      0.000      0.000      0.000      0.000      0.000",
            "S:",
            "     0:     50.000      0.000      0.000      0.000      0.000",
            "     5:      0.000      0.000      0.000      0.000      0.000",
            "V:",
        ]);
        let totals = resolve_block_totals(&log, 'A').expect("totals");
        let err = extract_block2_latencies(&log, 'V', &totals).unwrap_err();
        assert!(matches!(err, LeverlogError::DataLoad(_)));
    }
}
