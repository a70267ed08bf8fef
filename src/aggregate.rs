// SPDX-License-Identifier: AGPL-3.0-only

//! Per-animal phase aggregation.
//!
//! Walks an animal's ordered session dates and concatenates block sequences
//! into three phase-level sequences: "to-reversal" (every pre-reversal
//! session), "on-reversal" (the single reversal-day session), and
//! "post-reversal" (the post-reversal date window, typically 3 days).
//!
//! To-/on-reversal pull only the block immediately following the first
//! (block index 1). Post-reversal pulls every block in letter order,
//! synthesizing the unscored `O` block as missing-value placeholders.
//! A missing session file skips that date with a warning, never the animal.

use crate::blocks::{
    extract_block2_latencies, extract_block_outcomes, extract_latencies_fixed100,
    resolve_block_totals, BlockTotals, UNSCORED_BLOCK,
};
use crate::error::LeverlogError;
use crate::session::{locate_session_file, LogEra, SessionLog};
use std::path::PathBuf;

/// Latency channels recorded by the apparatus, in output order.
pub const LATENCY_CHANNELS: [char; 2] = ['V', 'W'];

/// Expected session-wide trial count gating the ALL-blocks aggregation.
const SESSION_TRIALS: f64 = 100.0;

/// Where and how session logs are found: directory, filename century
/// prefix, and export era. One per batch run, shared across animals.
#[derive(Debug, Clone)]
pub struct SessionSource {
    /// Directory holding the raw session logs.
    pub dir: PathBuf,
    /// Two-digit century prefix of log filenames (`"20"`).
    pub century_prefix: String,
    /// Export era, selecting the header-skip length.
    pub era: LogEra,
}

impl SessionSource {
    /// Source rooted at `dir` with the current-century prefix and
    /// lever-press era header.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            century_prefix: "20".to_string(),
            era: LogEra::LeverPress,
        }
    }

    /// Locate and load the one session for `animal_id` on `date_token`.
    ///
    /// # Errors
    ///
    /// `FileNotFound` when no file matches (caller skips the date), `Io`
    /// on read failure.
    pub fn open(&self, date_token: &str, animal_id: &str) -> Result<SessionLog, LeverlogError> {
        let path = locate_session_file(&self.dir, &self.century_prefix, date_token, animal_id)?;
        SessionLog::load(&path, self.era)
    }
}

/// One animal's phase-segmented outcome sequences.
#[derive(Debug, Clone, Default)]
pub struct AnimalPhaseRecord {
    /// Block-2 outcomes concatenated across all to-reversal sessions.
    pub to_reversal: Vec<f64>,
    /// Block-2 outcomes of the single reversal-day session.
    pub on_reversal: Vec<f64>,
    /// All-blocks outcomes concatenated across post-reversal sessions
    /// (`O` block synthesized as NaN placeholders).
    pub post_reversal: Vec<f64>,
    /// Blocks traversed per session (to-reversal then post-reversal order):
    /// the per-session "number of reversals" proxy.
    pub blocks_traversed: Vec<usize>,
    /// Per-date skip/mismatch warnings accumulated while aggregating.
    pub warnings: Vec<String>,
}

/// One animal's phase-segmented latency sequences, one pair per channel
/// (`V` then `W`).
#[derive(Debug, Clone, Default)]
pub struct LatencyPhaseRecord {
    /// Block-2 latencies across to-reversal sessions, per channel.
    pub to_reversal: [Vec<f64>; 2],
    /// Block-2 latencies of the reversal-day session, per channel.
    pub on_reversal: [Vec<f64>; 2],
    /// Full fixed-100 latencies across post-reversal sessions, per channel.
    pub post_reversal: [Vec<f64>; 2],
    /// Per-date skip warnings.
    pub warnings: Vec<String>,
}

fn warn(warnings: &mut Vec<String>, msg: String) {
    eprintln!("  WARNING: {msg}");
    warnings.push(msg);
}

/// Extract block-2 (block index 1) outcomes for one session.
fn block2_outcomes(log: &SessionLog, totals: &BlockTotals) -> Result<Vec<f64>, LeverlogError> {
    let (letter, total) = totals.get(1).ok_or_else(|| {
        LeverlogError::DataLoad(format!(
            "no second block resolved in {}",
            log.path().display()
        ))
    })?;
    extract_block_outcomes(log, letter, total)
}

/// All-blocks outcomes for one post-reversal session, in letter order.
///
/// Gated on the session totals summing to exactly the expected 100 trials;
/// a mismatch yields `None` (the session contributes nothing). The unscored
/// `O` block is synthesized as NaN placeholders of its resolved length.
fn all_block_outcomes(
    log: &SessionLog,
    totals: &BlockTotals,
) -> Result<Option<Vec<f64>>, LeverlogError> {
    if totals.sum() != SESSION_TRIALS {
        return Ok(None);
    }
    let mut out = Vec::with_capacity(SESSION_TRIALS as usize);
    for (letter, total) in totals.entries() {
        if *letter == UNSCORED_BLOCK {
            out.extend(std::iter::repeat(f64::NAN).take(*total as usize));
        } else {
            out.extend(extract_block_outcomes(log, *letter, *total)?);
        }
    }
    Ok(Some(out))
}

/// Build one animal's phase-segmented outcome record.
///
/// Per-date failures (missing file, too few blocks) warn and skip that
/// date; marker/parse failures inside a located session abort the animal.
///
/// # Errors
///
/// Returns `MarkerNotFound`/`DataLoad` for malformed located sessions.
pub fn build_phase_record(
    source: &SessionSource,
    animal_id: &str,
    first_block_letter: char,
    to_reversal_dates: &[String],
    on_reversal_date: &str,
    post_reversal_dates: &[String],
) -> Result<AnimalPhaseRecord, LeverlogError> {
    let mut rec = AnimalPhaseRecord::default();

    for date in to_reversal_dates {
        let log = match source.open(date, animal_id) {
            Ok(log) => log,
            Err(LeverlogError::FileNotFound { pattern }) => {
                warn(
                    &mut rec.warnings,
                    format!("{animal_id}: no session file for {date} ({pattern})"),
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        let totals = resolve_block_totals(&log, first_block_letter)?;
        rec.blocks_traversed.push(totals.len());
        match block2_outcomes(&log, &totals) {
            Ok(trials) => rec.to_reversal.extend(trials),
            // blocks_traversed entry stays: the session was still reached
            Err(LeverlogError::DataLoad(msg)) => warn(&mut rec.warnings, msg),
            Err(e) => return Err(e),
        }
    }

    match source.open(on_reversal_date, animal_id) {
        Ok(log) => {
            let totals = resolve_block_totals(&log, first_block_letter)?;
            match block2_outcomes(&log, &totals) {
                Ok(trials) => rec.on_reversal = trials,
                Err(LeverlogError::DataLoad(msg)) => warn(&mut rec.warnings, msg),
                Err(e) => return Err(e),
            }
        }
        Err(LeverlogError::FileNotFound { pattern }) => {
            warn(
                &mut rec.warnings,
                format!("{animal_id}: no reversal-day session for {on_reversal_date} ({pattern})"),
            );
        }
        Err(e) => return Err(e),
    }

    for date in post_reversal_dates {
        let log = match source.open(date, animal_id) {
            Ok(log) => log,
            Err(LeverlogError::FileNotFound { pattern }) => {
                warn(
                    &mut rec.warnings,
                    format!("{animal_id}: no session file for {date} ({pattern})"),
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        let totals = resolve_block_totals(&log, first_block_letter)?;
        rec.blocks_traversed.push(totals.len());
        match all_block_outcomes(&log, &totals)? {
            Some(trials) => rec.post_reversal.extend(trials),
            None => warn(
                &mut rec.warnings,
                format!(
                    "{animal_id}: session {date} totals sum to {} (expected {SESSION_TRIALS}), skipping all-blocks aggregation",
                    totals.sum()
                ),
            ),
        }
    }

    Ok(rec)
}

/// Build one animal's phase-segmented latency record over both channels.
///
/// To-/on-reversal sessions contribute the block-2 slice of the fixed-100
/// layout; post-reversal sessions contribute the full 100 values. Missing
/// files warn and skip the date for all channels.
///
/// # Errors
///
/// Returns `MarkerNotFound`/`DataLoad` for malformed located sessions.
pub fn build_latency_record(
    source: &SessionSource,
    animal_id: &str,
    first_block_letter: char,
    to_reversal_dates: &[String],
    on_reversal_date: &str,
    post_reversal_dates: &[String],
) -> Result<LatencyPhaseRecord, LeverlogError> {
    let mut rec = LatencyPhaseRecord::default();

    for date in to_reversal_dates {
        let log = match source.open(date, animal_id) {
            Ok(log) => log,
            Err(LeverlogError::FileNotFound { pattern }) => {
                warn(
                    &mut rec.warnings,
                    format!("{animal_id}: no session file for {date} ({pattern})"),
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        let totals = resolve_block_totals(&log, first_block_letter)?;
        for (ch, channel) in LATENCY_CHANNELS.iter().enumerate() {
            rec.to_reversal[ch].extend(extract_block2_latencies(&log, *channel, &totals)?);
        }
    }

    match source.open(on_reversal_date, animal_id) {
        Ok(log) => {
            let totals = resolve_block_totals(&log, first_block_letter)?;
            for (ch, channel) in LATENCY_CHANNELS.iter().enumerate() {
                rec.on_reversal[ch] = extract_block2_latencies(&log, *channel, &totals)?;
            }
        }
        Err(LeverlogError::FileNotFound { pattern }) => {
            warn(
                &mut rec.warnings,
                format!("{animal_id}: no reversal-day session for {on_reversal_date} ({pattern})"),
            );
        }
        Err(e) => return Err(e),
    }

    for date in post_reversal_dates {
        let log = match source.open(date, animal_id) {
            Ok(log) => log,
            Err(LeverlogError::FileNotFound { pattern }) => {
                warn(
                    &mut rec.warnings,
                    format!("{animal_id}: no session file for {date} ({pattern})"),
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        for (ch, channel) in LATENCY_CHANNELS.iter().enumerate() {
            rec.post_reversal[ch].extend(extract_latencies_fixed100(&log, *channel)?);
        }
    }

    Ok(rec)
}
