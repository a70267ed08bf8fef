// SPDX-License-Identifier: AGPL-3.0-only

//! Batch extraction across all animals.
//!
//! One animal is fully processed before the next begins; animals are
//! independent, so the batch fans out across a rayon pool and a single
//! writer assembles the final tables, re-sorted by treatment group
//! (descending) then animal id so reruns over unchanged inputs are
//! byte-identical. Any non-recoverable per-animal failure aborts the whole
//! batch before output is written.

use crate::aggregate::{build_latency_record, build_phase_record, SessionSource};
use crate::error::LeverlogError;
use crate::features::{
    assemble_features, strategy_column_names, AnimalFeatures, COEF_SESSIONS, LATENCY_SESSIONS,
};
use crate::meta::{load_metadata, AnimalMeta};
use crate::session::LogEra;
use crate::table::{encode_scalar, encode_sequence, encode_usize_list, write_csv};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Longitudinal reversal-count columns cover this many days post
/// treatment (data beyond is not available for all animals).
const LONGITUDINAL_DAYS: usize = 5;

/// Everything a batch run needs: where the inputs live, how logs are
/// parsed, where outputs go, and the date stamp embedded in filenames.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Per-animal metadata CSV.
    pub meta_csv: PathBuf,
    /// Directory of raw session logs.
    pub session_dir: PathBuf,
    /// Output directory for result tables.
    pub out_dir: PathBuf,
    /// Log export era (header-skip length).
    pub era: LogEra,
    /// `yymmdd` stamp for output filenames.
    pub date_stamp: String,
}

impl BatchConfig {
    /// Config rooted at a discovered data root, stamped with today's date.
    #[must_use]
    pub fn from_root(root: &Path, meta_csv: PathBuf) -> Self {
        Self {
            meta_csv,
            session_dir: root.join(crate::discovery::paths::SESSION_LOGS),
            out_dir: root.join(crate::discovery::paths::RESULTS),
            era: LogEra::LeverPress,
            date_stamp: chrono::Local::now().format("%y%m%d").to_string(),
        }
    }

    fn source(&self) -> SessionSource {
        SessionSource {
            dir: self.session_dir.clone(),
            century_prefix: "20".to_string(),
            era: self.era,
        }
    }

    fn out_path(&self, suffix: &str) -> PathBuf {
        self.out_dir.join(format!("{}_{suffix}", self.date_stamp))
    }
}

/// Result of a full batch run: assembled features in final row order and
/// the table paths written.
#[derive(Debug)]
pub struct BatchOutput {
    /// Per-animal features, sorted Treatment-descending then `Rat_ID`.
    pub animals: Vec<AnimalFeatures>,
    /// Paths of every table written, in write order.
    pub written: Vec<PathBuf>,
}

/// Process one animal end to end: locate and parse every session, build
/// both phase records, and assemble features.
///
/// # Errors
///
/// Propagates marker/parse failures and degenerate-sequence errors; these
/// abort the batch (missing files were already downgraded to warnings).
pub fn process_animal(
    source: &SessionSource,
    meta: &AnimalMeta,
) -> Result<AnimalFeatures, LeverlogError> {
    println!("{}", meta.rat_id);
    let first_letter = meta.first_block_letter()?;
    let to_r = meta.to_reversal_dates();
    let on_r = meta.on_reversal_date().ok_or_else(|| {
        LeverlogError::DataLoad(format!("{}: dates_toR is empty", meta.rat_id))
    })?;
    let post_r = meta.post_reversal_dates();

    let trials = build_phase_record(source, &meta.rat_id, first_letter, &to_r, &on_r, &post_r)?;
    let lats = build_latency_record(source, &meta.rat_id, first_letter, &to_r, &on_r, &post_r)?;
    assemble_features(&meta.rat_id, &meta.treatment, trials, lats)
}

/// Load metadata, process every animal (in parallel), and sort the
/// results into final row order.
///
/// # Errors
///
/// Any per-animal failure aborts the batch; nothing is written.
pub fn collect_animals(config: &BatchConfig) -> Result<Vec<AnimalFeatures>, LeverlogError> {
    let meta = load_metadata(&config.meta_csv)?;
    let source = config.source();

    let mut animals: Vec<AnimalFeatures> = meta
        .par_iter()
        .map(|row| process_animal(&source, row))
        .collect::<Result<_, _>>()?;

    // Single writer: deterministic final ordering regardless of pool timing
    animals.sort_by(|a, b| {
        b.treatment
            .cmp(&a.treatment)
            .then_with(|| a.rat_id.cmp(&b.rat_id))
    });
    Ok(animals)
}

/// Write the per-animal individual-trials table.
///
/// # Errors
///
/// `DataLoad` on write failure.
pub fn write_trials_table(path: &Path, animals: &[AnimalFeatures]) -> Result<(), LeverlogError> {
    let header: Vec<String> = [
        "Rat_ID",
        "Treatment",
        "n_reversals_long",
        "trials_toR",
        "trials_onR",
        "trials_postR",
        "n_trials_toR",
        "n_trials_onR",
        "n_trials_postR",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();

    let rows: Vec<Vec<String>> = animals
        .iter()
        .map(|a| {
            vec![
                a.rat_id.clone(),
                a.treatment.clone(),
                encode_usize_list(&a.trials.blocks_traversed),
                encode_sequence(&a.trials.to_reversal),
                encode_sequence(&a.trials.on_reversal),
                encode_sequence(&a.trials.post_reversal),
                a.trials.to_reversal.len().to_string(),
                a.trials.on_reversal.len().to_string(),
                a.trials.post_reversal.len().to_string(),
            ]
        })
        .collect();

    write_csv(path, &header, &rows)
}

/// Write the per-animal latency table (sequences then medians).
///
/// # Errors
///
/// `DataLoad` on write failure.
pub fn write_latency_table(path: &Path, animals: &[AnimalFeatures]) -> Result<(), LeverlogError> {
    let mut header = vec!["Rat_ID".to_string(), "Treatment".to_string()];
    header.extend(LATENCY_SESSIONS.iter().map(|s| format!("lats_{s}")));
    header.extend(LATENCY_SESSIONS.iter().map(|s| format!("lats_{s}_med")));

    let rows: Vec<Vec<String>> = animals
        .iter()
        .map(|a| {
            let mut row = vec![a.rat_id.clone(), a.treatment.clone()];
            row.push(encode_sequence(&a.lats.to_reversal[0]));
            row.push(encode_sequence(&a.lats.to_reversal[1]));
            row.push(encode_sequence(&a.lats.on_reversal[0]));
            row.push(encode_sequence(&a.lats.on_reversal[1]));
            row.push(encode_sequence(&a.lats.post_reversal[0]));
            row.push(encode_sequence(&a.lats.post_reversal[1]));
            row.extend(a.medians.iter().map(|m| encode_scalar(*m)));
            row
        })
        .collect();

    write_csv(path, &header, &rows)
}

/// Write the combined strategy/regression feature table.
///
/// # Errors
///
/// `DataLoad` on write failure.
pub fn write_strategy_table(path: &Path, animals: &[AnimalFeatures]) -> Result<(), LeverlogError> {
    let mut header = vec![
        "Rat_ID".to_string(),
        "Treatment".to_string(),
        "n_reversals_long".to_string(),
        "n_trials_toR".to_string(),
        "n_trials_onR".to_string(),
    ];
    header.extend(strategy_column_names());
    header.extend(COEF_SESSIONS.iter().map(|s| format!("coef_{s}")));
    header.push("RollAcc_Lat1".to_string());
    header.push("RollAcc_Lat2".to_string());
    header.extend(LATENCY_SESSIONS.iter().map(|s| format!("lats_{s}_med")));

    let rows: Vec<Vec<String>> = animals
        .iter()
        .map(|a| {
            let mut row = vec![
                a.rat_id.clone(),
                a.treatment.clone(),
                encode_usize_list(&a.trials.blocks_traversed),
                a.trials.to_reversal.len().to_string(),
                a.trials.on_reversal.len().to_string(),
            ];
            row.extend(a.strategies.iter().map(|v| encode_scalar(*v)));
            row.extend(a.coefs.iter().map(|v| encode_scalar(*v)));
            row.push(encode_scalar(a.roll_corr[0]));
            row.push(encode_scalar(a.roll_corr[1]));
            row.extend(a.medians.iter().map(|v| encode_scalar(*v)));
            row
        })
        .collect();

    write_csv(path, &header, &rows)
}

/// Write the longitudinal reversal-count table: one column per day post
/// treatment (first `LONGITUDINAL_DAYS` sessions), blank where the animal
/// has no session that day.
///
/// # Errors
///
/// `DataLoad` on write failure.
pub fn write_longitudinal_table(
    path: &Path,
    animals: &[AnimalFeatures],
) -> Result<(), LeverlogError> {
    let mut header = vec!["Rat_ID".to_string(), "Treatment".to_string()];
    header.extend((0..LONGITUDINAL_DAYS).map(|d| format!("{d} days post treatment")));

    let rows: Vec<Vec<String>> = animals
        .iter()
        .map(|a| {
            let mut row = vec![a.rat_id.clone(), a.treatment.clone()];
            for day in 0..LONGITUDINAL_DAYS {
                row.push(
                    a.trials
                        .blocks_traversed
                        .get(day)
                        .map_or_else(String::new, ToString::to_string),
                );
            }
            row
        })
        .collect();

    write_csv(path, &header, &rows)
}

/// Save a run-summary JSON next to the tables: date stamp, animal count,
/// and per-animal warning lists.
///
/// # Errors
///
/// `DataLoad` on serialization or write failure.
pub fn write_run_summary(
    path: &Path,
    config: &BatchConfig,
    animals: &[AnimalFeatures],
) -> Result<(), LeverlogError> {
    let warnings: Vec<serde_json::Value> = animals
        .iter()
        .filter(|a| !a.trials.warnings.is_empty() || !a.lats.warnings.is_empty())
        .map(|a| {
            serde_json::json!({
                "rat_id": a.rat_id,
                "trial_warnings": a.trials.warnings,
                "latency_warnings": a.lats.warnings,
            })
        })
        .collect();

    let summary = serde_json::json!({
        "date": config.date_stamp,
        "meta_csv": config.meta_csv.display().to_string(),
        "n_animals": animals.len(),
        "warnings": warnings,
    });

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| LeverlogError::DataLoad(format!("JSON serialize: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| LeverlogError::DataLoad(format!("write {}: {e}", path.display())))?;
    Ok(())
}

/// Full batch: process all animals and write every output table plus the
/// run summary.
///
/// # Errors
///
/// Aborts (writing nothing) on any non-recoverable failure.
pub fn run_full(config: &BatchConfig) -> Result<BatchOutput, LeverlogError> {
    let animals = collect_animals(config)?;
    std::fs::create_dir_all(&config.out_dir)?;

    type TableWriter = fn(&Path, &[AnimalFeatures]) -> Result<(), LeverlogError>;
    let tables: [(&str, TableWriter); 4] = [
        ("individual_trials.csv", write_trials_table),
        ("extracted_latencies.csv", write_latency_table),
        ("all_strategies.csv", write_strategy_table),
        ("longitudinal_n_reversals.csv", write_longitudinal_table),
    ];

    let mut written = Vec::new();
    for (suffix, writer) in tables {
        let path = config.out_path(suffix);
        writer(&path, &animals)?;
        println!("  Results saved to: {}", path.display());
        written.push(path);
    }

    let summary_path = config.out_path("run_summary.json");
    write_run_summary(&summary_path, config, &animals)?;
    written.push(summary_path);

    Ok(BatchOutput { animals, written })
}

/// Trials-only batch: the individual-trials table alone.
///
/// # Errors
///
/// Same policy as [`run_full`].
pub fn run_trials_extraction(config: &BatchConfig) -> Result<BatchOutput, LeverlogError> {
    let animals = collect_animals(config)?;
    std::fs::create_dir_all(&config.out_dir)?;
    let path = config.out_path("individual_trials.csv");
    write_trials_table(&path, &animals)?;
    println!("  Results saved to: {}", path.display());
    Ok(BatchOutput {
        animals,
        written: vec![path],
    })
}

/// Latencies-only batch: the extracted-latencies table alone.
///
/// # Errors
///
/// Same policy as [`run_full`].
pub fn run_latency_extraction(config: &BatchConfig) -> Result<BatchOutput, LeverlogError> {
    let animals = collect_animals(config)?;
    std::fs::create_dir_all(&config.out_dir)?;
    let path = config.out_path("extracted_latencies.csv");
    write_latency_table(&path, &animals)?;
    println!("  Results saved to: {}", path.display());
    Ok(BatchOutput {
        animals,
        written: vec![path],
    })
}

/// Parse `--key=value` from CLI args as a string, returning `default`
/// when missing.
#[must_use]
pub fn parse_cli_str(args: &[String], key: &str, default: &str) -> String {
    let prefix = format!("{key}=");
    args.iter()
        .find(|a| a.starts_with(&prefix))
        .and_then(|a| a.strip_prefix(&prefix))
        .map_or_else(|| default.to_string(), ToString::to_string)
}
