// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: full batch pipeline against a synthetic data root.
//!
//! Builds a temporary data layout (metadata CSV plus session logs for two
//! animals), runs the batch end to end, and validates table contents, row
//! ordering, and rerun determinism.

use leverlog::batch::{run_full, run_trials_extraction, BatchConfig};
use leverlog::session::LogEra;
use std::path::{Path, PathBuf};

fn trial(i: usize) -> f64 {
    if i % 3 == 0 {
        1.0
    } else {
        0.0
    }
}

fn block_rows(marker: &str, values: &[f64]) -> String {
    let mut s = format!("{marker}:\n");
    for (row, chunk) in values.chunks(5).enumerate() {
        s.push_str(&format!("{:>6}:", row * 5));
        for v in chunk {
            s.push_str(&format!("{v:>11.3}"));
        }
        s.push('\n');
    }
    s
}

/// One synthetic 100-trial session: A (40) + B (60), channels V and W.
fn session_text() -> String {
    let mut text = String::new();
    for i in 0..25 {
        text.push_str(&format!("header line {i}\n"));
    }
    text.push_str(&block_rows(
        "R",
        &[24.0, 36.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    ));
    text.push_str(&block_rows(
        "S",
        &[16.0, 24.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    ));

    for (letter, total) in [("A", 40), ("B", 60)] {
        let mut vals = vec![9.0];
        vals.extend((0..total).map(trial));
        while vals.len() % 5 != 0 {
            vals.push(0.0);
        }
        text.push_str(&block_rows(letter, &vals));
    }

    for (channel, base) in [("V", 0.3), ("W", 0.5)] {
        let vals: Vec<f64> = (0..100).map(|i| base + f64::from(i) * 0.01).collect();
        text.push_str(&block_rows(channel, &vals));
    }
    text
}

/// Lay out a complete data root: session logs for both animals on all
/// three dates, plus the metadata CSV. Returns the batch config.
fn synthetic_root(name: &str) -> BatchConfig {
    let root = std::env::temp_dir().join(name);
    std::fs::remove_dir_all(&root).ok();
    let session_dir = root.join("sessions");
    let out_dir = root.join("out");
    std::fs::create_dir_all(&session_dir).expect("create session dir");
    std::fs::create_dir_all(&out_dir).expect("create out dir");

    for animal in ["LSDB04", "LSDB05"] {
        for date in ["231201", "231202", "231203"] {
            std::fs::write(
                session_dir.join(format!("20{date}_Subject {animal}.txt")),
                session_text(),
            )
            .expect("write session");
        }
    }

    let meta_csv = root.join("meta.csv");
    let csv_text = "Rat_ID,Treatment,presses_first_block,dates_toR,dates_3DaysPostR\n\
        LSDB05,LSD,A,\"['231201', '231202']\",\"['231203']\"\n\
        LSDB04,Saline,A,\"['231201', '231202']\",\"['231203']\"\n";
    std::fs::write(&meta_csv, csv_text).expect("write meta csv");

    BatchConfig {
        meta_csv,
        session_dir,
        out_dir,
        era: LogEra::LeverPress,
        date_stamp: "231213".to_string(),
    }
}

fn cleanup(config: &BatchConfig) {
    if let Some(root) = config.meta_csv.parent() {
        std::fs::remove_dir_all(root).ok();
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read table")
        .lines()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn full_batch_writes_all_tables() {
    let config = synthetic_root("leverlog_it_batch_full");
    let out = run_full(&config).expect("batch");

    assert_eq!(out.animals.len(), 2);
    assert_eq!(out.written.len(), 5, "four tables plus run summary");
    let expected: Vec<PathBuf> = [
        "231213_individual_trials.csv",
        "231213_extracted_latencies.csv",
        "231213_all_strategies.csv",
        "231213_longitudinal_n_reversals.csv",
        "231213_run_summary.json",
    ]
    .iter()
    .map(|n| config.out_dir.join(n))
    .collect();
    assert_eq!(out.written, expected);
    for path in &out.written {
        assert!(path.is_file(), "missing output {}", path.display());
    }
    cleanup(&config);
}

#[test]
fn rows_sort_treatment_descending_then_id() {
    let config = synthetic_root("leverlog_it_batch_order");
    let out = run_full(&config).expect("batch");

    // "Saline" > "LSD" lexicographically, so the Saline animal leads
    assert_eq!(out.animals[0].rat_id, "LSDB04");
    assert_eq!(out.animals[0].treatment, "Saline");
    assert_eq!(out.animals[1].rat_id, "LSDB05");

    let lines = read_lines(&config.out_dir.join("231213_individual_trials.csv"));
    assert!(lines[1].starts_with("LSDB04,Saline,"));
    assert!(lines[2].starts_with("LSDB05,LSD,"));
    cleanup(&config);
}

#[test]
fn trials_table_counts_match_phase_lengths() {
    let config = synthetic_root("leverlog_it_batch_trials");
    let out = run_trials_extraction(&config).expect("batch");

    // Two to-reversal sessions × 60 block-2 trials, one reversal-day
    // session of 60, one post session of all 100 trials
    let a = &out.animals[0];
    assert_eq!(a.trials.to_reversal.len(), 120);
    assert_eq!(a.trials.on_reversal.len(), 60);
    assert_eq!(a.trials.post_reversal.len(), 100);
    assert_eq!(a.trials.blocks_traversed, vec![2, 2, 2]);

    let lines = read_lines(&out.written[0]);
    let header: Vec<&str> = lines[0].split(',').collect();
    let n_to = header.iter().position(|h| *h == "n_trials_toR").expect("column");
    // sequence cells contain commas, so count from the right instead
    let cells: Vec<&str> = lines[1].rsplit(',').collect();
    assert_eq!(cells[header.len() - 1 - n_to], "120");
    cleanup(&config);
}

#[test]
fn strategy_table_has_stable_columns_and_finite_features() {
    let config = synthetic_root("leverlog_it_batch_strategy");
    let out = run_full(&config).expect("batch");

    let lines = read_lines(&config.out_dir.join("231213_all_strategies.csv"));
    let header = &lines[0];
    for col in [
        "trials_toR__accuracy",
        "trials_onR__P0s_perc",
        "trials_postR__Wstay",
        "coef_toR1",
        "coef_postR2",
        "RollAcc_Lat1",
        "lats_onR2_med",
    ] {
        assert!(header.contains(col), "missing column {col}");
    }

    let a = &out.animals[0];
    assert!(a.strategies.iter().all(|v| v.is_finite()));
    assert!(a.medians.iter().all(|v| v.is_finite()));
    assert!(a.roll_corr[0].is_finite());
    assert!(a.roll_corr[1].is_finite());
    // every session has both outcome classes, so all slopes fit
    assert!(a.coefs.iter().all(|v| v.is_finite()));
    cleanup(&config);
}

#[test]
fn rerun_over_unchanged_inputs_is_byte_identical() {
    let config = synthetic_root("leverlog_it_batch_rerun");

    run_full(&config).expect("first run");
    let first: Vec<Vec<u8>> = [
        "231213_individual_trials.csv",
        "231213_all_strategies.csv",
    ]
    .iter()
    .map(|n| std::fs::read(config.out_dir.join(n)).expect("read"))
    .collect();

    run_full(&config).expect("second run");
    let second: Vec<Vec<u8>> = [
        "231213_individual_trials.csv",
        "231213_all_strategies.csv",
    ]
    .iter()
    .map(|n| std::fs::read(config.out_dir.join(n)).expect("read"))
    .collect();

    assert_eq!(first, second);
    cleanup(&config);
}

#[test]
fn run_summary_records_missing_session_warnings() {
    let config = synthetic_root("leverlog_it_batch_summary");
    // Remove one of LSDB05's two to-reversal sessions to force a warning
    // (the phase keeps its other session, so the batch still succeeds)
    std::fs::remove_file(
        config
            .session_dir
            .join("20231201_Subject LSDB05.txt"),
    )
    .expect("remove session");

    let out = run_full(&config).expect("batch");
    let summary: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(config.out_dir.join("231213_run_summary.json"))
            .expect("read summary"),
    )
    .expect("parse summary");

    assert_eq!(summary["n_animals"], 2);
    assert_eq!(summary["date"], "231213");
    let warnings = summary["warnings"].as_array().expect("warnings array");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["rat_id"], "LSDB05");

    let lsdb05 = &out.animals[1];
    assert_eq!(lsdb05.trials.to_reversal.len(), 60, "one session dropped");
    assert!(!lsdb05.trials.warnings.is_empty());
    assert!(!lsdb05.lats.warnings.is_empty());
    cleanup(&config);
}
