// SPDX-License-Identifier: AGPL-3.0-only

//! Batch trial extraction: per-animal phase-segmented outcome sequences.
//!
//! Locates each animal's session logs under the discovered data root,
//! reconstructs reward/omission sequences for the to-reversal, on-reversal,
//! and post-reversal phases, and writes `{yymmdd}_individual_trials.csv`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin extract_trials -- \
//!   --meta=analysed_summary.csv --era=leverpress
//! ```

use leverlog::batch::{parse_cli_str, run_trials_extraction, BatchConfig};
use leverlog::discovery;
use leverlog::session::LogEra;

fn main() {
    println!("═══════════════════════════════════════════════════════════");
    println!("  Leverlog Trial Extraction");
    println!("  Phase-segmented outcome sequences per animal");
    println!("═══════════════════════════════════════════════════════════\n");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let meta_name = parse_cli_str(&args, "--meta", "analysed_summary.csv");
    let era = LogEra::from_arg(&parse_cli_str(&args, "--era", "leverpress"));

    let root = match discovery::try_discover_data_root() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("  ERROR: {e}");
            std::process::exit(1);
        }
    };
    println!("  Data root: {}\n", root.display());

    let meta_csv = root.join(discovery::paths::META_SUMMARY).join(&meta_name);
    let mut config = BatchConfig::from_root(&root, meta_csv);
    config.era = era;

    match run_trials_extraction(&config) {
        Ok(out) => {
            println!("\n  {} animals processed", out.animals.len());
        }
        Err(e) => {
            eprintln!("  ERROR: {e}");
            std::process::exit(1);
        }
    }
}
