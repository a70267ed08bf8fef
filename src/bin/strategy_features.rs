// SPDX-License-Identifier: AGPL-3.0-only

//! Full feature extraction: strategy metrics, regression slopes, and
//! latency summaries for group classification.
//!
//! Runs the complete pipeline — trial and latency reconstruction, per-phase
//! strategy metrics, latency→outcome logistic slopes, rolling-accuracy
//! correlations — and writes all four feature tables plus a run-summary
//! JSON under the discovered data root.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin strategy_features -- \
//!   --meta=analysed_summary.csv --era=leverpress
//! ```

use leverlog::batch::{parse_cli_str, run_full, BatchConfig};
use leverlog::discovery;
use leverlog::session::LogEra;

fn main() {
    println!("═══════════════════════════════════════════════════════════");
    println!("  Leverlog Strategy Features");
    println!("  Decision-strategy metrics and regression slopes");
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

    match run_full(&config) {
        Ok(out) => {
            println!(
                "\n  {} animals processed, {} tables written",
                out.animals.len(),
                out.written.len()
            );
        }
        Err(e) => {
            eprintln!("  ERROR: {e}");
            std::process::exit(1);
        }
    }
}
