// SPDX-License-Identifier: AGPL-3.0-only

//! Batch latency extraction: per-animal response-latency sequences.
//!
//! Reconstructs both latency channels for the first two to-reversal
//! sessions, the on-reversal session, and the first two post-reversal
//! sessions, and writes `{yymmdd}_extracted_latencies.csv` with per-session
//! medians alongside the raw sequences.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin extract_latencies -- \
//!   --meta=analysed_summary.csv --era=leverpress
//! ```

use leverlog::batch::{parse_cli_str, run_latency_extraction, BatchConfig};
use leverlog::discovery;
use leverlog::session::LogEra;

fn main() {
    println!("═══════════════════════════════════════════════════════════");
    println!("  Leverlog Latency Extraction");
    println!("  Response latencies per animal, both channels");
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

    match run_latency_extraction(&config) {
        Ok(out) => {
            println!("\n  {} animals processed", out.animals.len());
        }
        Err(e) => {
            eprintln!("  ERROR: {e}");
            std::process::exit(1);
        }
    }
}
