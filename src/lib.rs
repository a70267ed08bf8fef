// SPDX-License-Identifier: AGPL-3.0-only

//! leverlog — behavioral metric extraction from operant-conditioning logs
//!
//! Parses fixed-format lever-press session logs, reconstructs per-block
//! trial and latency sequences across each animal's reversal-learning
//! history, derives decision-strategy features, and writes per-animal
//! feature tables for downstream group classification.
//!
//! ## Modules
//!   - `session` — session file location, header-skipping log parser
//!   - `blocks` — per-block totals and trial/latency reconstruction
//!   - `aggregate` — per-animal phase aggregation (to/on/post reversal)
//!   - `strategy` — accuracy, streaks, stay/shift rates, rolling accuracy
//!   - `regress` — latency→outcome logistic slopes
//!   - `meta` / `table` / `features` / `batch` — metadata in, tables out
//!
//! ## Binaries
//!   - `extract_trials` — per-animal phase-segmented outcome sequences
//!   - `extract_latencies` — per-animal latency sequences and medians
//!   - `strategy_features` — full feature table for group classification

pub mod aggregate;
pub mod batch;
pub mod blocks;
pub mod discovery;
pub mod error;
pub mod features;
pub mod meta;
pub mod regress;
pub mod session;
pub mod strategy;
pub mod table;
