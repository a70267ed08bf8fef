// SPDX-License-Identifier: AGPL-3.0-only

//! Per-animal feature assembly.
//!
//! Turns one animal's phase records into the flat, stably-named numeric
//! columns the downstream feature selector consumes: strategy metrics per
//! phase (`{phase}__{metric}`), latency-regression slopes
//! (`coef_{session}`), latency medians (`lats_{session}_med`), and the
//! rolling-accuracy/latency correlations.

use crate::aggregate::{AnimalPhaseRecord, LatencyPhaseRecord};
use crate::error::LeverlogError;
use crate::regress::logistic_slope;
use crate::strategy::{drop_missing, median, pearson, rolling_accuracy, strategy_metrics};

/// Phase column prefixes, in output order.
pub const PHASES: [&str; 3] = ["trials_toR", "trials_onR", "trials_postR"];

/// Strategy metric suffixes, in output order (legacy names).
pub const STRATEGY_METRICS: [&str; 8] = [
    "accuracy", "streak", "P0s", "P0s_perc", "LStay", "Lshift", "Wshift", "Wstay",
];

/// Latency sessions in sequence/median column order.
pub const LATENCY_SESSIONS: [&str; 6] = ["toR1", "toR2", "onR1", "onR2", "postR1", "postR2"];

/// Latency sessions in `coef_` column order (legacy loop order).
pub const COEF_SESSIONS: [&str; 6] = ["toR1", "onR1", "toR2", "onR2", "postR1", "postR2"];

/// Rolling-accuracy window width (trials).
pub const ROLLING_WINDOW: usize = 5;

/// One animal's assembled features plus the raw phase records they came
/// from. The only cross-animal state is the final table collecting these.
#[derive(Debug, Clone)]
pub struct AnimalFeatures {
    /// Animal identifier.
    pub rat_id: String,
    /// Treatment group label (final tables sort on this, descending).
    pub treatment: String,
    /// Phase-segmented outcome sequences.
    pub trials: AnimalPhaseRecord,
    /// Phase-segmented latency sequences.
    pub lats: LatencyPhaseRecord,
    /// `{phase}__{metric}` values, 24 in fixed order.
    pub strategies: Vec<f64>,
    /// `coef_{session}` slopes, 6 in fixed order (NaN when undefined).
    pub coefs: Vec<f64>,
    /// `lats_{session}_med` medians, 6 in fixed order.
    pub medians: Vec<f64>,
    /// Pearson r of rolling accuracy vs. each latency channel (to-reversal).
    pub roll_corr: [f64; 2],
}

/// Latency sequence for a session key, in [`LATENCY_SESSIONS`] naming.
fn session_lats<'a>(lats: &'a LatencyPhaseRecord, session: &str) -> &'a [f64] {
    match session {
        "toR1" => &lats.to_reversal[0],
        "toR2" => &lats.to_reversal[1],
        "onR1" => &lats.on_reversal[0],
        "onR2" => &lats.on_reversal[1],
        "postR1" => &lats.post_reversal[0],
        _ => &lats.post_reversal[1],
    }
}

/// Outcome sequence paired with a session key (channel suffix dropped).
fn session_trials<'a>(trials: &'a AnimalPhaseRecord, session: &str) -> &'a [f64] {
    if session.starts_with("toR") {
        &trials.to_reversal
    } else if session.starts_with("onR") {
        &trials.on_reversal
    } else {
        &trials.post_reversal
    }
}

/// Assemble one animal's feature set.
///
/// Strategy metrics are computed over placeholder-free sequences; an empty
/// or all-zero phase is a hard failure (the batch aborts rather than emit
/// garbage). Regression slopes degrade to NaN when a session has no usable
/// latency/outcome pairs.
///
/// # Errors
///
/// Propagates `EmptySequence`/`NoWinRun` from the strategy computation.
pub fn assemble_features(
    rat_id: &str,
    treatment: &str,
    trials: AnimalPhaseRecord,
    lats: LatencyPhaseRecord,
) -> Result<AnimalFeatures, LeverlogError> {
    let mut strategies = Vec::with_capacity(PHASES.len() * STRATEGY_METRICS.len());
    for phase_seq in [&trials.to_reversal, &trials.on_reversal, &trials.post_reversal] {
        let clean = drop_missing(phase_seq);
        let m = strategy_metrics(&clean)?;
        strategies.extend([
            m.accuracy,
            m.streak as f64,
            m.leading_zero_run as f64,
            m.leading_zero_fraction,
            m.lose_stay,
            m.lose_shift,
            m.win_shift,
            m.win_stay,
        ]);
    }

    let coefs = COEF_SESSIONS
        .iter()
        .map(|session| {
            let x = session_lats(&lats, session);
            let y = session_trials(&trials, session);
            let n = x.len().min(y.len());
            logistic_slope(&x[..n], &y[..n]).unwrap_or(f64::NAN)
        })
        .collect();

    let medians = LATENCY_SESSIONS
        .iter()
        .map(|session| median(session_lats(&lats, session)))
        .collect();

    let roll = rolling_accuracy(&trials.to_reversal, ROLLING_WINDOW);
    let mut roll_corr = [f64::NAN; 2];
    for (ch, corr) in roll_corr.iter_mut().enumerate() {
        let channel = &lats.to_reversal[ch];
        let k = roll
            .len()
            .min(channel.len().saturating_sub(ROLLING_WINDOW - 1));
        *corr = pearson(&roll[..k], &channel[..k]).unwrap_or(f64::NAN);
    }

    Ok(AnimalFeatures {
        rat_id: rat_id.to_string(),
        treatment: treatment.to_string(),
        trials,
        lats,
        strategies,
        coefs,
        medians,
        roll_corr,
    })
}

/// Column names of the strategy block, `{phase}__{metric}` for each phase
/// and metric in output order.
#[must_use]
pub fn strategy_column_names() -> Vec<String> {
    PHASES
        .iter()
        .flat_map(|phase| {
            STRATEGY_METRICS
                .iter()
                .map(move |metric| format!("{phase}__{metric}"))
        })
        .collect()
}
