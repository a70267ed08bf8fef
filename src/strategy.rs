// SPDX-License-Identifier: AGPL-3.0-only

//! Decision-strategy metrics over one binary trial sequence.
//!
//! Input is a non-empty sequence of 0.0/1.0 outcomes; missing-value
//! placeholders must be filtered out by the caller (see
//! [`drop_missing`]). Two quirks of the legacy analysis are preserved
//! deliberately rather than fixed, for parity with existing tables:
//!
//! - the leading-run metric counts the first run regardless of its value,
//!   so a sequence starting with a win reports its first win-run length;
//! - pair windows are taken at every index, so the final window is a
//!   1-element slice matching no ordered pair, while all four transition
//!   rates divide by the full sequence length (not `length - 1`). The four
//!   rates therefore do not sum to 1 in general.

use crate::error::LeverlogError;

/// Fixed-shape record of strategy scalars derived from one trial sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMetrics {
    /// Mean of the sequence.
    pub accuracy: f64,
    /// Length of the longest run of 1.0.
    pub streak: usize,
    /// Length of the first run (the "persistent zeros" count when the
    /// sequence starts with a loss).
    pub leading_zero_run: usize,
    /// `leading_zero_run / length`.
    pub leading_zero_fraction: f64,
    /// Rate of (0, 0) pairs.
    pub lose_stay: f64,
    /// Rate of (0, 1) pairs.
    pub lose_shift: f64,
    /// Rate of (1, 0) pairs.
    pub win_shift: f64,
    /// Rate of (1, 1) pairs.
    pub win_stay: f64,
}

/// Remove missing-value placeholders (NaN) from a sequence, keeping order.
#[must_use]
pub fn drop_missing(trials: &[f64]) -> Vec<f64> {
    trials.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Maximal runs of identical consecutive values, as `(value, length)`.
fn runs(trials: &[f64]) -> Vec<(f64, usize)> {
    let mut out: Vec<(f64, usize)> = Vec::new();
    for &v in trials {
        match out.last_mut() {
            Some((last, count)) if *last == v => *count += 1,
            _ => out.push((v, 1)),
        }
    }
    out
}

/// Compute strategy metrics for one binary trial sequence.
///
/// # Errors
///
/// `EmptySequence` on empty input; `NoWinRun` when the sequence contains
/// no 1.0 (the streak metric is undefined, never silently zero).
pub fn strategy_metrics(trials: &[f64]) -> Result<StrategyMetrics, LeverlogError> {
    if trials.is_empty() {
        return Err(LeverlogError::EmptySequence);
    }
    let len = trials.len() as f64;

    let accuracy = trials.iter().sum::<f64>() / len;

    let groups = runs(trials);
    let streak = groups
        .iter()
        .filter(|(v, _)| *v == 1.0)
        .map(|(_, c)| *c)
        .max()
        .ok_or(LeverlogError::NoWinRun)?;
    let leading_zero_run = groups[0].1;
    let leading_zero_fraction = leading_zero_run as f64 / len;

    // Window at every index; the last window is a 1-element slice that
    // matches no pair, and the divisor stays the full length.
    let mut counts = [0usize; 4];
    for i in 0..trials.len() {
        let window = &trials[i..(i + 2).min(trials.len())];
        if let [a, b] = window {
            let key = match (*a as u8, *b as u8) {
                (0, 0) => 0,
                (0, 1) => 1,
                (1, 0) => 2,
                (1, 1) => 3,
                _ => continue,
            };
            counts[key] += 1;
        }
    }

    Ok(StrategyMetrics {
        accuracy,
        streak,
        leading_zero_run,
        leading_zero_fraction,
        lose_stay: counts[0] as f64 / len,
        lose_shift: counts[1] as f64 / len,
        win_shift: counts[2] as f64 / len,
        win_stay: counts[3] as f64 / len,
    })
}

/// Rolling accuracy over a forward-looking window.
///
/// `out[i]` is the mean of `trials[i..i+window]` clamped at the tail; the
/// last `window - 1` entries are then trimmed because their windows cover
/// fewer trials than requested.
#[must_use]
pub fn rolling_accuracy(trials: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || trials.is_empty() {
        return Vec::new();
    }
    let full: Vec<f64> = (0..trials.len())
        .map(|i| {
            let slice = &trials[i..(i + window).min(trials.len())];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect();
    let keep = full.len().saturating_sub(window - 1);
    full.into_iter().take(keep).collect()
}

/// Sample Pearson correlation coefficient of two equal-length sequences.
///
/// # Errors
///
/// `EmptySequence` when either input is empty or lengths differ.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, LeverlogError> {
    if x.is_empty() || x.len() != y.len() {
        return Err(LeverlogError::EmptySequence);
    }
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    Ok(cov / (vx.sqrt() * vy.sqrt()))
}

/// Median of a sequence, NaN entries excluded. NaN when nothing remains,
/// so empty phases stay visibly missing in the output tables.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    let mut clean = drop_missing(values);
    if clean.is_empty() {
        return f64::NAN;
    }
    clean.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = clean.len() / 2;
    if clean.len() % 2 == 1 {
        clean[mid]
    } else {
        (clean[mid - 1] + clean[mid]) / 2.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn reference_sequence_metrics() {
        // [0, 0, 1, 0, 1, 1, 1]: accuracy 4/7, leading run 2, streak 3
        let m = strategy_metrics(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0]).expect("metrics");
        assert!((m.accuracy - 4.0 / 7.0).abs() < 1e-12);
        assert_eq!(m.leading_zero_run, 2);
        assert!((m.leading_zero_fraction - 2.0 / 7.0).abs() < 1e-12);
        assert_eq!(m.streak, 3);
    }

    #[test]
    fn reference_sequence_pair_rates() {
        // pairs: (0,0) (0,1) (1,0) (0,1) (1,1) (1,1) — final window is short
        let m = strategy_metrics(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0]).expect("metrics");
        assert!((m.lose_stay - 1.0 / 7.0).abs() < 1e-12);
        assert!((m.lose_shift - 2.0 / 7.0).abs() < 1e-12);
        assert!((m.win_shift - 1.0 / 7.0).abs() < 1e-12);
        assert!((m.win_stay - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn pair_rates_do_not_sum_to_one() {
        let m = strategy_metrics(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0]).expect("metrics");
        let total = m.lose_stay + m.lose_shift + m.win_shift + m.win_stay;
        assert!((total - 6.0 / 7.0).abs() < 1e-12, "divisor is length, not pairs");
    }

    #[test]
    fn all_zero_sequence_is_no_win_run() {
        let err = strategy_metrics(&[0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, LeverlogError::NoWinRun));
    }

    #[test]
    fn empty_sequence_is_typed_error() {
        let err = strategy_metrics(&[]).unwrap_err();
        assert!(matches!(err, LeverlogError::EmptySequence));
    }

    #[test]
    fn leading_run_counts_wins_too() {
        // Quirk preserved: sequence starting with wins reports its first
        // win-run length, not zero.
        let m = strategy_metrics(&[1.0, 1.0, 0.0, 1.0]).expect("metrics");
        assert_eq!(m.leading_zero_run, 2);
    }

    #[test]
    fn single_win_trial() {
        let m = strategy_metrics(&[1.0]).expect("metrics");
        assert_eq!(m.streak, 1);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.win_stay, 0.0, "single element forms no pair");
    }

    #[test]
    fn drop_missing_removes_nan_only() {
        let cleaned = drop_missing(&[0.0, f64::NAN, 1.0, f64::NAN]);
        assert_eq!(cleaned, vec![0.0, 1.0]);
    }

    #[test]
    fn rolling_accuracy_trims_tail() {
        let acc = rolling_accuracy(&[1.0, 1.0, 0.0, 0.0, 1.0], 5);
        assert_eq!(acc.len(), 1);
        assert!((acc[0] - 3.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn rolling_accuracy_window_slides() {
        let acc = rolling_accuracy(&[1.0, 0.0, 1.0, 0.0, 1.0, 1.0], 5);
        assert_eq!(acc.len(), 2);
        assert!((acc[0] - 3.0 / 5.0).abs() < 1e-12);
        assert!((acc[1] - 3.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_perfect_positive() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).expect("pearson");
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_perfect_negative() {
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).expect("pearson");
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_length_mismatch_errors() {
        assert!(pearson(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn median_odd_even_and_nan() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(median(&[]).is_nan());
        assert!(median(&[f64::NAN]).is_nan());
    }
}
