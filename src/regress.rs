// SPDX-License-Identifier: AGPL-3.0-only

//! Latency→outcome logistic association.
//!
//! One slope per animal per session phase: a single-feature logistic
//! regression of trial outcome (0/1) on response latency, trained by plain
//! gradient descent on the normalized feature. Only the slope's sign and
//! relative magnitude feed the feature table, so a small deterministic
//! trainer is sufficient; no external solver.

use crate::error::LeverlogError;

const LEARNING_RATE: f64 = 0.01;
const EPOCHS: usize = 200;

/// Fitted single-feature logistic model.
#[derive(Debug, Clone)]
pub struct LogisticFit {
    /// Slope against the normalized feature.
    pub weight: f64,
    /// Bias term.
    pub bias: f64,
    /// Feature normalization used during training: (mean, std).
    pub norm: (f64, f64),
    /// Pairs the fit was trained on (after NaN filtering).
    pub n_train: usize,
}

impl LogisticFit {
    /// Predicted win probability for a raw (unnormalized) latency.
    #[must_use]
    pub fn predict_prob(&self, latency: f64) -> f64 {
        let x = (latency - self.norm.0) / self.norm.1;
        let z = self.weight * x + self.bias;
        1.0 / (1.0 + (-z).exp())
    }
}

/// Fit outcome ~ latency and return the model.
///
/// Pairs where either value is NaN are dropped first (the unscored block
/// contributes NaN outcomes).
///
/// # Errors
///
/// `EmptySequence` when lengths differ or no NaN-free pairs remain.
pub fn logistic_fit(latencies: &[f64], outcomes: &[f64]) -> Result<LogisticFit, LeverlogError> {
    if latencies.len() != outcomes.len() {
        return Err(LeverlogError::EmptySequence);
    }
    let pairs: Vec<(f64, f64)> = latencies
        .iter()
        .zip(outcomes.iter())
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .collect();
    if pairs.is_empty() {
        return Err(LeverlogError::EmptySequence);
    }

    let n = pairs.len() as f64;
    let mean = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let var = pairs.iter().map(|(x, _)| (x - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt().max(1e-10); // normalization guard

    let mut weight = 0.0;
    let mut bias = 0.0;
    for _epoch in 0..EPOCHS {
        let mut dw = 0.0;
        let mut db = 0.0;
        for &(x, label) in &pairs {
            let x_norm = (x - mean) / std;
            let z = weight * x_norm + bias;
            let p = 1.0 / (1.0 + (-z).exp());
            let err = p - label;
            dw += err * x_norm;
            db += err;
        }
        let scale = LEARNING_RATE / n;
        weight -= scale * dw;
        bias -= scale * db;
    }

    Ok(LogisticFit {
        weight,
        bias,
        norm: (mean, std),
        n_train: pairs.len(),
    })
}

/// The `coef_{session}` feature: the fitted slope only.
///
/// # Errors
///
/// Propagates [`logistic_fit`] failures.
pub fn logistic_slope(latencies: &[f64], outcomes: &[f64]) -> Result<f64, LeverlogError> {
    logistic_fit(latencies, outcomes).map(|fit| fit.weight)
}
