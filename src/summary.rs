//! Reduction of posterior samples to a point-estimate change-point result.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::core::PriceSeries;
use crate::error::{AnalysisError, Result};
use crate::sampler::PosteriorSamples;
use crate::stats;

/// Point estimates derived from the pooled posterior. The durable artifact of
/// an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePointResult {
    /// Posterior median of the change index (ties rounded toward the lower
    /// index), an index into the log-return series.
    pub tau_index: usize,
    /// Calendar date of the change in the (thinned) price series.
    pub change_date: NaiveDate,
    /// Posterior mean of the before-regime daily log return.
    pub mean_log_return_before: f64,
    /// Posterior mean of the after-regime daily log return.
    pub mean_log_return_after: f64,
    /// Shift between regimes expressed on the simple-return scale, percent.
    pub percentage_change: f64,
}

/// Summarize pooled posterior samples against the price series they were
/// derived from.
///
/// The change date sits at `tau_index + 1` in the price series: log return
/// `i` is the move from price `i` to price `i + 1`, so the first observation
/// under the new regime is the price at `tau_index + 1`.
pub fn summarize(samples: &PosteriorSamples, prices: &PriceSeries) -> Result<ChangePointResult> {
    let pooled_tau = samples.pooled_tau();
    let tau_index = stats::median_lower(&pooled_tau).ok_or(AnalysisError::EmptyPosterior)?;

    let change_date = prices
        .date_at(tau_index + 1)
        .ok_or(AnalysisError::IndexOutOfBounds {
            index: tau_index + 1,
            size: prices.len(),
        })?;

    let mean_before = stats::mean(&samples.pooled_mu_before());
    let mean_after = stats::mean(&samples.pooled_mu_after());
    if !mean_before.is_finite() || !mean_after.is_finite() {
        return Err(AnalysisError::NumericDegeneracy(
            "posterior mean of a regime parameter is not finite".to_string(),
        ));
    }

    let percentage_change = percentage_change(mean_before, mean_after)?;

    info!(
        tau_index,
        %change_date,
        mean_before,
        mean_after,
        percentage_change,
        "summarized change-point posterior"
    );

    Ok(ChangePointResult {
        tau_index,
        change_date,
        mean_log_return_before: mean_before,
        mean_log_return_after: mean_after,
        percentage_change,
    })
}

/// Percentage shift between regimes on the simple-return scale:
/// `(e^{after} - e^{before}) / e^{before} * 100`.
///
/// Reported as an error rather than propagating infinity when the
/// before-regime term underflows to zero.
fn percentage_change(mean_before: f64, mean_after: f64) -> Result<f64> {
    let before = mean_before.exp();
    if before == 0.0 {
        return Err(AnalysisError::NumericDegeneracy(
            "exp(mean_log_return_before) underflowed to zero".to_string(),
        ));
    }
    let pct = (mean_after.exp() - before) / before * 100.0;
    if !pct.is_finite() {
        return Err(AnalysisError::NumericDegeneracy(format!(
            "percentage change is not finite (before={mean_before}, after={mean_after})"
        )));
    }
    Ok(pct)
}
