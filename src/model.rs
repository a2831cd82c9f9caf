//! Bayesian single change-point model over a log-return series.
//!
//! Generative specification:
//!
//! ```text
//! tau        ~ DiscreteUniform(floor(0.2 N), floor(0.8 N))
//! mu_before  ~ Normal(0, 0.01)
//! mu_after   ~ Normal(0, 0.01)
//! sigma      ~ HalfNormal(0.05)
//! r_i        ~ Normal(i < tau ? mu_before : mu_after, sigma)
//! ```
//!
//! The change index `tau` partitions the returns into a before-segment
//! `[0, tau)` and an after-segment `[tau, N)`. Bounding `tau` to the central
//! 60% of the index range trades generality for sampler stability; it assumes
//! the true change lies away from the series edges.
//!
//! The model precomputes cumulative sums of the returns and squared returns
//! so that each segment's sufficient statistics, and therefore every full
//! conditional the sampler needs, cost O(1) per candidate `tau`.

use crate::core::LogReturnSeries;
use crate::error::{AnalysisError, Result};

/// Prior hyperparameters for the change-point model.
#[derive(Debug, Clone, Copy)]
pub struct ChangePointPriors {
    /// Standard deviation of the zero-centred Normal prior on each regime mean.
    pub mu_sd: f64,
    /// Scale of the HalfNormal prior on the shared volatility.
    pub sigma_sd: f64,
    /// Lower bound of the change index as a fraction of the series length.
    pub tau_lower_frac: f64,
    /// Upper bound of the change index as a fraction of the series length.
    pub tau_upper_frac: f64,
}

impl Default for ChangePointPriors {
    fn default() -> Self {
        Self {
            mu_sd: 0.01,
            sigma_sd: 0.05,
            tau_lower_frac: 0.2,
            tau_upper_frac: 0.8,
        }
    }
}

impl ChangePointPriors {
    /// Set the regime-mean prior standard deviation.
    pub fn with_mu_sd(mut self, mu_sd: f64) -> Self {
        self.mu_sd = mu_sd;
        self
    }

    /// Set the volatility prior scale.
    pub fn with_sigma_sd(mut self, sigma_sd: f64) -> Self {
        self.sigma_sd = sigma_sd;
        self
    }

    /// Set the fractional bounds of the change-index prior.
    pub fn with_tau_bounds(mut self, lower_frac: f64, upper_frac: f64) -> Self {
        self.tau_lower_frac = lower_frac;
        self.tau_upper_frac = upper_frac;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.mu_sd.is_finite() || self.mu_sd <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "mu_sd must be positive, got {}",
                self.mu_sd
            )));
        }
        if !self.sigma_sd.is_finite() || self.sigma_sd <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sigma_sd must be positive, got {}",
                self.sigma_sd
            )));
        }
        if !(0.0..=1.0).contains(&self.tau_lower_frac)
            || !(0.0..=1.0).contains(&self.tau_upper_frac)
            || self.tau_lower_frac >= self.tau_upper_frac
        {
            return Err(AnalysisError::InvalidParameter(format!(
                "tau bounds must satisfy 0 <= lower < upper <= 1, got [{}, {}]",
                self.tau_lower_frac, self.tau_upper_frac
            )));
        }
        Ok(())
    }
}

/// A change-point model bound to an observed log-return series.
#[derive(Debug, Clone)]
pub struct ChangePointModel {
    returns: Vec<f64>,
    priors: ChangePointPriors,
    tau_lower: usize,
    tau_upper: usize,
    cum_sum: Vec<f64>,
    cum_sum_sq: Vec<f64>,
}

impl ChangePointModel {
    /// Bind the model to observed returns.
    ///
    /// Fails with [`AnalysisError::EmptyData`] when no returns are available
    /// (data must be prepared first) and with
    /// [`AnalysisError::DegenerateTauRange`] when the bounded prior collapses
    /// to fewer than two candidate indices on a very short series.
    pub fn new(returns: &LogReturnSeries, priors: ChangePointPriors) -> Result<Self> {
        priors.validate()?;
        if returns.is_empty() {
            return Err(AnalysisError::EmptyData(
                "no log returns; prepare data first".to_string(),
            ));
        }

        let n = returns.len();
        let tau_lower = (priors.tau_lower_frac * n as f64).floor() as usize;
        let tau_upper = (priors.tau_upper_frac * n as f64).floor() as usize;
        if tau_upper <= tau_lower {
            return Err(AnalysisError::DegenerateTauRange {
                lower: tau_lower,
                upper: tau_upper,
                n,
            });
        }

        let returns = returns.as_slice().to_vec();
        let mut cum_sum = Vec::with_capacity(n + 1);
        let mut cum_sum_sq = Vec::with_capacity(n + 1);
        cum_sum.push(0.0);
        cum_sum_sq.push(0.0);
        for &r in &returns {
            cum_sum.push(cum_sum.last().copied().unwrap_or(0.0) + r);
            cum_sum_sq.push(cum_sum_sq.last().copied().unwrap_or(0.0) + r * r);
        }

        Ok(Self {
            returns,
            priors,
            tau_lower,
            tau_upper,
            cum_sum,
            cum_sum_sq,
        })
    }

    /// Number of observed returns.
    pub fn n(&self) -> usize {
        self.returns.len()
    }

    /// Inclusive lower bound of the change-index prior.
    pub fn tau_lower(&self) -> usize {
        self.tau_lower
    }

    /// Inclusive upper bound of the change-index prior.
    pub fn tau_upper(&self) -> usize {
        self.tau_upper
    }

    /// Prior hyperparameters.
    pub fn priors(&self) -> &ChangePointPriors {
        &self.priors
    }

    /// Observed returns.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Observation count and sum for the before-segment `[0, tau)`.
    pub fn before_stats(&self, tau: usize) -> (usize, f64) {
        (tau, self.cum_sum[tau])
    }

    /// Observation count and sum for the after-segment `[tau, N)`.
    pub fn after_stats(&self, tau: usize) -> (usize, f64) {
        let n = self.n();
        (n - tau, self.cum_sum[n] - self.cum_sum[tau])
    }

    /// Sum of squared residuals under a given split and pair of regime means.
    pub fn sse(&self, tau: usize, mu_before: f64, mu_after: f64) -> f64 {
        let n = self.n();
        let before = self.cum_sum_sq[tau] - 2.0 * mu_before * self.cum_sum[tau]
            + tau as f64 * mu_before * mu_before;
        let after = (self.cum_sum_sq[n] - self.cum_sum_sq[tau])
            - 2.0 * mu_after * (self.cum_sum[n] - self.cum_sum[tau])
            + (n - tau) as f64 * mu_after * mu_after;
        before + after
    }

    /// Unnormalized log full-conditional of `tau`, one entry per candidate in
    /// `[tau_lower, tau_upper]`.
    ///
    /// The discrete-uniform prior contributes a constant and is dropped, as
    /// are all terms that do not depend on `tau`.
    pub fn tau_log_weights(&self, mu_before: f64, mu_after: f64, sigma: f64) -> Vec<f64> {
        let inv_two_var = 1.0 / (2.0 * sigma * sigma);
        (self.tau_lower..=self.tau_upper)
            .map(|tau| -self.sse(tau, mu_before, mu_after) * inv_two_var)
            .collect()
    }

    /// Mean and standard deviation of the conjugate Normal full conditional
    /// of a regime mean, given the segment's count and sum.
    pub fn mu_conditional(&self, seg_count: usize, seg_sum: f64, sigma: f64) -> (f64, f64) {
        let prior_prec = 1.0 / (self.priors.mu_sd * self.priors.mu_sd);
        let like_prec = seg_count as f64 / (sigma * sigma);
        let var = 1.0 / (prior_prec + like_prec);
        let mean = var * seg_sum / (sigma * sigma);
        (mean, var.sqrt())
    }

    /// Unnormalized log density of `sigma` given everything else, including
    /// the HalfNormal prior term.
    pub fn sigma_log_density(&self, sigma: f64, tau: usize, mu_before: f64, mu_after: f64) -> f64 {
        if sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let n = self.n() as f64;
        let sse = self.sse(tau, mu_before, mu_after);
        -n * sigma.ln() - sse / (2.0 * sigma * sigma)
            - sigma * sigma / (2.0 * self.priors.sigma_sd * self.priors.sigma_sd)
    }
}
