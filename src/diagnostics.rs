//! Convergence diagnostics for pooled posterior samples.
//!
//! Replaces trace plots with the underlying numbers: per-parameter location
//! and spread plus the split-R̂ statistic comparing within- and between-chain
//! variance. Values of R̂ near 1 indicate the chains are sampling the same
//! distribution; values above ~1.05 suggest more tuning or draws are needed.

use serde::Serialize;

use crate::sampler::PosteriorSamples;
use crate::stats;

/// Summary statistics and convergence diagnostic for one model parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSummary {
    /// Parameter name.
    pub name: String,
    /// Pooled posterior mean.
    pub mean: f64,
    /// Pooled posterior standard deviation.
    pub sd: f64,
    /// Pooled posterior median.
    pub median: f64,
    /// Split-R̂ across chains; NaN when undefined (too few draws).
    pub rhat: f64,
}

/// Compute split-R̂ from per-chain draws.
///
/// Each chain is split in half (an odd trailing draw is dropped) and the
/// halves treated as separate chains. Returns NaN when any half has fewer
/// than two draws; returns 1.0 when the within-chain variance is zero (all
/// chains constant and equal cannot be distinguished from convergence).
pub fn split_rhat(chains: &[Vec<f64>]) -> f64 {
    let half_len = chains.iter().map(|c| c.len() / 2).min().unwrap_or(0);
    if half_len < 2 {
        return f64::NAN;
    }

    let halves: Vec<&[f64]> = chains
        .iter()
        .flat_map(|c| [&c[..half_len], &c[half_len..2 * half_len]])
        .collect();

    let m = halves.len() as f64;
    let n = half_len as f64;

    let half_means: Vec<f64> = halves.iter().map(|h| stats::mean(h)).collect();
    let within = halves.iter().map(|h| stats::variance(h)).sum::<f64>() / m;
    let between = n * stats::variance(&half_means);

    if within == 0.0 {
        return if between == 0.0 { 1.0 } else { f64::INFINITY };
    }

    let var_plus = (n - 1.0) / n * within + between / n;
    (var_plus / within).sqrt()
}

fn summarize_parameter(name: &str, chains: Vec<Vec<f64>>) -> ParameterSummary {
    let pooled: Vec<f64> = chains.iter().flatten().copied().collect();
    ParameterSummary {
        name: name.to_string(),
        mean: stats::mean(&pooled),
        sd: stats::std_dev(&pooled),
        median: stats::median(&pooled),
        rhat: split_rhat(&chains),
    }
}

/// Per-parameter posterior summary with split-R̂, in model parameter order.
pub fn convergence_summary(samples: &PosteriorSamples) -> Vec<ParameterSummary> {
    let tau: Vec<Vec<f64>> = samples
        .chains()
        .iter()
        .map(|c| c.tau.iter().map(|&t| t as f64).collect())
        .collect();
    let mu_before: Vec<Vec<f64>> = samples.chains().iter().map(|c| c.mu_before.clone()).collect();
    let mu_after: Vec<Vec<f64>> = samples.chains().iter().map(|c| c.mu_after.clone()).collect();
    let sigma: Vec<Vec<f64>> = samples.chains().iter().map(|c| c.sigma.clone()).collect();

    vec![
        summarize_parameter("tau", tau),
        summarize_parameter("mu_before", mu_before),
        summarize_parameter("mu_after", mu_after),
        summarize_parameter("sigma", sigma),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::ChainDraws;
    use approx::assert_relative_eq;

    #[test]
    fn rhat_near_one_for_identically_distributed_chains() {
        // Same oscillating pattern in both chains.
        let chain: Vec<f64> = (0..200).map(|i| ((i * 31 % 17) as f64) / 17.0).collect();
        let rhat = split_rhat(&[chain.clone(), chain]);
        assert!((rhat - 1.0).abs() < 0.05, "rhat = {rhat}");
    }

    #[test]
    fn rhat_large_for_disagreeing_chains() {
        let a: Vec<f64> = (0..100).map(|i| (i % 7) as f64 * 0.01).collect();
        let b: Vec<f64> = a.iter().map(|x| x + 10.0).collect();
        let rhat = split_rhat(&[a, b]);
        assert!(rhat > 1.5, "rhat = {rhat}");
    }

    #[test]
    fn rhat_undefined_for_too_few_draws() {
        assert!(split_rhat(&[vec![1.0, 2.0]]).is_nan());
        assert!(split_rhat(&[]).is_nan());
    }

    #[test]
    fn rhat_is_one_for_constant_equal_chains() {
        let rhat = split_rhat(&[vec![2.0; 50], vec![2.0; 50]]);
        assert_relative_eq!(rhat, 1.0);
    }

    #[test]
    fn summary_covers_all_four_parameters() {
        let chain = ChainDraws {
            tau: vec![5, 6, 7, 6],
            mu_before: vec![0.01, 0.012, 0.009, 0.011],
            mu_after: vec![-0.01, -0.012, -0.009, -0.011],
            sigma: vec![0.05, 0.04, 0.06, 0.05],
        };
        let samples = PosteriorSamples::from_chains(vec![chain.clone(), chain], 20, 4, 16);
        let summary = convergence_summary(&samples);
        let names: Vec<&str> = summary.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["tau", "mu_before", "mu_after", "sigma"]);
        assert_relative_eq!(summary[0].mean, 6.0, epsilon = 1e-12);
        assert_relative_eq!(summary[1].median, 0.0105, epsilon = 1e-12);
    }
}
