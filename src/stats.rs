//! Statistical utility functions shared across the pipeline.

use std::cmp::Ordering;

/// Arithmetic mean of a slice; NaN on empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator) via Welford's recurrence, which stays
/// accurate when the values share a large common offset. NaN when fewer than
/// two values are given.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mut running_mean = 0.0;
    let mut sum_sq = 0.0;
    for (i, &x) in values.iter().enumerate() {
        let delta = x - running_mean;
        running_mean += delta / (i + 1) as f64;
        sum_sq += delta * (x - running_mean);
    }
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// The one or two central elements of `values` under `cmp`. For an odd count
/// both halves of the pair are the same middle element.
fn central_pair<T: Copy>(values: &[T], cmp: impl FnMut(&T, &T) -> Ordering) -> Option<(T, T)> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(cmp);
    let n = sorted.len();
    if n % 2 == 1 {
        Some((sorted[n / 2], sorted[n / 2]))
    } else {
        Some((sorted[n / 2 - 1], sorted[n / 2]))
    }
}

/// Median of a slice; NaN on empty input.
pub fn median(values: &[f64]) -> f64 {
    let ordered = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal);
    match central_pair(values, ordered) {
        Some((lo, hi)) => (lo + hi) / 2.0,
        None => f64::NAN,
    }
}

/// Integer median with even-count ties rounded toward the lower value.
///
/// For an odd number of values this is the middle element; for an even number
/// the midpoint of the two central values is taken in integer arithmetic, so
/// a midpoint landing on the .5 boundary rounds down exactly. Returns `None`
/// on empty input.
pub fn median_lower(values: &[usize]) -> Option<usize> {
    central_pair(values, Ord::cmp).map(|(lo, hi)| (lo + hi) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variance_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(variance(&values), 32.0 / 7.0, epsilon = 1e-10);
        assert_relative_eq!(std_dev(&values), (32.0f64 / 7.0).sqrt(), epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn variance_survives_a_large_common_offset() {
        let values: Vec<f64> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .map(|x| x + 1.0e9)
            .collect();
        assert_relative_eq!(variance(&values), 32.0 / 7.0, epsilon = 1e-3);
    }

    #[test]
    fn median_odd_and_even() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0, epsilon = 1e-10);
        assert_relative_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5, epsilon = 1e-10);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn median_lower_rounds_ties_down() {
        assert_eq!(median_lower(&[5, 3, 4]), Some(4));
        // Even count, central values 3 and 4: midpoint 3.5 rounds to 3.
        assert_eq!(median_lower(&[3, 4, 5, 2]), Some(3));
        // Even count, central values 3 and 5: midpoint is the integer 4.
        assert_eq!(median_lower(&[3, 5, 1, 7]), Some(4));
        assert_eq!(median_lower(&[]), None);
    }

    #[test]
    fn both_medians_agree_on_the_same_data() {
        let indices = [12usize, 9, 14, 10, 11];
        let floats: Vec<f64> = indices.iter().map(|&i| i as f64).collect();
        assert_eq!(median_lower(&indices), Some(11));
        assert_relative_eq!(median(&floats), 11.0, epsilon = 1e-10);
    }
}
