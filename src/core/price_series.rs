//! Price series and derived log-return data structures.

use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// A single dated price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    /// Observation date.
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Price level. Always positive; non-positive prices are rejected at
    /// construction time since the log transform is undefined for them.
    #[serde(rename = "Price")]
    pub price: f64,
}

impl PricePoint {
    /// Create a price point, rejecting non-positive or non-finite prices.
    pub fn new(date: NaiveDate, price: f64) -> Result<Self> {
        if !price.is_finite() || price <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "price must be positive and finite, got {price}"
            )));
        }
        Ok(Self { date, price })
    }
}

/// An ordered series of dated prices.
///
/// Construction sorts points ascending by date with a stable sort. Duplicate
/// dates are kept in their input order rather than deduplicated; adjacent
/// duplicates simply contribute a zero log return downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from unordered points. Sorts ascending by date.
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series holds no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All observations in date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Date at a given position, if in bounds.
    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.points.get(index).map(|p| p.date)
    }

    /// Prices in date order.
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Keep every `stride`-th observation (indices 0, stride, 2·stride, ...).
    ///
    /// Bounds sampler cost on long series at the expense of resolution.
    /// A stride of 1 returns the series unchanged.
    pub fn thin(&self, stride: usize) -> Result<PriceSeries> {
        if stride == 0 {
            return Err(AnalysisError::InvalidParameter(
                "thinning stride must be at least 1".to_string(),
            ));
        }
        let points = self.points.iter().step_by(stride).copied().collect();
        Ok(Self { points })
    }

    /// Derive the log-return series: `ln(p[i]) - ln(p[i-1])`.
    ///
    /// The first observation has no defined return, so the result is one
    /// shorter than the price series, or empty for series of length <= 1.
    pub fn log_returns(&self) -> LogReturnSeries {
        let returns = self
            .points
            .windows(2)
            .map(|w| w[1].price.ln() - w[0].price.ln())
            .collect();
        LogReturnSeries { returns }
    }
}

/// Immutable series of daily log returns derived from a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogReturnSeries {
    returns: Vec<f64>,
}

impl LogReturnSeries {
    /// Number of return observations.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Whether any returns are present.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Returns as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.returns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(prices: &[(NaiveDate, f64)]) -> PriceSeries {
        PriceSeries::from_points(
            prices
                .iter()
                .map(|&(date, price)| PricePoint::new(date, price).unwrap())
                .collect(),
        )
    }

    #[test]
    fn rejects_non_positive_prices() {
        assert!(PricePoint::new(d(2023, 1, 1), 0.0).is_err());
        assert!(PricePoint::new(d(2023, 1, 1), -4.2).is_err());
        assert!(PricePoint::new(d(2023, 1, 1), f64::NAN).is_err());
        assert!(PricePoint::new(d(2023, 1, 1), 80.5).is_ok());
    }

    #[test]
    fn from_points_sorts_by_date() {
        let s = series(&[(d(2023, 1, 3), 82.0), (d(2023, 1, 1), 80.0), (d(2023, 1, 2), 81.0)]);
        assert_eq!(
            s.dates(),
            vec![d(2023, 1, 1), d(2023, 1, 2), d(2023, 1, 3)]
        );
    }

    #[test]
    fn duplicate_dates_are_kept_in_input_order() {
        let s = series(&[(d(2023, 1, 2), 99.0), (d(2023, 1, 1), 80.0), (d(2023, 1, 2), 81.0)]);
        assert_eq!(s.len(), 3);
        assert_relative_eq!(s.points()[1].price, 99.0);
        assert_relative_eq!(s.points()[2].price, 81.0);
    }

    #[test]
    fn thin_keeps_every_stride_th_row() {
        let points: Vec<_> = (0..11)
            .map(|i| (d(2023, 1, 1 + i as u32), 80.0 + i as f64))
            .collect();
        let s = series(&points);
        let thinned = s.thin(5).unwrap();
        assert_eq!(thinned.len(), 3);
        assert_eq!(
            thinned.dates(),
            vec![d(2023, 1, 1), d(2023, 1, 6), d(2023, 1, 11)]
        );
        assert_eq!(s.thin(1).unwrap(), s);
        assert!(s.thin(0).is_err());
    }

    #[test]
    fn log_returns_are_first_differences_of_log_price() {
        let s = series(&[(d(2023, 1, 1), 100.0), (d(2023, 1, 2), 110.0), (d(2023, 1, 3), 99.0)]);
        let r = s.log_returns();
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r.as_slice()[0], (110.0f64 / 100.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(r.as_slice()[1], (99.0f64 / 110.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn log_returns_empty_for_short_series() {
        assert!(series(&[]).log_returns().is_empty());
        assert!(series(&[(d(2023, 1, 1), 80.0)]).log_returns().is_empty());
    }
}
