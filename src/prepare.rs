//! Loading, cleaning, and transforming raw price data.
//!
//! Raw CSVs arrive with a `Date` and a `Price` column in assorted date
//! formats, sometimes out of order and with junk rows. This module validates
//! the schema up front, drops unusable rows with a logged notice, thins the
//! series to bound sampler cost, and derives the log-return series the
//! change-point model consumes.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::core::{LogReturnSeries, PricePoint, PriceSeries};
use crate::error::{AnalysisError, Result};

/// Date formats accepted in input CSVs, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Configuration for data preparation.
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    /// Keep every `stride`-th row of the cleaned series. A stride of 1
    /// disables thinning; larger strides trade statistical power for
    /// sampler speed.
    pub stride: usize,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self { stride: 5 }
    }
}

impl PrepareConfig {
    /// Set the thinning stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }
}

/// Parse a date string against the accepted formats. Shared with the event
/// catalogue loader so both inputs tolerate the same formats.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Load a raw price CSV into a cleaned, date-sorted [`PriceSeries`].
///
/// Fails with [`AnalysisError::NotFound`] before any parsing if the file does
/// not exist, and with [`AnalysisError::MissingColumn`] if the `Date` or
/// `Price` header is absent. Rows whose date or price cannot be parsed, or
/// whose price is non-positive, are dropped with a logged notice.
pub fn load_price_csv(path: &Path) -> Result<PriceSeries> {
    if !path.exists() {
        return Err(AnalysisError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let date_col = headers
        .iter()
        .position(|h| h == "Date")
        .ok_or_else(|| AnalysisError::MissingColumn("Date".to_string()))?;
    let price_col = headers
        .iter()
        .position(|h| h == "Price")
        .ok_or_else(|| AnalysisError::MissingColumn("Price".to_string()))?;

    let mut points = Vec::new();
    let mut dropped = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_col).unwrap_or("");
        let raw_price = record.get(price_col).unwrap_or("");

        let date = match parse_date(raw_date) {
            Some(date) => date,
            None => {
                warn!(row, raw_date, "dropping row with unparsable date");
                dropped += 1;
                continue;
            }
        };
        let price = match raw_price.trim().parse::<f64>() {
            Ok(price) => price,
            Err(_) => {
                warn!(row, raw_price, "dropping row with unparsable price");
                dropped += 1;
                continue;
            }
        };
        match PricePoint::new(date, price) {
            Ok(point) => points.push(point),
            Err(_) => {
                warn!(row, price, "dropping row with non-positive price");
                dropped += 1;
            }
        }
    }

    info!(
        kept = points.len(),
        dropped,
        path = %path.display(),
        "loaded price series"
    );
    Ok(PriceSeries::from_points(points))
}

/// Thin a cleaned series and derive its log returns.
///
/// Returns the thinned price series alongside the log-return series, which is
/// always one element shorter (or empty when the thinned series has at most
/// one row). Never fails on empty input.
pub fn prepare(
    series: PriceSeries,
    config: &PrepareConfig,
) -> Result<(PriceSeries, LogReturnSeries)> {
    let thinned = series.thin(config.stride)?;
    let returns = thinned.log_returns();
    debug!(
        observations = thinned.len(),
        returns = returns.len(),
        stride = config.stride,
        "prepared log-return series"
    );
    Ok((thinned, returns))
}

/// Load, clean, thin, and transform a price CSV in one step.
pub fn load_and_prepare(
    path: &Path,
    config: &PrepareConfig,
) -> Result<(PriceSeries, LogReturnSeries)> {
    prepare(load_price_csv(path)?, config)
}
