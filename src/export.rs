//! Durable CSV export of analysis artifacts.
//!
//! Two files are produced for downstream consumers: the (thinned) price
//! series and the single-row change-point summary. Each write goes to a
//! temporary file in the destination directory and is atomically renamed
//! into place, so a crash mid-write never leaves a partial file. Re-running
//! overwrites prior output.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::core::PriceSeries;
use crate::error::{AnalysisError, Result};
use crate::summary::ChangePointResult;

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write bytes to `path` atomically, creating missing parent directories.
fn persist_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = parent_dir(path);
    fs::create_dir_all(&parent)?;
    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| AnalysisError::Io(e.error))?;
    Ok(())
}

fn csv_bytes<S: serde::Serialize>(rows: impl IntoIterator<Item = S>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Export the price series as a two-column `Date,Price` CSV with ISO dates.
pub fn export_prices(prices: &PriceSeries, path: &Path) -> Result<()> {
    persist_bytes(path, &csv_bytes(prices.points().iter().copied())?)?;
    info!(rows = prices.len(), path = %path.display(), "exported price series");
    Ok(())
}

/// Export the change-point summary as a single-row CSV.
pub fn export_result(result: &ChangePointResult, path: &Path) -> Result<()> {
    persist_bytes(path, &csv_bytes(std::iter::once(result))?)?;
    info!(path = %path.display(), "exported change-point result");
    Ok(())
}

/// Export both artifacts.
pub fn export(
    prices: &PriceSeries,
    result: &ChangePointResult,
    price_path: &Path,
    result_path: &Path,
) -> Result<()> {
    export_prices(prices, price_path)?;
    export_result(result, result_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PricePoint;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn two_point_series() -> PriceSeries {
        PriceSeries::from_points(vec![
            PricePoint::new(d(2023, 1, 1), 80.5).unwrap(),
            PricePoint::new(d(2023, 1, 2), 81.2).unwrap(),
        ])
    }

    fn result() -> ChangePointResult {
        ChangePointResult {
            tau_index: 15,
            change_date: d(2020, 3, 6),
            mean_log_return_before: 0.0012,
            mean_log_return_after: -0.0034,
            percentage_change: -0.4589,
        }
    }

    #[test]
    fn prices_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        export_prices(&two_point_series(), &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Date,Price\n"));
        assert!(contents.contains("2023-01-01,80.5"));
        assert!(contents.contains("2023-01-02,81.2"));

        // Re-read through the preparer and compare.
        let reread = crate::prepare::load_price_csv(&path).unwrap();
        assert_eq!(reread, two_point_series());
    }

    #[test]
    fn result_is_a_single_row_with_iso_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");
        export_result(&result(), &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("tau_index,change_date,mean_log_return_before,mean_log_return_after,percentage_change")
        );
        assert_eq!(lines.next(), Some("15,2020-03-06,0.0012,-0.0034,-0.4589"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let price_path = dir.path().join("out/nested/prices.csv");
        let result_path = dir.path().join("out/nested/result.csv");
        export(&two_point_series(), &result(), &price_path, &result_path).unwrap();
        assert!(price_path.exists());
        assert!(result_path.exists());
    }

    #[test]
    fn rerunning_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        export_prices(&two_point_series(), &path).unwrap();
        export_prices(&two_point_series(), &path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("prices.csv")]);
    }
}
