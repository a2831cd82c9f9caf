//! Core data structures for change-point analysis.

mod price_series;

pub use price_series::{LogReturnSeries, PricePoint, PriceSeries};
