//! # regimeshift
//!
//! Bayesian single change-point detection for daily commodity price series.
//!
//! The pipeline loads a raw price CSV, cleans and thins it, derives log
//! returns, fits a two-regime change-point model by MCMC, summarizes the
//! posterior into point estimates, links the estimated change date to a
//! catalogue of real-world events, and exports the results as CSV for
//! downstream display.
//!
//! ```no_run
//! use regimeshift::prelude::*;
//!
//! let config = AnalysisConfig::new("data/prices.csv", "out")
//!     .with_events_csv("data/events.csv");
//! let report = run_full_analysis(&config)?;
//! println!(
//!     "change detected around {} ({:.2}% shift)",
//!     report.result.change_date, report.result.percentage_change
//! );
//! # Ok::<(), regimeshift::AnalysisError>(())
//! ```
//!
//! Stages are plain functions passing immutable values: a
//! [`core::LogReturnSeries`] only exists once data has been prepared, a
//! [`sampler::PosteriorSamples`] only once sampling has run, so stages
//! cannot be invoked out of order.

pub mod core;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod prepare;
pub mod sampler;
pub mod stats;
pub mod summary;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::core::{LogReturnSeries, PricePoint, PriceSeries};
    pub use crate::diagnostics::{convergence_summary, ParameterSummary};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::events::{load_event_csv, Event, EventCatalog};
    pub use crate::export::export;
    pub use crate::model::{ChangePointModel, ChangePointPriors};
    pub use crate::pipeline::{run_full_analysis, AnalysisConfig, AnalysisReport};
    pub use crate::prepare::{load_and_prepare, load_price_csv, prepare, PrepareConfig};
    pub use crate::sampler::{sample_posterior, PosteriorSamples, SamplerConfig};
    pub use crate::summary::{summarize, ChangePointResult};
}
