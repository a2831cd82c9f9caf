//! Property-based tests for the preparation and association invariants.

use chrono::NaiveDate;
use proptest::prelude::*;
use regimeshift::prelude::*;

fn series_from(prices: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    PriceSeries::from_points(
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start + chrono::Duration::days(i as i64), p).unwrap())
            .collect(),
    )
}

proptest! {
    /// The log-return series is always exactly one shorter than the thinned
    /// price series, or empty when at most one row survives thinning.
    #[test]
    fn return_length_invariant(
        prices in prop::collection::vec(1.0..1000.0f64, 0..60),
        stride in 1usize..8,
    ) {
        let series = series_from(&prices);
        let config = PrepareConfig::default().with_stride(stride);
        let (thinned, returns) = prepare(series, &config).unwrap();

        let expected = prices.len().div_ceil(stride);
        prop_assert_eq!(thinned.len(), expected);
        prop_assert_eq!(returns.len(), expected.saturating_sub(1));
    }

    /// Model construction either fails loudly on short series or yields a
    /// change-index range strictly inside the observation count.
    #[test]
    fn tau_bounds_stay_inside_the_series(prices in prop::collection::vec(1.0..1000.0f64, 2..80)) {
        let returns = series_from(&prices).log_returns();
        let n = returns.len();
        match ChangePointModel::new(&returns, ChangePointPriors::default()) {
            Ok(model) => {
                prop_assert!(model.tau_lower() < model.tau_upper());
                prop_assert!(model.tau_upper() <= (0.8 * n as f64).floor() as usize);
                prop_assert_eq!(model.tau_lower(), (0.2 * n as f64).floor() as usize);
            }
            Err(AnalysisError::DegenerateTauRange { lower, upper, .. }) => {
                prop_assert!(upper <= lower);
            }
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    /// The associated event, when present, is the latest event at or before
    /// the change date.
    #[test]
    fn association_picks_the_latest_qualifying_event(
        offsets in prop::collection::vec(-400i64..400, 0..12),
        change_offset in -100i64..100,
    ) {
        let base = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let change_date = base + chrono::Duration::days(change_offset);
        let events: Vec<Event> = offsets
            .iter()
            .enumerate()
            .map(|(i, &off)| Event {
                event_date: base + chrono::Duration::days(off),
                event_name: format!("event-{i}"),
                description: String::new(),
            })
            .collect();
        let catalog = EventCatalog::from_events(events.clone());

        let expected = events
            .iter()
            .filter(|e| e.event_date <= change_date)
            .map(|e| e.event_date)
            .max();
        prop_assert_eq!(catalog.associate(change_date).map(|e| e.event_date), expected);
    }
}
