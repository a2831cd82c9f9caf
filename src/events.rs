//! Catalogue of dated real-world events and change-point association.
//!
//! The catalogue is optional reference data: an absent file degrades to an
//! empty catalogue with a warning rather than failing the pipeline.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AnalysisError, Result};

/// A dated catalogued event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Date the event occurred.
    pub event_date: NaiveDate,
    /// Short event name.
    pub event_name: String,
    /// Free-text description.
    pub description: String,
}

/// A read-only catalogue of events, sorted ascending by date.
///
/// Sorting is stable, so events sharing a date keep their catalogue order;
/// association then breaks date ties by picking the last such event.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    events: Vec<Event>,
}

impl EventCatalog {
    /// Build a catalogue from events in any order.
    pub fn from_events(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.event_date);
        Self { events }
    }

    /// Events in date order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of catalogued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Find the chronologically nearest event at or before `change_date`.
    ///
    /// Returns `None` when no event qualifies; among events sharing the
    /// qualifying date, the last in catalogue order wins.
    pub fn associate(&self, change_date: NaiveDate) -> Option<&Event> {
        self.events
            .iter()
            .rev()
            .find(|e| e.event_date <= change_date)
    }
}

/// Load an event catalogue CSV with columns `event_date`, `event_name`,
/// `description`. Dates are accepted in the same formats as the price CSV.
///
/// An absent file yields an empty catalogue with a warning. A present file
/// with missing columns is a schema error; rows with unparsable dates are
/// dropped with a warning.
pub fn load_event_csv(path: &Path) -> Result<EventCatalog> {
    if !path.exists() {
        warn!(path = %path.display(), "events CSV not found; association disabled");
        return Ok(EventCatalog::default());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
    };
    let date_col = col("event_date")?;
    let name_col = col("event_name")?;
    let desc_col = col("description")?;

    let mut events = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_col).unwrap_or("").trim();
        let Some(event_date) = crate::prepare::parse_date(raw_date) else {
            warn!(row, raw_date, "dropping event with unparsable date");
            continue;
        };
        events.push(Event {
            event_date,
            event_name: record.get(name_col).unwrap_or("").to_string(),
            description: record.get(desc_col).unwrap_or("").to_string(),
        });
    }

    info!(events = events.len(), path = %path.display(), "loaded event catalogue");
    Ok(EventCatalog::from_events(events))
}
