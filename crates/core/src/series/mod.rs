pub mod reconcile;
pub mod select;

pub use reconcile::{deduplicate_by_date, merge_series_by_date, normalize_date};
pub use select::{closest_to, latest_point, select_latest_with_fallback};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sample as read from storage or a provider: the date is still a raw string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub date: String,
    pub value: f64,
}

impl RawPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A labelled series (a region or a metric), built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<RawPoint>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, points: Vec<RawPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,
}

/// Date-indexed join of several series, ascending by date, one row per distinct date.
/// A series without a sample on a date leaves its field absent on that row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReconciledTable {
    pub rows: Vec<ReconciledRow>,
}

impl ReconciledTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Every field key present in at least one row, sorted.
    pub fn field_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .rows
            .iter()
            .flat_map(|row| row.fields.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Values of one field in date order, skipping rows where it is absent.
    pub fn column(&self, key: &str) -> Vec<TimeSeriesPoint> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.fields.get(key).map(|&value| TimeSeriesPoint {
                    date: row.date,
                    value,
                })
            })
            .collect()
    }

    /// Splits the table back into one series per field key.
    pub fn split(&self) -> Vec<NamedSeries> {
        self.field_keys()
            .into_iter()
            .map(|key| {
                let points = self
                    .column(&key)
                    .into_iter()
                    .map(|p| RawPoint::new(p.date.format("%Y-%m-%d").to_string(), p.value))
                    .collect();
                NamedSeries::new(key, points)
            })
            .collect()
    }
}
