use crate::series::{NamedSeries, RawPoint, ReconciledRow, ReconciledTable, TimeSeriesPoint};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Calendar date of an ISO-8601-like string (`2025-01-01`, `2025-01-01T00:00:00Z`,
/// `2025-01-01 00:00:00+00`). `None` when the leading part is not a date.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split(|c: char| c == 'T' || c == ' ').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// One point per calendar date, ascending.
///
/// Duplicates resolve to the value seen last in input order, so callers must pass points in
/// ingestion order (storage queries are ordered ascending by their original timestamp).
/// Points whose date does not parse are dropped.
pub fn deduplicate_by_date(points: &[RawPoint]) -> Vec<TimeSeriesPoint> {
    let by_date = points
        .iter()
        .fold(BTreeMap::<NaiveDate, f64>::new(), |mut acc, point| {
            match normalize_date(&point.date) {
                Some(date) => {
                    acc.insert(date, point.value);
                }
                None => {
                    tracing::debug!(date = %point.date, "dropping point with unparseable date");
                }
            }
            acc
        });

    by_date
        .into_iter()
        .map(|(date, value)| TimeSeriesPoint { date, value })
        .collect()
}

/// Joins several series into one date-indexed table.
///
/// Each series is deduplicated on its own, then stored under `field(series.name)`. When two
/// series map to the same key, the later series wins on shared dates.
pub fn merge_series_by_date<F>(series: &[NamedSeries], field: F) -> ReconciledTable
where
    F: Fn(&str) -> String,
{
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();

    for s in series {
        let key = field(&s.name);
        for point in deduplicate_by_date(&s.points) {
            by_date
                .entry(point.date)
                .or_default()
                .insert(key.clone(), point.value);
        }
    }

    ReconciledTable {
        rows: by_date
            .into_iter()
            .map(|(date, fields)| ReconciledRow { date, fields })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn normalizes_date_and_datetime_forms() {
        assert_eq!(normalize_date("2025-01-01T00:00:00Z"), Some(d("2025-01-01")));
        assert_eq!(normalize_date("2025-01-01"), Some(d("2025-01-01")));
        assert_eq!(normalize_date("2025-01-01 08:30:00+00"), Some(d("2025-01-01")));
        assert_eq!(normalize_date(" 2025-03-31T23:59:59.999+09:00 "), Some(d("2025-03-31")));
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("not a date"), None);
        assert_eq!(normalize_date("2025-13-01"), None);
    }

    #[test]
    fn dedup_keeps_last_in_input_order_and_sorts() {
        let points = vec![
            RawPoint::new("2025-01-02", 5.0),
            RawPoint::new("2025-01-01", 10.0),
            RawPoint::new("2025-01-01T12:00:00Z", 20.0),
        ];
        let out = deduplicate_by_date(&points);
        assert_eq!(
            out,
            vec![
                TimeSeriesPoint { date: d("2025-01-01"), value: 20.0 },
                TimeSeriesPoint { date: d("2025-01-02"), value: 5.0 },
            ]
        );
    }

    #[test]
    fn dedup_drops_unparseable_rows() {
        let points = vec![RawPoint::new("garbage", 1.0), RawPoint::new("2025-02-01", 2.0)];
        let out = deduplicate_by_date(&points);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, d("2025-02-01"));
    }

    #[test]
    fn dedup_of_empty_is_empty() {
        assert!(deduplicate_by_date(&[]).is_empty());
    }

    #[test]
    fn merge_disjoint_dates_leaves_fields_absent() {
        let series = vec![
            NamedSeries::new("A", vec![RawPoint::new("2025-01-01", 1.0)]),
            NamedSeries::new("B", vec![RawPoint::new("2025-02-01", 2.0)]),
        ];
        let table = merge_series_by_date(&series, |name| name.to_string());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].date, d("2025-01-01"));
        assert_eq!(table.rows[0].fields.len(), 1);
        assert_eq!(table.rows[0].fields.get("A"), Some(&1.0));
        assert_eq!(table.rows[1].fields.len(), 1);
        assert_eq!(table.rows[1].fields.get("B"), Some(&2.0));
    }

    #[test]
    fn merge_joins_shared_dates_with_field_selector() {
        let series = vec![
            NamedSeries::new(
                "Henderson",
                vec![
                    RawPoint::new("2025-01-31T00:00:00Z", 410.0),
                    RawPoint::new("2025-02-28", 415.0),
                ],
            ),
            NamedSeries::new("Summerlin", vec![RawPoint::new("2025-01-31", 530.0)]),
        ];
        let table = merge_series_by_date(&series, |name| format!("{name}_newListings"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].fields.get("Henderson_newListings"), Some(&410.0));
        assert_eq!(table.rows[0].fields.get("Summerlin_newListings"), Some(&530.0));
        assert_eq!(table.rows[1].fields.get("Summerlin_newListings"), None);
    }

    #[test]
    fn merge_output_survives_split_and_remerge() {
        let series = vec![
            NamedSeries::new(
                "Las Vegas",
                vec![
                    RawPoint::new("2025-03-01", 1.0),
                    RawPoint::new("2025-01-01", 2.0),
                    RawPoint::new("2025-01-01", 3.0),
                ],
            ),
            NamedSeries::new("Enterprise", vec![RawPoint::new("2025-02-01T00:00:00Z", 4.0)]),
        ];
        let table = merge_series_by_date(&series, |name| name.to_string());
        let again = merge_series_by_date(&table.split(), |name| name.to_string());
        assert_eq!(again, table);
    }

    #[test]
    fn table_serializes_as_flat_rows() {
        let series = vec![NamedSeries::new("Henderson", vec![RawPoint::new("2025-01-31", 1.5)])];
        let table = merge_series_by_date(&series, |name| name.to_string());
        let v = serde_json::to_value(&table).unwrap();
        assert_eq!(v, serde_json::json!([{"date": "2025-01-31", "Henderson": 1.5}]));
    }
}
