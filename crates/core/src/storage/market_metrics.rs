use crate::market::MetricName;
use crate::series::{NamedSeries, RawPoint};
use anyhow::Context;
use chrono::NaiveDate;

const SERIES_LIMIT: i64 = 1000;

pub async fn upsert_metric(
    pool: &sqlx::PgPool,
    location: &str,
    metric: MetricName,
    value: f64,
    metric_date: NaiveDate,
) -> anyhow::Result<u64> {
    let res = sqlx::query(
        "INSERT INTO market_metrics (location, metric_name, value, metric_date) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (location, metric_name, metric_date) DO UPDATE SET value = EXCLUDED.value",
    )
    .persistent(false)
    .bind(location)
    .bind(metric.as_str())
    .bind(value)
    .bind(metric_date)
    .execute(pool)
    .await
    .with_context(|| format!("upsert market_metrics failed ({location}, {})", metric.as_str()))?;

    Ok(res.rows_affected())
}

/// Samples for one location and metric since `since`, in ascending date order so that
/// reconciliation keeps the latest revision of a date.
pub async fn fetch_metric_series(
    pool: &sqlx::PgPool,
    location: &str,
    metric: MetricName,
    since: NaiveDate,
) -> anyhow::Result<NamedSeries> {
    let rows = sqlx::query_as::<_, (String, f64)>(
        "SELECT metric_date::text, value::float8 \
         FROM market_metrics \
         WHERE location = $1 AND metric_name = $2 AND metric_date >= $3 \
         ORDER BY metric_date ASC \
         LIMIT $4",
    )
    .persistent(false)
    .bind(location)
    .bind(metric.as_str())
    .bind(since)
    .bind(SERIES_LIMIT)
    .fetch_all(pool)
    .await
    .with_context(|| format!("select market_metrics failed ({location}, {})", metric.as_str()))?;

    Ok(NamedSeries::new(
        metric.as_str(),
        rows.into_iter()
            .map(|(date, value)| RawPoint::new(date, value))
            .collect(),
    ))
}
