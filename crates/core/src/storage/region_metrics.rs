use crate::market::RegionMetric;
use crate::series::{NamedSeries, RawPoint};
use anyhow::Context;
use chrono::NaiveDate;

const SERIES_LIMIT: i64 = 1000;

/// One region's samples of a Zillow metric between `since` and `until`, ascending.
/// Region names are matched case-insensitively.
pub async fn fetch_region_series(
    pool: &sqlx::PgPool,
    metric: RegionMetric,
    region: &str,
    since: NaiveDate,
    until: NaiveDate,
) -> anyhow::Result<NamedSeries> {
    // Table names come from a closed enum, never from user input.
    let sql = format!(
        "SELECT indicator_date::text, value::float8 \
         FROM {} \
         WHERE region_name ILIKE $1 AND indicator_date >= $2 AND indicator_date <= $3 \
         ORDER BY indicator_date ASC \
         LIMIT $4",
        metric.table()
    );

    let rows = sqlx::query_as::<_, (String, f64)>(&sql)
        .persistent(false)
        .bind(region)
        .bind(since)
        .bind(until)
        .bind(SERIES_LIMIT)
        .fetch_all(pool)
        .await
        .with_context(|| format!("select {} failed for region={region}", metric.table()))?;

    Ok(NamedSeries::new(
        region,
        rows.into_iter()
            .map(|(date, value)| RawPoint::new(date, value))
            .collect(),
    ))
}
