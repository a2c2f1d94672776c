use crate::ingest::types::NewsArticle;
use anyhow::Context;
use chrono::NaiveDate;
use serde_json::{json, Value};

pub async fn upsert_indicator(
    pool: &sqlx::PgPool,
    series_id: &str,
    value: f64,
    indicator_date: NaiveDate,
) -> anyhow::Result<u64> {
    let res = sqlx::query(
        "INSERT INTO economic_indicators (series_id, value, indicator_date) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (series_id, indicator_date) DO UPDATE SET value = EXCLUDED.value",
    )
    .persistent(false)
    .bind(series_id)
    .bind(value)
    .bind(indicator_date)
    .execute(pool)
    .await
    .with_context(|| format!("upsert economic_indicators failed ({series_id})"))?;

    Ok(res.rows_affected())
}

/// Latest value per indicator series, shaped for the analysis prompt.
pub async fn latest_indicators(pool: &sqlx::PgPool) -> anyhow::Result<Value> {
    let rows = sqlx::query_as::<_, (String, f64, String)>(
        "SELECT DISTINCT ON (series_id) series_id, value::float8, indicator_date::text \
         FROM economic_indicators \
         ORDER BY series_id, indicator_date DESC",
    )
    .persistent(false)
    .fetch_all(pool)
    .await
    .context("select economic_indicators failed")?;

    Ok(Value::Array(
        rows.into_iter()
            .map(|(series_id, value, date)| json!({"series_id": series_id, "value": value, "date": date}))
            .collect(),
    ))
}

pub async fn upsert_article(pool: &sqlx::PgPool, article: &NewsArticle) -> anyhow::Result<u64> {
    let res = sqlx::query(
        "INSERT INTO housing_news (title, description, url, published_at, source) \
         VALUES ($1, $2, $3, $4::timestamptz, $5) \
         ON CONFLICT (url) DO UPDATE \
           SET title = EXCLUDED.title, description = EXCLUDED.description, source = EXCLUDED.source",
    )
    .persistent(false)
    .bind(&article.title)
    .bind(&article.description)
    .bind(&article.url)
    .bind(&article.published_at)
    .bind(&article.source.name)
    .execute(pool)
    .await
    .with_context(|| format!("upsert housing_news failed ({})", article.url))?;

    Ok(res.rows_affected())
}

pub async fn recent_articles(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<Value> {
    let rows = sqlx::query_as::<_, (String, Option<String>, String)>(
        "SELECT title, description, published_at::text \
         FROM housing_news \
         ORDER BY published_at DESC \
         LIMIT $1",
    )
    .persistent(false)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("select housing_news failed")?;

    Ok(Value::Array(
        rows.into_iter()
            .map(|(title, description, published_at)| {
                json!({"title": title, "description": description, "published_at": published_at})
            })
            .collect(),
    ))
}
