use crate::analysis::AnalysisResult;
use crate::domain::analysis::{AnalysisRecord, ReparsePatch};
use anyhow::Context;
use chrono::{DateTime, Utc};

type AnalysisRow = (
    i64,
    String,
    DateTime<Utc>,
    String,
    Option<i32>,
    Option<String>,
    Option<String>,
    Option<String>,
);

const SELECT_COLUMNS: &str = "SELECT id, region, execution_date, full_analysis, market_sentiment_score, \
     best_timing, regional_focus, strategic_reasoning \
     FROM gemini_analysis_history";

fn into_record(row: AnalysisRow) -> AnalysisRecord {
    let (
        id,
        region,
        execution_date,
        full_analysis,
        market_sentiment_score,
        best_timing,
        regional_focus,
        strategic_reasoning,
    ) = row;
    AnalysisRecord {
        id,
        region,
        execution_date,
        full_analysis,
        market_sentiment_score,
        best_timing,
        regional_focus,
        strategic_reasoning,
    }
}

pub async fn insert_analysis(
    pool: &sqlx::PgPool,
    region: &str,
    execution_date: DateTime<Utc>,
    full_analysis: &str,
    parsed: &AnalysisResult,
) -> anyhow::Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO gemini_analysis_history \
           (region, execution_date, full_analysis, market_sentiment_score, best_timing, regional_focus, strategic_reasoning) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .persistent(false)
    .bind(region)
    .bind(execution_date)
    .bind(full_analysis)
    .bind(parsed.market_sentiment_score)
    .bind(&parsed.best_timing)
    .bind(&parsed.regional_focus)
    .bind(&parsed.strategic_reasoning)
    .fetch_one(pool)
    .await
    .context("insert gemini_analysis_history failed")?;

    Ok(id)
}

/// Newest first, optionally restricted to one region.
pub async fn list_history(
    pool: &sqlx::PgPool,
    region: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<AnalysisRecord>> {
    let rows = match region {
        Some(region) => {
            sqlx::query_as::<_, AnalysisRow>(&format!(
                "{SELECT_COLUMNS} WHERE region = $1 ORDER BY execution_date DESC LIMIT $2"
            ))
            .persistent(false)
            .bind(region)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, AnalysisRow>(&format!(
                "{SELECT_COLUMNS} ORDER BY execution_date DESC LIMIT $1"
            ))
            .persistent(false)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    }
    .context("select gemini_analysis_history failed")?;

    Ok(rows.into_iter().map(into_record).collect())
}

/// The record with `id`, or every record still missing a score or a timing.
pub async fn fetch_reparse_candidates(
    pool: &sqlx::PgPool,
    id: Option<i64>,
) -> anyhow::Result<Vec<AnalysisRecord>> {
    let rows = match id {
        Some(id) => {
            sqlx::query_as::<_, AnalysisRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
                .persistent(false)
                .bind(id)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as::<_, AnalysisRow>(&format!(
                "{SELECT_COLUMNS} WHERE market_sentiment_score IS NULL OR best_timing IS NULL \
                 ORDER BY id ASC"
            ))
            .persistent(false)
            .fetch_all(pool)
            .await
        }
    }
    .context("select reparse candidates failed")?;

    Ok(rows.into_iter().map(into_record).collect())
}

pub async fn apply_patch(pool: &sqlx::PgPool, id: i64, patch: &ReparsePatch) -> anyhow::Result<u64> {
    let res = sqlx::query(
        "UPDATE gemini_analysis_history \
         SET market_sentiment_score = COALESCE($2, market_sentiment_score), \
             best_timing = COALESCE($3, best_timing) \
         WHERE id = $1",
    )
    .persistent(false)
    .bind(id)
    .bind(patch.market_sentiment_score)
    .bind(&patch.best_timing)
    .execute(pool)
    .await
    .with_context(|| format!("update gemini_analysis_history failed (id={id})"))?;

    Ok(res.rows_affected())
}
