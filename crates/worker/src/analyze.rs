use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use homewatch_core::analysis::{parse_analysis_response, AnalysisResult};
use homewatch_core::config::Settings;
use homewatch_core::domain::analysis::{AnalysisRecord, ReparsePatch};
use homewatch_core::llm::gemini::GeminiClient;
use homewatch_core::llm::{prompt, AnalysisInput, LlmClient};
use homewatch_core::market::{self, MarketDefaults, MarketSnapshot, MetricName, RegionMetric};
use homewatch_core::series::{deduplicate_by_date, latest_point, select_latest_with_fallback, NamedSeries};
use homewatch_core::storage;
use serde_json::{json, Map, Value};

const LOOKBACK_DAYS: i64 = 365;
const NEWS_LIMIT: i64 = 10;

const REGION_METRICS: [RegionMetric; 6] = [
    RegionMetric::Zhvi,
    RegionMetric::Zori,
    RegionMetric::PriceCuts,
    RegionMetric::NewListings,
    RegionMetric::SalesCount,
    RegionMetric::Forecast,
];

fn latest_value(series: &NamedSeries) -> Option<f64> {
    latest_point(&deduplicate_by_date(&series.points)).map(|p| p.value)
}

/// Prompt metrics: metro headline figures plus the latest value of each district metric.
/// District metrics without data are left out.
pub fn market_metrics_json(snapshot: &MarketSnapshot, region_values: &[(RegionMetric, Option<f64>)]) -> Value {
    let mut out = Map::new();
    out.insert("price".to_string(), json!(snapshot.median_price));
    out.insert("inventory".to_string(), json!(snapshot.inventory));
    out.insert("dom".to_string(), json!(snapshot.days_on_market));
    out.insert("date".to_string(), json!(snapshot.date));

    for (metric, value) in region_values {
        if let Some(v) = value {
            out.insert(metric.field_suffix().to_string(), json!(v));
        }
    }

    Value::Object(out)
}

async fn stored_snapshot(pool: &sqlx::PgPool, today: NaiveDate) -> anyhow::Result<MarketSnapshot> {
    let since = today - Duration::days(LOOKBACK_DAYS);
    let defaults = MarketDefaults::from_env();

    let mut latest = Vec::with_capacity(3);
    for metric in [MetricName::MedianSalePrice, MetricName::Inventory, MetricName::DaysOnMarket] {
        let series = storage::market_metrics::fetch_metric_series(pool, market::METRO, metric, since).await?;
        latest.push(latest_value(&series));
    }

    Ok(MarketSnapshot {
        median_price: select_latest_with_fallback([latest[0]], defaults.median_price),
        inventory: select_latest_with_fallback([latest[1]], defaults.inventory),
        days_on_market: select_latest_with_fallback([latest[2]], defaults.days_on_market),
        date: today,
    })
}

pub async fn build_input(pool: &sqlx::PgPool, region: &str, today: NaiveDate) -> anyhow::Result<AnalysisInput> {
    let snapshot = stored_snapshot(pool, today).await?;

    let since = today - Duration::days(LOOKBACK_DAYS);
    let mut region_values = Vec::with_capacity(REGION_METRICS.len());
    for metric in REGION_METRICS {
        let series = storage::region_metrics::fetch_region_series(pool, metric, region, since, today).await?;
        region_values.push((metric, latest_value(&series)));
    }

    Ok(AnalysisInput {
        region: region.to_string(),
        market_metrics: market_metrics_json(&snapshot, &region_values),
        economic_indicators: storage::indicators::latest_indicators(pool).await?,
        recent_news: storage::indicators::recent_articles(pool, NEWS_LIMIT).await?,
    })
}

pub async fn generate_and_parse(
    llm: &dyn LlmClient,
    input: &AnalysisInput,
) -> anyhow::Result<(String, AnalysisResult)> {
    let raw = llm.generate_analysis(input).await?;
    let parsed = parse_analysis_response(&raw);
    if parsed.is_empty() {
        tracing::warn!(
            provider = llm.provider().as_str(),
            region = %input.region,
            "analysis text had no recognisable sections"
        );
    }
    Ok((raw, parsed))
}

pub async fn run_analyze(settings: &Settings, region: &str, dry_run: bool) -> anyhow::Result<()> {
    let region = market::canonical_region(region)
        .with_context(|| format!("region {region} is not tracked"))?;

    let pool = storage::connect(settings.require_database_url()?).await?;
    let executed_at = Utc::now();
    let input = build_input(&pool, region, executed_at.date_naive()).await?;

    let template = storage::prompts::fetch_prompt_template(&pool, prompt::PROMPT_KEY)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "stored prompt unavailable; using built-in template");
            None
        });
    let llm = GeminiClient::from_settings(settings)?.with_prompt_template(template);
    let (raw, parsed) = generate_and_parse(&llm, &input).await?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    let id = storage::analysis_history::insert_analysis(&pool, region, executed_at, &raw, &parsed).await?;
    tracing::info!(
        id,
        region,
        score = ?parsed.market_sentiment_score,
        timing = ?parsed.best_timing,
        "analysis stored"
    );
    Ok(())
}

/// Patches for records whose stored fields can be filled by parsing their text again.
pub fn plan_reparse(records: &[AnalysisRecord]) -> Vec<(i64, ReparsePatch)> {
    records
        .iter()
        .filter_map(|rec| {
            let parsed = parse_analysis_response(&rec.full_analysis);
            ReparsePatch::from_parsed(rec, &parsed).map(|patch| (rec.id, patch))
        })
        .collect()
}

pub async fn run_reparse(settings: &Settings, id: Option<i64>, dry_run: bool) -> anyhow::Result<()> {
    let pool = storage::connect(settings.require_database_url()?).await?;
    let records = storage::analysis_history::fetch_reparse_candidates(&pool, id).await?;
    let patches = plan_reparse(&records);

    if let Some(id) = id {
        anyhow::ensure!(!records.is_empty(), "analysis {id} not found");
    }

    let mut updated: u64 = 0;
    for (id, patch) in &patches {
        if dry_run {
            tracing::info!(id, score = ?patch.market_sentiment_score, timing = ?patch.best_timing, dry_run = true, "would patch analysis");
            continue;
        }
        updated += storage::analysis_history::apply_patch(&pool, *id, patch).await?;
    }

    tracing::info!(
        candidates = records.len(),
        patchable = patches.len(),
        updated,
        "reparse finished"
    );
    Ok(())
}

pub async fn run_history(settings: &Settings, region: Option<&str>, limit: i64) -> anyhow::Result<()> {
    anyhow::ensure!((1..=500).contains(&limit), "history limit must be 1..=500 (got {limit})");
    let region = region.map(|r| market::canonical_region(r).unwrap_or(r));

    let pool = storage::connect(settings.require_database_url()?).await?;
    let records = storage::analysis_history::list_history(&pool, region, limit).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
