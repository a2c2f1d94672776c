use chrono::{Duration, NaiveDate};
use homewatch_core::config::Settings;
use homewatch_core::market::{RegionMetric, REGIONS};
use homewatch_core::series::{closest_to, deduplicate_by_date, merge_series_by_date, NamedSeries, ReconciledTable};
use homewatch_core::storage;
use serde::Serialize;
use serde_json::json;

const PRICE_CUT_WINDOW_DAYS: i64 = 31;

/// One row per date with a `<Region>_<metric>` field for every region and metric sampled
/// there. Several metrics may share one table.
pub fn region_chart(series: &[(RegionMetric, NamedSeries)]) -> ReconciledTable {
    let labelled: Vec<NamedSeries> = series
        .iter()
        .map(|(metric, s)| NamedSeries::new(metric.field_for(&s.name), s.points.clone()))
        .collect();
    merge_series_by_date(&labelled, |field| field.to_string())
}

/// A region whose query fails is charted as empty instead of failing the whole table.
async fn region_series_or_empty(
    pool: &sqlx::PgPool,
    metric: RegionMetric,
    region: &str,
    since: NaiveDate,
    until: NaiveDate,
) -> NamedSeries {
    match storage::region_metrics::fetch_region_series(pool, metric, region, since, until).await {
        Ok(s) => {
            if s.points.is_empty() {
                tracing::warn!(region, table = metric.table(), "no samples for region");
            }
            s
        }
        Err(err) => {
            tracing::warn!(region, table = metric.table(), error = %format!("{err:#}"), "region query failed; charting it empty");
            NamedSeries::new(region, Vec::new())
        }
    }
}

pub async fn run_chart(
    settings: &Settings,
    metrics: &[RegionMetric],
    since: NaiveDate,
    until: NaiveDate,
) -> anyhow::Result<()> {
    anyhow::ensure!(!metrics.is_empty(), "at least one --metric is required");
    anyhow::ensure!(since <= until, "--since {since} is after {until}");

    let pool = storage::connect(settings.require_database_url()?).await?;

    let mut series = Vec::with_capacity(REGIONS.len() * metrics.len());
    for &metric in metrics {
        for region in REGIONS {
            let s = region_series_or_empty(&pool, metric, region, since, until).await;
            series.push((metric, s));
        }
    }

    let table = region_chart(&series);
    tracing::info!(
        metrics_len = metrics.len(),
        rows = table.len(),
        fields = table.field_keys().len(),
        "chart table built"
    );

    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

/// A region's price-cut share on the sample nearest to the target date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceCutSnapshot {
    pub region: String,
    pub value: Option<f64>,
    pub percentage: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_exact: bool,
}

pub fn price_cut_snapshot(series: &NamedSeries, target: NaiveDate) -> PriceCutSnapshot {
    let points = deduplicate_by_date(&series.points);
    match closest_to(&points, target) {
        Some(p) => PriceCutSnapshot {
            region: series.name.clone(),
            value: Some(p.value),
            percentage: Some(format!("{:.1}%", p.value * 100.0)),
            date: Some(p.date),
            is_exact: p.date == target,
        },
        None => PriceCutSnapshot {
            region: series.name.clone(),
            value: None,
            percentage: None,
            date: None,
            is_exact: false,
        },
    }
}

pub async fn run_price_cuts(settings: &Settings, target: NaiveDate) -> anyhow::Result<()> {
    let pool = storage::connect(settings.require_database_url()?).await?;
    let window = Duration::days(PRICE_CUT_WINDOW_DAYS);

    let mut snapshots = Vec::with_capacity(REGIONS.len());
    for region in REGIONS {
        let s = region_series_or_empty(&pool, RegionMetric::PriceCuts, region, target - window, target + window).await;
        snapshots.push(price_cut_snapshot(&s, target));
    }

    tracing::info!(
        %target,
        exact = snapshots.iter().filter(|s| s.is_exact).count(),
        missing = snapshots.iter().filter(|s| s.value.is_none()).count(),
        "price cut snapshot built"
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({"date": target, "data": snapshots}))?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homewatch_core::series::RawPoint;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn regions_join_on_shared_dates() {
        let series = [
            (
                RegionMetric::Zori,
                NamedSeries::new(
                    "Summerlin",
                    vec![RawPoint::new("2025-10-31", 2_100.0), RawPoint::new("2025-11-30", 2_120.0)],
                ),
            ),
            (
                RegionMetric::Zori,
                NamedSeries::new("Henderson", vec![RawPoint::new("2025-11-30 00:00:00", 1_950.0)]),
            ),
        ];
        let table = region_chart(&series);
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!([
                {"date": "2025-10-31", "Summerlin_zori": 2100.0},
                {"date": "2025-11-30", "Summerlin_zori": 2120.0, "Henderson_zori": 1950.0}
            ])
        );
    }

    #[test]
    fn listings_and_sales_share_one_table() {
        let series = [
            (
                RegionMetric::NewListings,
                NamedSeries::new("Henderson", vec![RawPoint::new("2025-09-30", 410.0)]),
            ),
            (
                RegionMetric::SalesCount,
                NamedSeries::new(
                    "Henderson",
                    vec![RawPoint::new("2025-09-30T00:00:00Z", 350.0), RawPoint::new("2025-10-31", 362.0)],
                ),
            ),
        ];
        let table = region_chart(&series);
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!([
                {"date": "2025-09-30", "Henderson_newListings": 410.0, "Henderson_salesCount": 350.0},
                {"date": "2025-10-31", "Henderson_salesCount": 362.0}
            ])
        );
        assert_eq!(
            table.field_keys(),
            vec!["Henderson_newListings".to_string(), "Henderson_salesCount".to_string()]
        );
    }

    #[test]
    fn empty_region_series_adds_no_fields() {
        let series = [
            (RegionMetric::Zhvi, NamedSeries::new("Enterprise", vec![])),
            (RegionMetric::Zhvi, NamedSeries::new("Summerlin", vec![RawPoint::new("2025-01-31", 1.0)])),
        ];
        let table = region_chart(&series);
        assert_eq!(table.field_keys(), vec!["Summerlin_zhvi".to_string()]);
    }

    #[test]
    fn no_series_gives_empty_table() {
        assert!(region_chart(&[]).is_empty());
    }

    #[test]
    fn price_cut_exact_date() {
        let s = NamedSeries::new(
            "Henderson",
            vec![RawPoint::new("2024-12-21", 0.18), RawPoint::new("2024-12-25T00:00:00Z", 0.2)],
        );
        let snap = price_cut_snapshot(&s, d("2024-12-25"));
        assert_eq!(snap.value, Some(0.2));
        assert_eq!(snap.percentage.as_deref(), Some("20.0%"));
        assert_eq!(snap.date, Some(d("2024-12-25")));
        assert!(snap.is_exact);
    }

    #[test]
    fn price_cut_nearest_date_when_no_exact_match() {
        let s = NamedSeries::new(
            "Summerlin",
            vec![
                RawPoint::new("2024-12-07", 0.1),
                RawPoint::new("2024-12-21", 0.153),
                RawPoint::new("2024-12-29", 0.3),
            ],
        );
        let snap = price_cut_snapshot(&s, d("2024-12-25"));
        assert_eq!(snap.value, Some(0.153));
        assert_eq!(snap.percentage.as_deref(), Some("15.3%"));
        assert_eq!(snap.date, Some(d("2024-12-21")));
        assert!(!snap.is_exact);
    }

    #[test]
    fn price_cut_without_samples() {
        let snap = price_cut_snapshot(&NamedSeries::new("Enterprise", vec![]), d("2024-12-25"));
        assert_eq!(
            snap,
            PriceCutSnapshot {
                region: "Enterprise".to_string(),
                value: None,
                percentage: None,
                date: None,
                is_exact: false,
            }
        );
    }
}
