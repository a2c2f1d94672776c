use chrono::NaiveDate;
use homewatch_core::config::Settings;
use homewatch_core::market::{self, MetricName, TRACKED_ZIP_CODES};
use homewatch_core::series::{deduplicate_by_date, latest_point, NamedSeries, TimeSeriesPoint};
use homewatch_core::storage;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricHistory {
    pub latest: Option<f64>,
    pub history: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipHistory {
    pub zip: String,
    pub inventory: MetricHistory,
    pub dom: MetricHistory,
}

/// One point per date (last stored revision wins) plus the most recent value.
pub fn metric_history(series: &NamedSeries) -> MetricHistory {
    let history = deduplicate_by_date(&series.points);
    MetricHistory {
        latest: latest_point(&history).map(|p| p.value),
        history,
    }
}

pub fn zip_history(zip: &str, inventory: &NamedSeries, dom: &NamedSeries) -> ZipHistory {
    ZipHistory {
        zip: zip.to_string(),
        inventory: metric_history(inventory),
        dom: metric_history(dom),
    }
}

/// Stored inventory and days-on-market history for one tracked zip code, or all of them.
pub async fn run_zip_history(settings: &Settings, zip: Option<&str>, since: NaiveDate) -> anyhow::Result<()> {
    let zips: Vec<&str> = match zip {
        Some(zip) => {
            anyhow::ensure!(
                market::is_tracked_zip(zip),
                "zip code {zip} is not tracked (supported: {})",
                TRACKED_ZIP_CODES.join(", ")
            );
            vec![zip]
        }
        None => TRACKED_ZIP_CODES.to_vec(),
    };

    let pool = storage::connect(settings.require_database_url()?).await?;

    let mut out = Vec::with_capacity(zips.len());
    for zip in zips {
        let inventory =
            storage::market_metrics::fetch_metric_series(&pool, zip, MetricName::Inventory, since).await?;
        let dom =
            storage::market_metrics::fetch_metric_series(&pool, zip, MetricName::DaysOnMarket, since).await?;

        let h = zip_history(zip, &inventory, &dom);
        tracing::info!(
            zip,
            inventory_points = h.inventory.history.len(),
            dom_points = h.dom.history.len(),
            "zip history loaded"
        );
        out.push(h);
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homewatch_core::series::RawPoint;
    use serde_json::json;

    #[test]
    fn history_is_deduplicated_and_latest_is_last_revision() {
        let inventory = NamedSeries::new(
            "inventory",
            vec![
                RawPoint::new("2025-06-01", 120.0),
                RawPoint::new("2025-06-08T00:00:00Z", 118.0),
                RawPoint::new("2025-06-08", 121.0),
            ],
        );
        let dom = NamedSeries::new("days_on_market", vec![]);

        let h = zip_history("89148", &inventory, &dom);
        assert_eq!(
            serde_json::to_value(&h).unwrap(),
            json!({
                "zip": "89148",
                "inventory": {
                    "latest": 121.0,
                    "history": [
                        {"date": "2025-06-01", "value": 120.0},
                        {"date": "2025-06-08", "value": 121.0}
                    ]
                },
                "dom": {"latest": null, "history": []}
            })
        );
    }

    #[test]
    fn unparseable_dates_are_dropped() {
        let series = NamedSeries::new(
            "days_on_market",
            vec![RawPoint::new("", 40.0), RawPoint::new("2025-07-01", 38.0)],
        );
        let h = metric_history(&series);
        assert_eq!(h.latest, Some(38.0));
        assert_eq!(h.history.len(), 1);
    }
}
