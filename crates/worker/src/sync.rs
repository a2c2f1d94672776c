use chrono::NaiveDate;
use homewatch_core::config::Settings;
use homewatch_core::ingest::fred::{FredClient, TRACKED_SERIES};
use homewatch_core::ingest::news::{NewsClient, DEFAULT_QUERY};
use homewatch_core::ingest::provider::{HttpMarketData, MarketDataProvider, ProviderHttp};
use homewatch_core::ingest::types::FredObservation;
use homewatch_core::market::{self, MarketDefaults, MarketSnapshot, MetricName};
use homewatch_core::series::normalize_date;
use homewatch_core::storage;

/// Most recent observation that carries a value. Observations arrive newest first.
pub fn latest_valid_observation(observations: &[FredObservation]) -> Option<(NaiveDate, f64)> {
    observations
        .iter()
        .find_map(|o| Some((normalize_date(&o.date)?, o.value_f64()?)))
}

pub async fn consolidated_snapshot(
    provider: &dyn MarketDataProvider,
    location: &str,
    defaults: &MarketDefaults,
    date: NaiveDate,
) -> anyhow::Result<MarketSnapshot> {
    let inputs = provider.fetch_market_inputs(location, market::STATE).await?;
    Ok(market::consolidate_snapshot(
        inputs.attom.as_ref(),
        inputs.redfin.as_ref(),
        defaults,
        date,
    ))
}

/// Weekly refresh of FRED indicators and news, plus today's metro median price.
pub async fn run_sync(settings: &Settings, today: NaiveDate, dry_run: bool) -> anyhow::Result<()> {
    let http = ProviderHttp::from_env()?;
    let fred = FredClient::from_settings(settings, http.clone())?;
    let news = NewsClient::from_settings(settings, http)?;
    let market_data = HttpMarketData::from_settings(settings)?;

    let mut indicators = Vec::with_capacity(TRACKED_SERIES.len());
    for series_id in TRACKED_SERIES {
        match fred.fetch_observations(series_id).await {
            Ok(observations) => match latest_valid_observation(&observations) {
                Some((date, value)) => indicators.push((series_id, date, value)),
                None => tracing::warn!(series_id, "no usable FRED observation"),
            },
            Err(err) => tracing::warn!(series_id, error = %err, "FRED fetch failed; skipping series"),
        }
    }

    let articles = news
        .fetch_housing_news(DEFAULT_QUERY)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "news fetch failed; skipping articles");
            Vec::new()
        });

    let defaults = MarketDefaults::from_env();
    let snapshot = consolidated_snapshot(&market_data, market::METRO, &defaults, today).await?;

    if dry_run {
        tracing::info!(
            dry_run = true,
            indicators_len = indicators.len(),
            articles_len = articles.len(),
            median_price = snapshot.median_price,
            "sync fetched; skipping writes"
        );
        return Ok(());
    }

    let pool = storage::connect(settings.require_database_url()?).await?;

    for (series_id, date, value) in &indicators {
        storage::indicators::upsert_indicator(&pool, series_id, *value, *date).await?;
    }
    for article in &articles {
        storage::indicators::upsert_article(&pool, article).await?;
    }
    storage::market_metrics::upsert_metric(
        &pool,
        market::METRO,
        MetricName::MedianSalePrice,
        snapshot.median_price,
        snapshot.date,
    )
    .await?;

    tracing::info!(
        indicators_len = indicators.len(),
        articles_len = articles.len(),
        median_price = snapshot.median_price,
        "sync completed"
    );
    Ok(())
}

/// Inventory and days on market for one tracked zip code.
pub async fn run_zip(settings: &Settings, zip: &str, today: NaiveDate, dry_run: bool) -> anyhow::Result<()> {
    anyhow::ensure!(market::is_tracked_zip(zip), "zip code {zip} is not tracked");

    let market_data = HttpMarketData::from_settings(settings)?;
    let inputs = market_data.fetch_market_inputs(zip, market::STATE).await?;
    let metrics = market::zip_metrics(inputs.attom.as_ref(), inputs.redfin.as_ref());

    if metrics.is_empty() {
        tracing::warn!(zip, "no provider reported metrics for zip code");
        return Ok(());
    }

    if dry_run {
        for (metric, value) in &metrics {
            tracing::info!(zip, metric = metric.as_str(), value, dry_run = true, "zip metric");
        }
        return Ok(());
    }

    let pool = storage::connect(settings.require_database_url()?).await?;
    for (metric, value) in &metrics {
        storage::market_metrics::upsert_metric(&pool, zip, *metric, *value, today).await?;
    }

    tracing::info!(zip, metrics_len = metrics.len(), "zip metrics stored");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homewatch_core::ingest::provider::MarketInputs;
    use homewatch_core::ingest::types::{AttomTrend, RedfinStats};

    fn obs(date: &str, value: &str) -> FredObservation {
        FredObservation {
            date: date.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn skips_missing_observations() {
        let observations = [obs("2026-01-08", "."), obs("2026-01-01", "6.91"), obs("2025-12-25", "6.85")];
        assert_eq!(
            latest_valid_observation(&observations),
            Some((NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 6.91))
        );
        assert_eq!(latest_valid_observation(&[obs("2026-01-08", ".")]), None);
        assert_eq!(latest_valid_observation(&[]), None);
    }

    struct StubProvider {
        inputs: MarketInputs,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for StubProvider {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_market_inputs(&self, _location: &str, _state: &str) -> anyhow::Result<MarketInputs> {
            Ok(self.inputs.clone())
        }
    }

    #[tokio::test]
    async fn snapshot_from_provider_inputs() {
        let provider = StubProvider {
            inputs: MarketInputs {
                attom: None,
                redfin: Some(RedfinStats {
                    median_sale_price: Some(455_000.0),
                    active_listings: Some(3_100.0),
                    median_days_on_market: None,
                }),
            },
        };
        let date = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        let s = consolidated_snapshot(&provider, market::METRO, &MarketDefaults::default(), date)
            .await
            .unwrap();
        assert_eq!(s.median_price, 455_000.0);
        assert_eq!(s.inventory, 3_100.0);
        assert_eq!(s.days_on_market, 42.0);
    }

    #[tokio::test]
    async fn attom_price_wins_over_redfin() {
        let provider = StubProvider {
            inputs: MarketInputs {
                attom: Some(AttomTrend {
                    median_value: Some(490_000.0),
                    ..Default::default()
                }),
                redfin: Some(RedfinStats {
                    median_sale_price: Some(455_000.0),
                    ..Default::default()
                }),
            },
        };
        let date = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        let s = consolidated_snapshot(&provider, market::METRO, &MarketDefaults::default(), date)
            .await
            .unwrap();
        assert_eq!(s.median_price, 490_000.0);
    }
}
