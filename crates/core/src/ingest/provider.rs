use crate::config::Settings;
use crate::ingest::attom::AttomClient;
use crate::ingest::redfin::RedfinClient;
use crate::ingest::types::{AttomTrend, RedfinStats};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;

/// Shared HTTP plumbing for the market-data providers: one client, bounded retries with
/// exponential backoff on transport errors, 429 and 5xx.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    http: reqwest::Client,
    retries: u32,
}

impl ProviderHttp {
    pub fn from_env() -> Result<Self> {
        let timeout_secs = std::env::var("PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build provider http client")?;

        Ok(Self { http, retries })
    }

    /// Sends the request built by `build` until it succeeds, fails permanently, or retries
    /// run out. Returns the final status with the body text.
    pub async fn send_text<F>(&self, provider: &'static str, build: F) -> Result<(StatusCode, String)>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let backoff = Duration::from_secs(1 << (attempt - 1));

            let res = match build(&self.http).send().await {
                Ok(r) => r,
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err).with_context(|| format!("{provider} request failed"));
                    }
                    tracing::warn!(provider, attempt, ?backoff, error = %err, "provider request failed; retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let status = res.status();
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.retries {
                tracing::warn!(provider, attempt, ?backoff, http_status = %status, "provider HTTP error; retrying");
                tokio::time::sleep(backoff).await;
                continue;
            }

            let text = res
                .text()
                .await
                .with_context(|| format!("failed to read {provider} response"))?;
            return Ok((status, text));
        }
    }
}

/// What the providers currently report for one location. Either side may be missing.
#[derive(Debug, Clone, Default)]
pub struct MarketInputs {
    pub attom: Option<AttomTrend>,
    pub redfin: Option<RedfinStats>,
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// `location` is a city or zip code; `state` is the two-letter state code.
    async fn fetch_market_inputs(&self, location: &str, state: &str) -> Result<MarketInputs>;
}

/// ATTOM and Redfin queried side by side. A failing provider is logged and reported as absent
/// so the other one can still supply values.
#[derive(Debug, Clone)]
pub struct HttpMarketData {
    attom: AttomClient,
    redfin: RedfinClient,
}

impl HttpMarketData {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = ProviderHttp::from_env()?;
        Ok(Self {
            attom: AttomClient::from_settings(settings, http.clone())?,
            redfin: RedfinClient::from_settings(settings, http)?,
        })
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for HttpMarketData {
    fn provider_name(&self) -> &'static str {
        "attom+redfin"
    }

    async fn fetch_market_inputs(&self, location: &str, state: &str) -> Result<MarketInputs> {
        let attom_location = format!("{location}, {state}");
        let (attom, redfin) = tokio::join!(
            self.attom.fetch_market_trend(&attom_location),
            self.redfin.fetch_market_stats(location),
        );

        let attom = attom.unwrap_or_else(|err| {
            tracing::warn!(location, error = %err, "ATTOM fetch failed; treating as no data");
            None
        });
        let redfin = redfin.unwrap_or_else(|err| {
            tracing::warn!(location, error = %err, "Redfin fetch failed; treating as no data");
            None
        });

        tracing::info!(
            location,
            attom = attom.is_some(),
            redfin = redfin.is_some(),
            "market provider responses"
        );

        Ok(MarketInputs { attom, redfin })
    }
}
