use crate::config::Settings;
use crate::ingest::provider::ProviderHttp;
use crate::ingest::types::{AttomTrend, AttomTrendResponse};
use anyhow::{Context, Result};

const DEFAULT_BASE_URL: &str = "https://api.gateway.attomdata.com";
const TREND_PATH: &str = "/propertyapi/v1.0.0/market/trend";

#[derive(Debug, Clone)]
pub struct AttomClient {
    http: ProviderHttp,
    base_url: String,
    api_key: String,
}

impl AttomClient {
    pub fn from_settings(settings: &Settings, http: ProviderHttp) -> Result<Self> {
        let api_key = settings.require_attom_api_key()?.to_string();
        let base_url =
            std::env::var("ATTOM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Aggregate trend for an address-like location (`"Las Vegas, NV"`, `"89148, NV"`).
    /// A non-success status means "no data" rather than an error.
    pub async fn fetch_market_trend(&self, location: &str) -> Result<Option<AttomTrend>> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), TREND_PATH);
        let (status, text) = self
            .http
            .send_text("attom", |http| {
                http.get(&url)
                    .header("apikey", &self.api_key)
                    .header("Accept", "application/json")
                    .query(&[("address", location)])
            })
            .await?;

        if !status.is_success() {
            tracing::warn!(location, http_status = %status, "ATTOM market trend unavailable");
            return Ok(None);
        }

        parse_trend(&text)
    }
}

fn parse_trend(text: &str) -> Result<Option<AttomTrend>> {
    let parsed = serde_json::from_str::<AttomTrendResponse>(text)
        .with_context(|| format!("failed to parse ATTOM market trend response: {text}"))?;
    Ok(parsed.market_trends.into_iter().next())
}
