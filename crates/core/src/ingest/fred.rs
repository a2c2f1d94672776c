use crate::config::Settings;
use crate::ingest::provider::ProviderHttp;
use crate::ingest::types::{FredObservation, FredResponse};
use anyhow::{Context, Result};

const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org/fred";
const OBSERVATION_LIMIT: &str = "12";

/// Series pulled on every sync: 30-year mortgage rate, fed funds rate, unemployment rate.
pub const TRACKED_SERIES: [&str; 3] = ["MORTGAGE30US", "FEDFUNDS", "UNRATE"];

#[derive(Debug, Clone)]
pub struct FredClient {
    http: ProviderHttp,
    base_url: String,
    api_key: String,
}

impl FredClient {
    pub fn from_settings(settings: &Settings, http: ProviderHttp) -> Result<Self> {
        let api_key = settings.require_fred_api_key()?.to_string();
        let base_url =
            std::env::var("FRED_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Most recent observations first.
    pub async fn fetch_observations(&self, series_id: &str) -> Result<Vec<FredObservation>> {
        let url = format!("{}/series/observations", self.base_url.trim_end_matches('/'));
        let (status, text) = self
            .http
            .send_text("fred", |http| {
                http.get(&url).query(&[
                    ("series_id", series_id),
                    ("api_key", self.api_key.as_str()),
                    ("file_type", "json"),
                    ("sort_order", "desc"),
                    ("limit", OBSERVATION_LIMIT),
                ])
            })
            .await?;

        if !status.is_success() {
            anyhow::bail!("FRED HTTP {status} for series {series_id}: {text}");
        }

        let parsed = serde_json::from_str::<FredResponse>(&text)
            .with_context(|| format!("failed to parse FRED response for {series_id}"))?;
        Ok(parsed.observations)
    }
}
