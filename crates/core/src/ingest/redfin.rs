use crate::config::Settings;
use crate::ingest::provider::ProviderHttp;
use crate::ingest::types::RedfinStats;
use anyhow::{Context, Result};
use serde_json::Value;

const DEFAULT_HOST: &str = "redfin5.p.rapidapi.com";
const STATS_PATH: &str = "/market/get-stats";

/// Redfin market stats through RapidAPI.
#[derive(Debug, Clone)]
pub struct RedfinClient {
    http: ProviderHttp,
    host: String,
    api_key: String,
}

impl RedfinClient {
    pub fn from_settings(settings: &Settings, http: ProviderHttp) -> Result<Self> {
        let api_key = settings.require_rapidapi_key()?.to_string();
        let host = std::env::var("REDFIN_RAPIDAPI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Ok(Self {
            http,
            host,
            api_key,
        })
    }

    pub async fn fetch_market_stats(&self, location: &str) -> Result<Option<RedfinStats>> {
        let url = format!("https://{}{}", self.host, STATS_PATH);
        let (status, text) = self
            .http
            .send_text("redfin", |http| {
                http.get(&url)
                    .header("x-rapidapi-key", &self.api_key)
                    .header("x-rapidapi-host", &self.host)
                    .query(&[("location", location)])
            })
            .await?;

        if !status.is_success() {
            tracing::warn!(location, http_status = %status, "Redfin market stats unavailable");
            return Ok(None);
        }

        parse_stats(&text).map(Some)
    }
}

/// The stats object sits under `data` for most RapidAPI wrappers, at the top level for others.
fn parse_stats(text: &str) -> Result<RedfinStats> {
    let raw = serde_json::from_str::<Value>(text)
        .with_context(|| format!("Redfin response is not valid JSON: {text}"))?;
    let body = match raw {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(data @ Value::Object(_)) => data,
            Some(_) | None => Value::Object(obj),
        },
        other => other,
    };
    serde_json::from_value::<RedfinStats>(body).context("failed to decode Redfin market stats")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_data_envelope() {
        let stats = parse_stats(r#"{"data": {"median_sale_price": 455000}}"#).unwrap();
        assert_eq!(stats.median_sale_price, Some(455_000.0));
    }

    #[test]
    fn accepts_top_level_stats() {
        let stats = parse_stats(r#"{"median_days_on_market": "38"}"#).unwrap();
        assert_eq!(stats.median_days_on_market, Some(38.0));
    }
}
