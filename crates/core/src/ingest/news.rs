use crate::config::Settings;
use crate::ingest::provider::ProviderHttp;
use crate::ingest::types::{NewsArticle, NewsResponse};
use anyhow::{Context, Result};

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_QUERY: &str = "housing policy Las Vegas";
const PAGE_SIZE: &str = "10";

#[derive(Debug, Clone)]
pub struct NewsClient {
    http: ProviderHttp,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    pub fn from_settings(settings: &Settings, http: ProviderHttp) -> Result<Self> {
        let api_key = settings.require_news_api_key()?.to_string();
        let base_url =
            std::env::var("NEWS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub async fn fetch_housing_news(&self, query: &str) -> Result<Vec<NewsArticle>> {
        let url = format!("{}/everything", self.base_url.trim_end_matches('/'));
        let (status, text) = self
            .http
            .send_text("newsapi", |http| {
                http.get(&url).query(&[
                    ("q", query),
                    ("apiKey", self.api_key.as_str()),
                    ("sortBy", "publishedAt"),
                    ("pageSize", PAGE_SIZE),
                ])
            })
            .await?;

        if !status.is_success() {
            anyhow::bail!("NewsAPI HTTP {status}: {text}");
        }

        let parsed =
            serde_json::from_str::<NewsResponse>(&text).context("failed to parse NewsAPI response")?;
        Ok(parsed.articles)
    }
}
