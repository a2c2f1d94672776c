pub mod analysis;
pub mod domain;
pub mod ingest;
pub mod llm;
pub mod market;
pub mod series;
pub mod storage;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub gemini_api_key: Option<String>,
        pub fred_api_key: Option<String>,
        pub news_api_key: Option<String>,
        pub attom_api_key: Option<String>,
        pub rapidapi_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
                fred_api_key: std::env::var("FRED_API_KEY").ok(),
                news_api_key: std::env::var("NEWS_API_KEY").ok(),
                attom_api_key: std::env::var("ATTOM_API_KEY").ok(),
                rapidapi_key: std::env::var("RAPIDAPI_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        pub fn require_fred_api_key(&self) -> anyhow::Result<&str> {
            self.fred_api_key
                .as_deref()
                .context("FRED_API_KEY is required")
        }

        pub fn require_news_api_key(&self) -> anyhow::Result<&str> {
            self.news_api_key
                .as_deref()
                .context("NEWS_API_KEY is required")
        }

        pub fn require_attom_api_key(&self) -> anyhow::Result<&str> {
            self.attom_api_key
                .as_deref()
                .context("ATTOM_API_KEY is required")
        }

        pub fn require_rapidapi_key(&self) -> anyhow::Result<&str> {
            self.rapidapi_key
                .as_deref()
                .context("RAPIDAPI_KEY is required")
        }
    }
}
