pub mod error;
pub mod gemini;
pub mod prompt;

use serde::Serialize;
use serde_json::Value;

/// Everything the narrative model sees for one region.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisInput {
    pub region: String,
    pub market_metrics: Value,
    pub economic_indicators: Value,
    pub recent_news: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Raw narrative text; structure is recovered afterwards by
    /// [`crate::analysis::parse_analysis_response`].
    async fn generate_analysis(&self, input: &AnalysisInput) -> anyhow::Result<String>;
}
