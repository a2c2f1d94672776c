use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::prompt;
use crate::llm::{AnalysisInput, LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_FALLBACK_MODEL: &str = "gemini-pro";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    fallback_model: String,
    prompt_template: Option<String>,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let fallback_model = std::env::var("GEMINI_FALLBACK_MODEL")
            .unwrap_or_else(|_| DEFAULT_FALLBACK_MODEL.to_string());

        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            fallback_model,
            prompt_template: None,
        })
    }

    /// Template used instead of [`prompt::DEFAULT_TEMPLATE`].
    pub fn with_prompt_template(mut self, template: Option<String>) -> Self {
        self.prompt_template = template;
        self
    }

    async fn generate_content(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let url = format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        serde_json::from_str::<GenerateContentResponse>(&text)
            .with_context(|| format!("failed to decode Gemini response: {text}"))
    }

    fn response_text(res: &GenerateContentResponse) -> String {
        res.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate_analysis(&self, input: &AnalysisInput) -> anyhow::Result<String> {
        let req = GenerateContentRequest::from_prompt(prompt::analysis_prompt(
            self.prompt_template.as_deref(),
            input,
        ));

        let res = match self.generate_content(&self.model, &req).await {
            Ok(res) => res,
            Err(err) => {
                let missing_model = err
                    .downcast_ref::<LlmDiagnosticsError>()
                    .is_some_and(LlmDiagnosticsError::is_model_not_found);
                if !missing_model {
                    return Err(err);
                }
                tracing::warn!(
                    model = %self.model,
                    fallback = %self.fallback_model,
                    "Gemini model not found; retrying with fallback model"
                );
                self.generate_content(&self.fallback_model, &req).await?
            }
        };

        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "empty_response",
                detail: "Gemini returned an empty response".to_string(),
                raw_output: None,
                raw_response_json: serde_json::to_value(&res).ok(),
            }
            .into());
        }

        tracing::info!(region = %input.region, chars = text.len(), "Gemini analysis generated");
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Candidate {
    content: Content,
}
