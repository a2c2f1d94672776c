use crate::llm::AnalysisInput;
use serde_json::Value;

/// Key of the stored template row that overrides [`DEFAULT_TEMPLATE`].
pub const PROMPT_KEY: &str = "gemini_housing_analysis";

/// Built-in template. Placeholders: `{region}`, `{marketMetrics}`, `{economicIndicators}`,
/// `{recentNews}`. The header wording must stay in sync with the patterns in `analysis::text`.
pub const DEFAULT_TEMPLATE: &str = r#"You are an expert real estate investment advisor.
Analyze the following data for the Las Vegas housing market, focusing specifically on the district of {region} where applicable.

Note: "price", "inventory", and "dom" (days on market) represent overall Las Vegas metrics. "zhvi", "zori", "priceCuts", "newListings", "salesCount", and "forecast" specifically represent the district of {region}.

Consolidated Metrics:
{marketMetrics}

Economic Indicators (National/Local):
{economicIndicators}

Recent News & Policy Changes:
{recentNews}

Please provide your analysis in the following format:
1. **Market Sentiment Score**: (0-100, where 100 is extremely bullish/buy now)
2. **Best Timing**: (e.g., Buy now, Wait 6 months, etc.)
3. **Regional Focus ({region}):** (Specific insights about {region} vs the overall Las Vegas market)
4. **Strategic Reasoning**: (Brief explanation of why, considering a 5-6 year hold period and current policy changes)

End your answer with a fenced JSON block containing exactly these keys:
```json
{"market_sentiment_score": <integer 0-100>, "best_timing": "<short text>"}
```"#;

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Fills the placeholders of `template`. The region goes in first so that data values are
/// never rescanned for placeholders.
pub fn render_prompt(template: &str, input: &AnalysisInput) -> String {
    template
        .replace("{region}", &input.region)
        .replace("{marketMetrics}", &pretty(&input.market_metrics))
        .replace("{economicIndicators}", &pretty(&input.economic_indicators))
        .replace("{recentNews}", &pretty(&input.recent_news))
}

/// Prompt asking for the four numbered sections followed by a fenced metadata block. A blank
/// stored template counts as missing.
pub fn analysis_prompt(template: Option<&str>, input: &AnalysisInput) -> String {
    let template = template
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_TEMPLATE);
    render_prompt(template, input)
}
