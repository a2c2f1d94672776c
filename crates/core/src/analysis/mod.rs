pub mod json;
pub mod text;

use serde::{Deserialize, Serialize};

/// Structured fields recovered from a narrative market analysis.
///
/// `None` means the field was not found in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub market_sentiment_score: Option<i32>,
    pub best_timing: Option<String>,
    pub regional_focus: Option<String>,
    pub strategic_reasoning: Option<String>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.market_sentiment_score.is_none()
            && self.best_timing.is_none()
            && self.regional_focus.is_none()
            && self.strategic_reasoning.is_none()
    }
}

/// Extracts score, timing and the two narrative sections from a raw analysis.
///
/// Score and timing come from the trailing metadata block when one parses; otherwise each
/// falls back to the header patterns in [`text`]. Malformed input yields unset fields, never
/// an error.
pub fn parse_analysis_response(raw: &str) -> AnalysisResult {
    if raw.trim().is_empty() {
        return AnalysisResult::default();
    }

    let metadata = json::parse_metadata(raw).unwrap_or_default();

    let market_sentiment_score = metadata
        .market_sentiment_score
        .or_else(|| text::first_match(&text::SCORE_STRATEGIES, raw));
    let best_timing = metadata
        .best_timing
        .or_else(|| text::first_match(&text::TIMING_STRATEGIES, raw));

    let result = AnalysisResult {
        market_sentiment_score,
        best_timing,
        regional_focus: text::regional_focus(raw),
        strategic_reasoning: text::strategic_reasoning(raw),
    };

    tracing::debug!(
        score = ?result.market_sentiment_score,
        has_timing = result.best_timing.is_some(),
        has_regional_focus = result.regional_focus.is_some(),
        has_reasoning = result.strategic_reasoning.is_some(),
        "parsed analysis response"
    );

    result
}
