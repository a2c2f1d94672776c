use crate::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored narrative analysis with the fields parsed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub region: String,
    pub execution_date: DateTime<Utc>,
    pub full_analysis: String,
    pub market_sentiment_score: Option<i32>,
    pub best_timing: Option<String>,
    pub regional_focus: Option<String>,
    pub strategic_reasoning: Option<String>,
}

/// Columns a re-parse may fill in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReparsePatch {
    pub market_sentiment_score: Option<i32>,
    pub best_timing: Option<String>,
}

impl ReparsePatch {
    /// Only fills columns that are still empty on `existing` and that `parsed` found.
    /// `None` when nothing would change.
    pub fn from_parsed(existing: &AnalysisRecord, parsed: &AnalysisResult) -> Option<Self> {
        let market_sentiment_score = match existing.market_sentiment_score {
            Some(_) => None,
            None => parsed.market_sentiment_score,
        };

        let timing_missing = existing
            .best_timing
            .as_deref()
            .map_or(true, |s| s.trim().is_empty());
        let best_timing = if timing_missing {
            parsed.best_timing.clone()
        } else {
            None
        };

        let patch = Self {
            market_sentiment_score,
            best_timing,
        };
        (patch != Self::default()).then_some(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(score: Option<i32>, timing: Option<&str>) -> AnalysisRecord {
        AnalysisRecord {
            id: 7,
            region: "Henderson".to_string(),
            execution_date: Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap(),
            full_analysis: String::new(),
            market_sentiment_score: score,
            best_timing: timing.map(str::to_string),
            regional_focus: None,
            strategic_reasoning: None,
        }
    }

    fn parsed(score: Option<i32>, timing: Option<&str>) -> AnalysisResult {
        AnalysisResult {
            market_sentiment_score: score,
            best_timing: timing.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn fills_only_missing_columns() {
        let patch = ReparsePatch::from_parsed(&record(Some(40), None), &parsed(Some(70), Some("Now")));
        assert_eq!(
            patch,
            Some(ReparsePatch {
                market_sentiment_score: None,
                best_timing: Some("Now".to_string()),
            })
        );
    }

    #[test]
    fn blank_timing_counts_as_missing() {
        let patch = ReparsePatch::from_parsed(&record(Some(1), Some("  ")), &parsed(None, Some("Wait")));
        assert_eq!(patch.and_then(|p| p.best_timing).as_deref(), Some("Wait"));
    }

    #[test]
    fn zero_score_is_written() {
        let patch = ReparsePatch::from_parsed(&record(None, Some("x")), &parsed(Some(0), None));
        assert_eq!(patch.and_then(|p| p.market_sentiment_score), Some(0));
    }

    #[test]
    fn nothing_to_update() {
        assert_eq!(ReparsePatch::from_parsed(&record(Some(1), Some("x")), &parsed(Some(2), Some("y"))), None);
        assert_eq!(ReparsePatch::from_parsed(&record(None, None), &parsed(None, None)), None);
    }
}
