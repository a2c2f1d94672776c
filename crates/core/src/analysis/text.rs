//! Header-based extraction for responses that follow the numbered, bold-header layout
//! (`1. **Market Sentiment Score**: 82`) instead of (or in addition to) the metadata block.
//!
//! Every strategy is a plain `fn(&str) -> Option<_>` so each can be tested on its own.

use crate::analysis::json::score_in_range;
use once_cell::sync::Lazy;
use regex::Regex;

static SCORE_BOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*\*Market Sentiment Score\*\*:\s*(\d+)").expect("valid score regex")
});
static SCORE_PLAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Market Sentiment Score[:\s]+(\d+)").expect("valid score regex")
});
static SCORE_NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)1\.\s*\*\*Market Sentiment Score\*\*:\s*(\d+)").expect("valid score regex")
});

static TIMING_BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\*Best Timing\*\*:\s*").expect("valid timing regex"));
static TIMING_PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Best Timing[:\s]+").expect("valid timing regex"));
static TIMING_NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)2\.\s*\*\*Best Timing\*\*:\s*").expect("valid timing regex")
});

// Accepts both `**Regional Focus (Summerlin):**` and `**Regional Focus (Summerlin)**:`.
static REGIONAL_FOCUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*\*Regional Focus[^:]*:(?:\*\*)?\s*").expect("valid regional regex")
});
static STRATEGIC_REASONING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*\*Strategic Reasoning\*\*:\s*").expect("valid reasoning regex")
});

// A bold header line, optionally numbered (`**Next**`, `3. **Next**`).
static NEXT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*(?:\d+\.\s*)?\*\*").expect("valid header regex"));
static NEXT_ITEM_THREE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*3\.").expect("valid item regex"));
static PARAGRAPH_OR_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\n|\n\s*(?:\d+\.\s*)?\*\*").expect("valid paragraph regex"));

pub type Strategy<T> = fn(&str) -> Option<T>;

pub const SCORE_STRATEGIES: [Strategy<i32>; 3] =
    [score_bold_header, score_plain_label, score_numbered_item];

pub const TIMING_STRATEGIES: [Strategy<String>; 3] =
    [timing_bold_header, timing_plain_label, timing_numbered_item];

/// Runs `strategies` in order and returns the first hit.
pub fn first_match<T>(strategies: &[Strategy<T>], text: &str) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(text))
}

pub fn score_bold_header(text: &str) -> Option<i32> {
    captured_score(&SCORE_BOLD, text)
}

pub fn score_plain_label(text: &str) -> Option<i32> {
    captured_score(&SCORE_PLAIN, text)
}

pub fn score_numbered_item(text: &str) -> Option<i32> {
    captured_score(&SCORE_NUMBERED, text)
}

fn captured_score(re: &Regex, text: &str) -> Option<i32> {
    let digits = re.captures(text)?.get(1)?.as_str();
    // A run of digits too long for i64 is out of range anyway.
    score_in_range(digits.parse::<i64>().ok()?)
}

pub fn timing_bold_header(text: &str) -> Option<String> {
    section_after(&TIMING_BOLD, &NEXT_HEADER, text).and_then(clean_timing)
}

/// Unbolded `Best Timing: ...`: the rest of that line, as long as the line is the last one or
/// is followed by a bold header.
pub fn timing_plain_label(text: &str) -> Option<String> {
    TIMING_PLAIN.find_iter(text).find_map(|m| {
        let rest = &text[m.end()..];
        let line_end = rest.find('\n').unwrap_or(rest.len());
        if line_end == 0 {
            return None;
        }
        let after = &rest[line_end..];
        let terminated = after.is_empty()
            || NEXT_HEADER
                .find(after)
                .is_some_and(|h| h.start() == 0);
        if !terminated {
            return None;
        }
        clean_timing(&rest[..line_end])
    })
}

pub fn timing_numbered_item(text: &str) -> Option<String> {
    section_after(&TIMING_NUMBERED, &NEXT_ITEM_THREE, text).and_then(clean_timing)
}

pub fn regional_focus(text: &str) -> Option<String> {
    section_after(&REGIONAL_FOCUS, &NEXT_HEADER, text).and_then(normalize_whitespace)
}

pub fn strategic_reasoning(text: &str) -> Option<String> {
    section_after(&STRATEGIC_REASONING, &PARAGRAPH_OR_HEADER, text)
        .and_then(normalize_whitespace)
}

/// Body following the first `label` match, up to the first `terminator` that starts at least
/// one character into the body, or the end of `text`.
fn section_after<'a>(label: &Regex, terminator: &Regex, text: &'a str) -> Option<&'a str> {
    let start = label.find(text)?.end();
    let body = &text[start..];
    let first = body.chars().next()?.len_utf8();
    let end = terminator
        .find(&body[first..])
        .map(|m| first + m.start())
        .unwrap_or(body.len());
    Some(&body[..end])
}

fn clean_timing(raw: &str) -> Option<String> {
    let collapsed = normalize_whitespace(raw)?;
    let stripped = collapsed
        .strip_prefix(|c: char| c == '-' || c == '•')
        .map(str::trim_start)
        .unwrap_or(&collapsed);
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// Trims and collapses every whitespace run (newlines included) to one space.
pub fn normalize_whitespace(raw: &str) -> Option<String> {
    let out = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!out.is_empty()).then_some(out)
}
