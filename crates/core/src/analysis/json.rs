use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("valid json fence regex"));
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("valid fence regex"));
static METADATA_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\{.*"market_sentiment_score".*"best_timing".*\}"#)
        .expect("valid metadata object regex")
});

/// Score and timing as carried by the trailing metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub market_sentiment_score: Option<i32>,
    pub best_timing: Option<String>,
}

/// Returns the first metadata candidate: a ```json fence, then any fence, then a bare object
/// mentioning both metadata keys. Only the first candidate found is ever considered.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(inner) = fenced(&JSON_FENCE, text) {
        return Some(inner);
    }
    if let Some(inner) = fenced(&ANY_FENCE, text) {
        return Some(inner);
    }

    // Cheap substring gate before running the greedy object regex.
    let lower = text.to_ascii_lowercase();
    if !(lower.contains("market_sentiment_score") && lower.contains("best_timing")) {
        return None;
    }
    let greedy = METADATA_OBJECT.find(text)?.as_str().trim();
    if greedy.is_empty() || serde_json::from_str::<Value>(greedy).is_ok() {
        return (!greedy.is_empty()).then_some(greedy);
    }
    // Braces in the surrounding prose widen the greedy span past the object itself.
    embedded_object(text).or(Some(greedy))
}

/// First JSON object starting at some `{` of `text` that carries both metadata keys at its
/// top level. Parsing stops at the end of that object, so trailing prose is ignored.
fn embedded_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next()? {
            Ok(Value::Object(obj))
                if obj.contains_key("market_sentiment_score") && obj.contains_key("best_timing") =>
            {
                Some(&text[start..start + stream.byte_offset()])
            }
            _ => None,
        }
    })
}

fn fenced<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    let caps = re.captures(text)?;
    let inner = caps.get(1)?.as_str().trim();
    // An empty fence never yields a candidate, so the next pattern gets a chance.
    (!inner.is_empty()).then_some(inner)
}

/// Parses the metadata block out of `text`. `None` when no candidate exists or the candidate
/// is not valid JSON.
pub fn parse_metadata(text: &str) -> Option<Metadata> {
    let json_str = extract_json(text)?;
    let value = match serde_json::from_str::<Value>(json_str) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse analysis metadata JSON; falling back to text extraction");
            return None;
        }
    };

    Some(Metadata {
        market_sentiment_score: value.get("market_sentiment_score").and_then(coerce_score),
        best_timing: value.get("best_timing").and_then(coerce_timing),
    })
}

fn coerce_score(v: &Value) -> Option<i32> {
    let n = match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
        },
        Value::String(s) => parse_leading_int(s)?,
        _ => return None,
    };
    score_in_range(n)
}

pub(crate) fn score_in_range(n: i64) -> Option<i32> {
    (0..=100).contains(&n).then_some(n as i32)
}

/// Integer prefix of `s` after leading whitespace, e.g. `" 72/100"` -> 72.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn coerce_timing(v: &Value) -> Option<String> {
    let s = match v {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        other => other.to_string().trim().to_string(),
    };
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_prefers_json_fence() {
        let text = "intro\n```\nnot this\n```\n```json\n{\"a\":1}\n```\n";
        // The ```json fence wins even though a bare fence appears first.
        assert_eq!(extract_json(text), Some("{\"a\":1}"));
    }

    #[test]
    fn extract_json_falls_back_to_bare_fence() {
        let text = "prose\n```\n{\"market_sentiment_score\": 40}\n```";
        assert_eq!(extract_json(text), Some("{\"market_sentiment_score\": 40}"));
    }

    #[test]
    fn extract_json_finds_unfenced_object() {
        let text = "Summary.\n{\"market_sentiment_score\": 55, \"best_timing\": \"Wait\"} trailing";
        assert_eq!(
            extract_json(text),
            Some("{\"market_sentiment_score\": 55, \"best_timing\": \"Wait\"}")
        );
    }

    #[test]
    fn extract_json_skips_braces_in_surrounding_prose() {
        let object = "{\"market_sentiment_score\": 55, \"best_timing\": \"Wait\"}";

        let before = format!("Rates {{approx.}} eased.\n{object}");
        assert_eq!(extract_json(&before), Some(object));

        let after = format!("{object}\nSee note {{1}}.");
        assert_eq!(extract_json(&after), Some(object));

        let both = format!("Range {{low}} to {{high}}: {object} (see {{2}})");
        assert_eq!(extract_json(&both), Some(object));
    }

    #[test]
    fn extract_json_skips_objects_without_both_keys() {
        let text = "{\"note\": 1} then {\"market_sentiment_score\": 30, \"best_timing\": \"Later\"} {x}";
        assert_eq!(
            extract_json(text),
            Some("{\"market_sentiment_score\": 30, \"best_timing\": \"Later\"}")
        );
    }

    #[test]
    fn extract_json_requires_both_keys_for_bare_objects() {
        assert_eq!(extract_json("{\"market_sentiment_score\": 55}"), None);
    }

    #[test]
    fn parse_metadata_returns_none_on_invalid_json() {
        assert_eq!(parse_metadata("```json\n{not json}\n```"), None);
    }

    #[test]
    fn coerces_numeric_strings_and_floats() {
        let m = parse_metadata(r#"```json
{"market_sentiment_score": "72", "best_timing": "  Buy now  "}
```"#)
        .unwrap();
        assert_eq!(m.market_sentiment_score, Some(72));
        assert_eq!(m.best_timing.as_deref(), Some("Buy now"));

        let m = parse_metadata(r#"```json
{"market_sentiment_score": 64.9, "best_timing": "Wait"}
```"#)
        .unwrap();
        assert_eq!(m.market_sentiment_score, Some(64));
    }

    #[test]
    fn rejects_out_of_range_and_non_numeric_scores() {
        for raw in ["150", "-5", "\"high\"", "null", "[1]"] {
            let text = format!("```json\n{{\"market_sentiment_score\": {raw}, \"best_timing\": \"x\"}}\n```");
            let m = parse_metadata(&text).unwrap();
            assert_eq!(m.market_sentiment_score, None, "score {raw}");
        }
    }

    #[test]
    fn blank_or_falsy_timing_is_absent() {
        for raw in ["\"   \"", "null", "false", "0"] {
            let text = format!("```json\n{{\"market_sentiment_score\": 10, \"best_timing\": {raw}}}\n```");
            let m = parse_metadata(&text).unwrap();
            assert_eq!(m.best_timing, None, "timing {raw}");
        }
    }

    #[test]
    fn leading_int_parsing() {
        assert_eq!(parse_leading_int(" 72/100"), Some(72));
        assert_eq!(parse_leading_int("-5"), Some(-5));
        assert_eq!(parse_leading_int("abc"), None);
    }
}
