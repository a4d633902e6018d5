use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::ParsedResponse;

/// Placeholder score used by guessed fallbacks. Not a computed value.
pub const FALLBACK_SCORE: u8 = 75;

/// Error label carried by the generic fallback.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse JSON response";

const FALLBACK_MATURITY_TREND: &str = "Stable";

/// Shape manufactured for output that failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackShape {
    /// `{ healthScore, summary, recommendations, criticalReplacements }`.
    HealthScore,
    /// `{ maturityScore, maturityTrend, topRisks }`.
    MaturityScore,
}

/// Parses the JSON value embedded in raw model output.
///
/// The first `{...}` or `[...]` span (greedy to the last closing delimiter)
/// is parsed in place of the whole text; without such a span the whole text
/// is parsed. This function is total: parse failures produce a fallback
/// value instead of an error.
#[must_use]
pub fn safe_json_parse(text: &str) -> ParsedResponse {
    let candidate = embedded_json_span(text).unwrap_or(text);
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => ParsedResponse::Structured(value),
        Err(_) => fallback_for(text),
    }
}

fn embedded_json_span(text: &str) -> Option<&str> {
    let last_brace = text.rfind('}');
    let last_bracket = text.rfind(']');

    text.char_indices().find_map(|(start, character)| {
        let end = match character {
            '{' => last_brace,
            '[' => last_bracket,
            _ => None,
        }?;
        (end > start).then(|| &text[start..=end])
    })
}

fn fallback_for(text: &str) -> ParsedResponse {
    if text.contains("healthScore") || text.contains("score") {
        return ParsedResponse::FallbackGuessed {
            shape: FallbackShape::HealthScore,
            value: json!({
                "healthScore": FALLBACK_SCORE,
                "summary": text,
                "recommendations": [text],
                "criticalReplacements": [],
            }),
        };
    }

    if text.contains("maturityScore") {
        return ParsedResponse::FallbackGuessed {
            shape: FallbackShape::MaturityScore,
            value: json!({
                "maturityScore": FALLBACK_SCORE,
                "maturityTrend": FALLBACK_MATURITY_TREND,
                "topRisks": [{ "title": text, "description": text }],
            }),
        };
    }

    ParsedResponse::Unstructured(json!({
        "result": text,
        "error": PARSE_FAILURE_MESSAGE,
    }))
}
