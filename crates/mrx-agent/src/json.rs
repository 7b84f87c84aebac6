//! Lenient JSON object extraction from model output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Matches a Markdown code fence around the payload, with or without a language tag.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\n?\s*```\s*$").expect("static regex")
});

/// Parse model output as a JSON object.
///
/// Accepts bare JSON or JSON wrapped in a single code fence. Returns `None`
/// for anything that is not an object.
pub fn parse_object(text: &str) -> Option<Value> {
    let body = CODE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    match serde_json::from_str::<Value>(body.trim()) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}
