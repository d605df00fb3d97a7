//! Locating and decoding structured values in free-text LLM replies
//!
//! Objects are fatal to the calling operation when they cannot be decoded.
//! Lists degrade through an ordered chain of sources instead.

use crate::error::{Result, ResumeMatcherError};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

pub const MAX_SUGGESTIONS: usize = 5;

/// Where a suggestion list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuggestionSource {
    Reply,
    PriorAnalysis,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions {
    pub items: Vec<String>,
    pub source: SuggestionSource,
}

/// Slice from the first `open` to the last `close` delimiter
fn delimited(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

/// Extract the JSON object embedded in `raw`
pub fn parse_object(raw: &str) -> Result<Value> {
    let slice = delimited(raw, '{', '}')
        .ok_or_else(|| ResumeMatcherError::parse("no JSON object found", raw))?;

    let value: Value = serde_json::from_str(slice)
        .map_err(|e| ResumeMatcherError::parse(format!("invalid JSON: {}", e), raw))?;

    if !value.is_object() {
        return Err(ResumeMatcherError::parse("JSON value is not an object", raw));
    }
    Ok(value)
}

/// Extract a JSON array of strings embedded in `raw`
pub fn parse_string_array(raw: &str) -> Result<Vec<String>> {
    let slice = delimited(raw, '[', ']')
        .ok_or_else(|| ResumeMatcherError::parse("no JSON array found", raw))?;

    serde_json::from_str::<Vec<String>>(slice)
        .map_err(|e| ResumeMatcherError::parse(format!("not a JSON array of strings: {}", e), raw))
}

/// Decode a suggestion list. Sources are tried in order: the reply itself,
/// then `fallback` (improvement points of a prior analysis), then nothing.
/// Never fails; the result holds at most [`MAX_SUGGESTIONS`] items.
pub fn parse_list(raw: &str, fallback: &[String]) -> Suggestions {
    let (mut items, source) = match parse_string_array(raw) {
        Ok(items) => {
            debug!("Suggestions decoded from the reply ({} items)", items.len());
            (items, SuggestionSource::Reply)
        }
        Err(e) => {
            warn!("Suggestion list not decodable, using fallback: {}", short_reason(&e));
            if fallback.is_empty() {
                warn!("No prior improvement points available, returning an empty list");
                (Vec::new(), SuggestionSource::Empty)
            } else {
                (fallback.to_vec(), SuggestionSource::PriorAnalysis)
            }
        }
    };

    items.truncate(MAX_SUGGESTIONS);
    Suggestions { items, source }
}

fn short_reason(err: &ResumeMatcherError) -> String {
    match err {
        ResumeMatcherError::Parse { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
