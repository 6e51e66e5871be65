//! JSON object extraction from model output.
//!
//! Models wrap JSON in code fences or surround it with prose. Three
//! strategies are tried in order: a fenced block, the outermost brace span,
//! and the whole text with fence markers stripped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest raw-response excerpt carried in errors.
pub const EXCERPT_CHARS: usize = 500;

static FENCED_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").unwrap());

static OBJECT_SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

static FENCE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```(?:json)?\s*|\s*```$").unwrap());

/// Extraction errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Could not parse JSON from response")]
    NoJson { raw_response: String },

    #[error("Model returned JSON that is not an object")]
    NotAnObject { raw_response: String },
}

impl ExtractionError {
    /// Excerpt of the model output that failed to parse.
    pub fn raw_response(&self) -> &str {
        match self {
            ExtractionError::NoJson { raw_response }
            | ExtractionError::NotAnObject { raw_response } => raw_response,
        }
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Find the JSON object in a model response.
pub fn extract_json_object(text: &str) -> ExtractionResult<Map<String, Value>> {
    let trimmed = text.trim();

    let candidates = FENCED_OBJECT_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .into_iter()
        .chain(OBJECT_SPAN_RE.find(trimmed).map(|m| m.as_str()));

    let mut parsed_non_object = false;
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => parsed_non_object = true,
            Err(_) => {}
        }
    }

    let cleaned = FENCE_MARKER_RE.replace_all(trimmed, "");
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractionError::NotAnObject {
            raw_response: excerpt(text, EXCERPT_CHARS),
        }),
        Err(_) if parsed_non_object => Err(ExtractionError::NotAnObject {
            raw_response: excerpt(text, EXCERPT_CHARS),
        }),
        Err(_) => Err(ExtractionError::NoJson {
            raw_response: excerpt(text, EXCERPT_CHARS),
        }),
    }
}

/// First `max_chars` characters of `text`, with "..." appended when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
