//! Value coercions for loosely shaped JSON.
//!
//! None of these fail: unusable input falls through to an empty string, a
//! caller-supplied default, or `None`.

use chrono::{DateTime, Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());
static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());

/// Day-first before month-first: "03/04/2024" reads as 3 April.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d %Y",
    "%d-%B-%Y",
];

/// Render any JSON value as display text.
///
/// Lists join their non-empty items with ", "; objects become
/// "key: value" pairs, skipping empty values.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(to_text)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| {
                let text = to_text(v);
                (!text.trim().is_empty()).then(|| format!("{k}: {text}"))
            })
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Numeric value of `value`, or `default`.
///
/// Strings yield the first decimal number they contain ("70.5 kg" → 70.5).
pub fn to_number(value: &Value, default: f64) -> f64 {
    number_in(value).unwrap_or(default)
}

/// Like [`to_number`] but `None` when no number is present.
pub fn number_in(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER_RE.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Objects held by a collection field: a single object becomes a
/// one-element list, non-object list items are dropped.
pub fn to_records(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Object(map) => vec![map],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

/// Parse a calendar date from ISO, day/month/year, or month-name forms.
///
/// Only four-digit years are accepted.
pub fn to_date(value: &Value) -> Option<NaiveDate> {
    parse_any_date(&to_text(value)).filter(|d| (1..=9999).contains(&d.year()))
}

fn parse_any_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // "2024-03-14T10:00:00" and "2024-03-14 10:00"
    if raw.len() > 10 && raw.is_char_boundary(10) {
        if let Ok(d) = NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }

    let cleaned = ORDINAL_RE.replace_all(raw, "$1").replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Walk a dotted path ("vitals.weight") through nested objects.
pub fn lookup<'a>(record: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Whether a value carries nothing worth keeping.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Number(_) | Value::Bool(_) => false,
        other => to_text(other).trim().is_empty(),
    }
}

/// First non-empty value among candidate paths.
pub fn first_present<'a>(record: &'a Map<String, Value>, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| lookup(record, path))
        .find(|v| !is_empty(v))
}
