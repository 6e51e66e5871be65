//! Forgiving field deserializers for the write documents.
//!
//! Clients send vitals as `72` or `"72"` and ages as `30` or `"30"`; both
//! are accepted. Collection items that fail to parse are reported by index.

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String field that also takes numbers and booleans.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(D::Error::custom("Not a valid string.")),
    }
}

/// Integer field that also takes whole floats and numeric strings.
pub(crate) fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    const INVALID: &str = "A valid integer is required.";

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Some(i)),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok(Some(f as i64))
            }
            _ => Err(D::Error::custom(INVALID)),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(INVALID))
        }
        Some(_) => Err(D::Error::custom(INVALID)),
    }
}

/// Distinguishes an absent key (outer `None`) from an explicit `null`
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub(crate) fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    integer(deserializer).map(Some)
}

/// A list, or a single object treated as a one-element list.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item)
                    .map_err(|e| D::Error::custom(format!("item {i}: {e}")))
            })
            .collect::<Result<Vec<T>, _>>()
            .map(Some),
        Some(item) => serde_json::from_value(item)
            .map(|one| Some(vec![one]))
            .map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "text")]
        label: Option<String>,
        #[serde(deserialize_with = "integer")]
        count: Option<i64>,
        #[serde(deserialize_with = "nullable")]
        link: Option<Option<i64>>,
    }

    fn parse(value: Value) -> Result<Sample, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_text_accepts_scalars() {
        let cases = [
            (json!("72 bpm"), Some("72 bpm")),
            (json!(72), Some("72")),
            (json!(70.5), Some("70.5")),
            (json!(true), Some("true")),
            (Value::Null, None),
        ];
        for (input, expected) in cases {
            let parsed = parse(json!({ "label": input })).unwrap();
            assert_eq!(parsed.label.as_deref(), expected, "input {input}");
        }
        assert!(parse(json!({"label": ["a"]})).is_err());
    }

    #[test]
    fn test_integer_accepts_numeric_strings() {
        let cases = [
            (json!(30), Some(30)),
            (json!("30"), Some(30)),
            (json!(" 41 "), Some(41)),
            (json!(30.0), Some(30)),
            (json!(""), None),
        ];
        for (input, expected) in cases {
            let parsed = parse(json!({ "count": input })).unwrap();
            assert_eq!(parsed.count, expected, "input {input}");
        }
        for bad in [json!("thirty"), json!(30.5), json!({})] {
            let err = parse(json!({ "count": bad })).unwrap_err();
            assert!(err.to_string().contains("A valid integer is required."));
        }
    }

    #[test]
    fn test_nullable_keeps_explicit_null() {
        assert_eq!(parse(json!({})).unwrap().link, None);
        assert_eq!(parse(json!({"link": null})).unwrap().link, Some(None));
        assert_eq!(parse(json!({"link": 7})).unwrap().link, Some(Some(7)));
    }
}
