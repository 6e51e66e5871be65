//! Normalization of arbitrary JSON into a complete record.
//!
//! Model output and hand-written payloads arrive in many shapes: nested
//! vitals, lists where strings belong, single objects where lists belong,
//! free-form dates and choices. The normalizer repairs rather than rejects:
//! every field ends up populated so the result can be written.
//!
//! ```text
//! serde_json::Value ─▶ section lookup ─▶ field table ─▶ Coercion ─▶ CompleteRecordInput
//!                                                        │
//!                                                        └─▶ repaired field paths
//! ```

mod choices;
mod coerce;
mod fields;

use choices::ChoiceTables;
pub use coerce::{first_present, lookup, number_in, to_date, to_number, to_records, to_text};
pub use fields::{Coercion, FieldSpec};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::models::{BloodGroup, CompleteRecordInput, Gender};
use crate::validation::{is_valid_email, MAX_AGE};
use fields::{
    is_patient_key, CHECKUP_FIELDS, CHECKUP_KEYS, DEFAULT_BMI, HEIGHT_SOURCES, HISTORY_KEYS,
    LAB_TEST_FIELDS, LAB_TEST_KEYS, MEDICAL_HISTORY_FIELDS, NOTE_FIELDS, NOTE_KEYS,
    PATIENT_FIELDS, PATIENT_KEYS, TREATMENT_FIELDS, TREATMENT_KEYS, VITAL_MAX, WEIGHT_SOURCES,
};

const PHONE_MAX: usize = 20;

/// What to do with a missing or malformed phone number or email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPolicy {
    /// Fill in a unique placeholder so the record always saves.
    #[default]
    Synthesize,
    /// Store nothing; empty contacts never collide.
    LeaveBlank,
}

/// A normalized record and the fields that had to be filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport {
    pub record: CompleteRecordInput,
    /// Dotted paths such as `patient.age` or `checkups[0].bmi`
    pub repaired: Vec<String>,
}

/// Normalizer for loosely shaped patient documents.
pub struct Normalizer {
    contact_policy: ContactPolicy,
    fallback_date: Option<NaiveDate>,
    choices: ChoiceTables,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            contact_policy: ContactPolicy::default(),
            fallback_date: None,
            choices: ChoiceTables::new(),
        }
    }

    pub fn with_contact_policy(mut self, policy: ContactPolicy) -> Self {
        self.contact_policy = policy;
        self
    }

    /// Date used for checkups without a usable date (default: today, UTC).
    pub fn with_fallback_date(mut self, date: NaiveDate) -> Self {
        self.fallback_date = Some(date);
        self
    }

    /// Teach the normalizer a local spelling for a gender choice.
    pub fn add_gender_alias(&mut self, alias: &str, gender: Gender) {
        self.choices.add_gender_alias(alias, gender);
    }

    /// Normalize any JSON value. Never fails.
    pub fn normalize(&self, input: &Value) -> NormalizationReport {
        let empty = Map::new();
        let root = input.as_object().unwrap_or(&empty);
        let mut repaired = Vec::new();

        let patient_source = section(root, PATIENT_KEYS)
            .or_else(|| root.keys().any(|k| is_patient_key(k)).then_some(root))
            .unwrap_or(&empty);
        let patient = self.fill(patient_source, PATIENT_FIELDS, "patient", &mut repaired);

        let history_source = section(root, HISTORY_KEYS).unwrap_or(&empty);
        let history = self.fill(
            history_source,
            MEDICAL_HISTORY_FIELDS,
            "medical_history",
            &mut repaired,
        );

        let record = CompleteRecordInput {
            patient: Some(typed(patient)),
            medical_history: Some(typed(history)),
            checkups: Some(self.fill_all(root, CHECKUP_KEYS, CHECKUP_FIELDS, "checkups", &mut repaired)),
            lab_tests: Some(self.fill_all(root, LAB_TEST_KEYS, LAB_TEST_FIELDS, "lab_tests", &mut repaired)),
            treatments: Some(self.fill_all(
                root,
                TREATMENT_KEYS,
                TREATMENT_FIELDS,
                "treatments",
                &mut repaired,
            )),
            notes: Some(self.fill_all(root, NOTE_KEYS, NOTE_FIELDS, "notes", &mut repaired)),
        };

        debug!(repaired = ?repaired, "Normalized patient document");
        NormalizationReport { record, repaired }
    }

    fn fill_all<T: DeserializeOwned + Default>(
        &self,
        root: &Map<String, Value>,
        keys: &[&str],
        fields: &[FieldSpec],
        prefix: &str,
        repaired: &mut Vec<String>,
    ) -> Vec<T> {
        let value = keys
            .iter()
            .find_map(|k| root.get(*k).filter(|v| !v.is_null()))
            .unwrap_or(&Value::Null);

        to_records(value)
            .into_iter()
            .enumerate()
            .map(|(i, item)| typed(self.fill(item, fields, &format!("{prefix}[{i}]"), repaired)))
            .collect()
    }

    fn fill(
        &self,
        source: &Map<String, Value>,
        fields: &[FieldSpec],
        prefix: &str,
        repaired: &mut Vec<String>,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        for spec in fields {
            let raw = first_present(source, spec.sources);
            let resolved = self.resolve(spec.coercion, raw, source);
            if resolved.repaired {
                repaired.push(format!("{prefix}.{}", spec.name));
            }
            if let Some(value) = resolved.value {
                out.insert(spec.name.to_string(), value);
            }
        }
        out
    }

    fn resolve(
        &self,
        coercion: Coercion,
        raw: Option<&Value>,
        record: &Map<String, Value>,
    ) -> Resolved {
        let text = raw.map(|v| to_text(v).trim().to_string()).filter(|s| !s.is_empty());

        match coercion {
            Coercion::Text(default) => match text {
                Some(t) => Resolved::kept(t),
                None if default.is_empty() => Resolved::absent(),
                None => Resolved::filled(default),
            },
            Coercion::BoundedText(default, max) => match text {
                Some(t) if t.chars().count() > max => {
                    Resolved::filled(t.chars().take(max).collect::<String>())
                }
                Some(t) => Resolved::kept(t),
                None => Resolved::filled(default),
            },
            Coercion::Age => match raw.and_then(number_in).filter(|n| n.is_finite()) {
                Some(n) => {
                    let years = n.round().clamp(0.0, MAX_AGE as f64);
                    Resolved {
                        value: Some(Value::from(years as i64)),
                        repaired: years != n.round(),
                    }
                }
                None => Resolved {
                    value: Some(Value::from(0)),
                    repaired: true,
                },
            },
            Coercion::Gender => match text.as_deref().and_then(|t| self.choices.gender(t)) {
                Some(g) => Resolved::kept(g.as_str()),
                None => Resolved::filled(Gender::Other.as_str()),
            },
            Coercion::BloodGroup => {
                match text.as_deref().and_then(|t| self.choices.blood_group(t)) {
                    Some(b) => Resolved::kept(b.as_str()),
                    None => Resolved::filled(BloodGroup::OPositive.as_str()),
                }
            }
            Coercion::Date(default) => match raw.and_then(to_date) {
                Some(d) => Resolved::kept(iso(d)),
                None => Resolved::filled(default),
            },
            Coercion::DateOrFallback => match raw.and_then(to_date) {
                Some(d) => Resolved::kept(iso(d)),
                None => Resolved::filled(iso(self.fallback_date())),
            },
            Coercion::OptionalDate => match (raw, raw.and_then(to_date)) {
                (_, Some(d)) => Resolved::kept(iso(d)),
                (Some(_), None) => Resolved {
                    value: None,
                    repaired: true,
                },
                (None, None) => Resolved::absent(),
            },
            Coercion::Phone => match text {
                Some(t) if t.chars().count() <= PHONE_MAX && t.chars().any(|c| c.is_ascii_digit()) => {
                    Resolved::kept(t)
                }
                other => self.contact_fallback(other.is_some(), synthesize_phone),
            },
            Coercion::Email => match text {
                Some(t) if is_valid_email(&t) => Resolved::kept(t),
                other => self.contact_fallback(other.is_some(), synthesize_email),
            },
            Coercion::Bmi => match text {
                Some(t) if t.chars().count() > VITAL_MAX => {
                    Resolved::filled(t.chars().take(VITAL_MAX).collect::<String>())
                }
                Some(t) => Resolved::kept(t),
                None => match compute_bmi(record) {
                    Some(bmi) => Resolved::filled(format!("{bmi:.1}")),
                    None => Resolved::filled(DEFAULT_BMI),
                },
            },
        }
    }

    fn contact_fallback(&self, was_present: bool, synthesize: fn() -> String) -> Resolved {
        match self.contact_policy {
            ContactPolicy::Synthesize => Resolved::filled(synthesize()),
            ContactPolicy::LeaveBlank => Resolved {
                value: None,
                repaired: was_present,
            },
        }
    }

    fn fallback_date(&self) -> NaiveDate {
        self.fallback_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}

struct Resolved {
    value: Option<Value>,
    repaired: bool,
}

impl Resolved {
    fn kept(value: impl Into<String>) -> Self {
        Self {
            value: Some(Value::String(value.into())),
            repaired: false,
        }
    }

    fn filled(value: impl Into<String>) -> Self {
        Self {
            value: Some(Value::String(value.into())),
            repaired: true,
        }
    }

    fn absent() -> Self {
        Self {
            value: None,
            repaired: false,
        }
    }
}

/// First object found under any of `keys`.
fn section<'a>(root: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    keys.iter().find_map(|k| root.get(*k).and_then(Value::as_object))
}

/// Field maps hold only strings and integers, which every input type accepts.
fn typed<T: DeserializeOwned + Default>(fields: Map<String, Value>) -> T {
    serde_json::from_value(Value::Object(fields)).unwrap_or_default()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// BMI from weight (kg) and height (m when ≤ 3, otherwise cm), when both
/// are plausible.
fn compute_bmi(record: &Map<String, Value>) -> Option<f64> {
    let weight = first_present(record, WEIGHT_SOURCES).and_then(number_in)?;
    let height = first_present(record, HEIGHT_SOURCES).and_then(number_in)?;

    if !(1.0..=500.0).contains(&weight) {
        return None;
    }
    let meters = if height <= 3.0 { height } else { height / 100.0 };
    if !(0.3..=2.8).contains(&meters) {
        return None;
    }
    Some(weight / (meters * meters))
}

fn synthesize_phone() -> String {
    let digits = Uuid::new_v4().as_u128() % 10_000_000_000;
    format!("+1{digits:010}")
}

fn synthesize_email() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("patient-{}@example.com", &id[..12])
}
