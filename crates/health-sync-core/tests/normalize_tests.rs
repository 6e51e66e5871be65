//! Golden and property tests for document normalization.
//!
//! Golden cases pin the output for document shapes seen from model
//! extraction; the property tests check that any JSON at all normalizes
//! into something the store accepts.

use chrono::NaiveDate;
use health_sync_core::normalize::{to_number, to_text};
use health_sync_core::{ContactPolicy, Database, Normalizer};
use proptest::prelude::*;
use serde_json::{json, Value};

fn normalizer() -> Normalizer {
    Normalizer::new().with_fallback_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
}

/// One input document and the patient fields it must produce.
struct GoldenCase {
    id: &'static str,
    input: Value,
    expected_name: &'static str,
    expected_age: i64,
    expected_gender: &'static str,
    expected_blood_group: &'static str,
    expected_dob: &'static str,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "well-formed",
            input: json!({
                "patient": {
                    "patient_name": "Ahmed Raza",
                    "age": 61,
                    "gender": "Male",
                    "blood_group": "AB+",
                    "date_of_birth": "1963-02-11"
                }
            }),
            expected_name: "Ahmed Raza",
            expected_age: 61,
            expected_gender: "Male",
            expected_blood_group: "AB+",
            expected_dob: "1963-02-11",
        },
        GoldenCase {
            id: "model-style-keys",
            input: json!({
                "patient": {
                    "name": "Fatima Noor",
                    "age": "45 years",
                    "sex": "female",
                    "blood_type": "O negative",
                    "dob": "11/09/1979"
                }
            }),
            expected_name: "Fatima Noor",
            expected_age: 45,
            expected_gender: "Female",
            expected_blood_group: "O-",
            expected_dob: "1979-09-11",
        },
        GoldenCase {
            id: "bare-patient-root",
            input: json!({
                "full_name": "Bilal Hussain",
                "age": 38.6,
                "gender": "M",
                "blood_group": "b+ve",
                "date_of_birth": "March 2, 1986"
            }),
            expected_name: "Bilal Hussain",
            expected_age: 39,
            expected_gender: "Male",
            expected_blood_group: "B+",
            expected_dob: "1986-03-02",
        },
        GoldenCase {
            id: "everything-missing",
            input: json!({"checkups": [{"symptoms": "Fever"}]}),
            expected_name: "Unknown Patient",
            expected_age: 0,
            expected_gender: "Other",
            expected_blood_group: "O+",
            expected_dob: "2000-01-01",
        },
        GoldenCase {
            id: "garbage-values",
            input: json!({
                "patient": {
                    "patient_name": ["Ayaan", "Malik"],
                    "age": "unknown",
                    "gender": 42,
                    "blood_group": "purple",
                    "date_of_birth": "sometime in spring"
                }
            }),
            expected_name: "Ayaan, Malik",
            expected_age: 0,
            expected_gender: "Other",
            expected_blood_group: "O+",
            expected_dob: "2000-01-01",
        },
    ]
}

#[test]
fn test_golden_cases() {
    let normalizer = normalizer();

    for case in get_golden_cases() {
        let report = normalizer.normalize(&case.input);
        let patient = report.record.patient.expect("patient always present");

        assert_eq!(
            patient.patient_name.as_deref(),
            Some(case.expected_name),
            "Case {}: name mismatch",
            case.id
        );
        assert_eq!(
            patient.age,
            Some(case.expected_age),
            "Case {}: age mismatch",
            case.id
        );
        assert_eq!(
            patient.gender.as_deref(),
            Some(case.expected_gender),
            "Case {}: gender mismatch",
            case.id
        );
        assert_eq!(
            patient.blood_group.as_deref(),
            Some(case.expected_blood_group),
            "Case {}: blood group mismatch",
            case.id
        );
        assert_eq!(
            patient.date_of_birth.as_deref(),
            Some(case.expected_dob),
            "Case {}: date of birth mismatch",
            case.id
        );
    }
}

#[test]
fn test_golden_cases_save() {
    let normalizer = normalizer();
    let mut db = Database::open_in_memory().unwrap();

    for case in get_golden_cases() {
        let report = normalizer.normalize(&case.input);
        db.create_record(&report.record)
            .unwrap_or_else(|e| panic!("Case {}: save failed: {e}", case.id));
    }
    assert_eq!(db.list_patients().unwrap().len(), get_golden_cases().len());
}

#[test]
fn test_safe_conversions() {
    assert_eq!(to_text(&Value::Null), "");
    assert_eq!(to_text(&json!(["a", "b"])), "a, b");
    assert_eq!(to_text(&json!({"k": "v"})), "k: v");
    assert_eq!(to_number(&json!("70.5 kg"), 0.0), 70.5);
    assert_eq!(to_number(&json!("invalid"), 70.0), 70.0);
}

#[test]
fn test_full_model_document_round_trip() {
    let document = json!({
        "patient": {"patient_name": "Hina Shah", "age": 33, "gender": "F", "blood_group": "A-"},
        "medical_history": {"allergies": ["Penicillin", "Peanuts"], "past_conditions": null},
        "checkups": [
            {"date_of_checkup": "2024-01-10", "diagnosis": "Migraine", "vitals": {"pulse_rate": "76 bpm"}},
            {"date_of_checkup": "2023-07-02", "symptoms": "Dizziness"}
        ],
        "lab_tests": {"results": "MRI clear"},
        "treatments": [{"medications": ["Sumatriptan"], "next_followup_date": "2024-02-10"}],
        "notes": [{"remarks": "Reduce screen time"}]
    });

    let report = normalizer().normalize(&document);
    let mut db = Database::open_in_memory().unwrap();
    let created = db.create_record(&report.record).unwrap();
    let record = created.record;

    let history = record.medical_history.unwrap();
    assert_eq!(history.allergies.as_deref(), Some("Penicillin, Peanuts"));
    assert_eq!(
        history.past_conditions.as_deref(),
        Some("No significant past conditions")
    );

    assert_eq!(record.checkups.len(), 2);
    assert_eq!(record.checkups[0].date_of_checkup.to_string(), "2024-01-10");
    assert_eq!(record.checkups[0].heart_rate.as_deref(), Some("76 bpm"));

    // Linked to the first checkup in the document, not the most recent.
    let first_checkup = record
        .checkups
        .iter()
        .find(|c| c.current_diagnosis.as_deref() == Some("Migraine"))
        .unwrap();
    assert_eq!(record.treatments[0].checkup, Some(first_checkup.id));
    assert_eq!(
        record.treatments[0].prescribed_medications.as_deref(),
        Some("Sumatriptan")
    );
    assert_eq!(record.lab_tests[0].lab_results.as_deref(), Some("MRI clear"));
    assert_eq!(
        record.notes[0].doctor_remarks.as_deref(),
        Some("Reduce screen time")
    );
}

// =========================================================================
// Property tests
// =========================================================================

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "patient",
            "name",
            "age",
            "gender",
            "blood_group",
            "date_of_birth",
            "phone_number",
            "email_address",
            "medical_history",
            "allergies",
            "checkups",
            "vitals",
            "weight",
            "height",
            "bmi",
            "date_of_checkup",
            "lab_tests",
            "treatments",
            "medications",
            "next_followup_date",
            "notes",
        ])
        .prop_map(String::from),
        "[a-z_]{1,12}",
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e9..1.0e9f64).prop_map(Value::from),
        "[ -~]{0,40}".prop_map(Value::from),
        "[0-9]{1,4}[-/. ][0-9]{1,2}[-/. ][0-9]{1,4}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 96, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::btree_map(arb_key(), inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Any JSON normalizes into a record that the store accepts.
    #[test]
    fn normalized_documents_always_save(document in arb_json()) {
        let report = normalizer().normalize(&document);
        let mut db = Database::open_in_memory().unwrap();
        let saved = db.create_record(&report.record);
        prop_assert!(saved.is_ok(), "save failed: {:?}", saved.err());
    }

    /// Choice fields always land on a stored choice.
    #[test]
    fn choices_always_canonical(gender in "[ -~]{0,12}", blood in "[ -~]{0,12}") {
        let report = normalizer()
            .with_contact_policy(ContactPolicy::LeaveBlank)
            .normalize(&json!({"patient": {"gender": gender, "blood_group": blood}}));
        let patient = report.record.patient.unwrap();
        let g = patient.gender.unwrap();
        let b = patient.blood_group.unwrap();
        prop_assert!(["Male", "Female", "Other"].contains(&g.as_str()));
        prop_assert!(["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"].contains(&b.as_str()));
    }
}
