//! Integration tests for the record store: transactional writes, ordering,
//! updates, cascades and persistence across reopen.

use health_sync_core::models::{
    CheckUpInput, CompleteRecordInput, MedicalHistoryInput, NoteInput, PatientInput,
    TreatmentPlanInput,
};
use health_sync_core::{RecordError, RecordSection, RecordStore};
use serde_json::json;

fn patient(name: &str, phone: Option<&str>) -> PatientInput {
    PatientInput {
        patient_name: Some(name.into()),
        guardian_name: Some("Rashid Ali".into()),
        age: Some(27),
        gender: Some("Female".into()),
        blood_group: Some("B+".into()),
        date_of_birth: Some("1997-04-21".into()),
        phone_number: phone.map(Into::into),
        ..Default::default()
    }
}

fn checkup(date: &str, diagnosis: &str) -> CheckUpInput {
    CheckUpInput {
        date_of_checkup: Some(date.into()),
        current_diagnosis: Some(diagnosis.into()),
        blood_pressure: Some("118/76".into()),
        ..Default::default()
    }
}

#[test]
fn test_create_from_wire_json() {
    let store = RecordStore::open_in_memory().unwrap();
    let input: CompleteRecordInput = serde_json::from_value(json!({
        "patient": {
            "patient_name": "Noor Fatima",
            "age": 27,
            "gender": "Female",
            "blood_group": "B+",
            "date_of_birth": "1997-04-21"
        },
        "checkups": {"date_of_checkup": "2024-05-05", "symptoms": "Cough"},
        "treatments": {"prescribed_medications": "Syrup"},
        "notes": [{"doctor_remarks": "Rest"}]
    }))
    .unwrap();

    let created = store.create_record(&input).unwrap();
    let json = serde_json::to_value(&created).unwrap();

    assert_eq!(json["status"], "created");
    assert_eq!(json["patient_id"], created.patient_id);
    assert_eq!(json["record"]["patient"]["blood_group"], "B+");
    assert_eq!(json["record"]["checkups"][0]["date_of_checkup"], "2024-05-05");
    assert_eq!(
        json["record"]["treatments"][0]["checkup"],
        json["record"]["checkups"][0]["id"]
    );
    assert_eq!(json["record"]["notes"][0]["patient_name"], "Noor Fatima");
}

#[test]
fn test_numeric_scalars_accepted_from_wire_json() {
    let store = RecordStore::open_in_memory().unwrap();
    let input: CompleteRecordInput = serde_json::from_value(json!({
        "patient": {
            "patient_name": "Bilal Shah",
            "age": "30",
            "gender": "Male",
            "blood_group": "A+",
            "date_of_birth": "1994-02-02",
            "phone_number": 3001234567u64
        },
        "checkups": [{
            "date_of_checkup": "2024-01-01",
            "heart_rate": 72,
            "weight": 70.5,
            "temperature": 98.6
        }]
    }))
    .unwrap();

    let record = store.create_record(&input).unwrap().record;
    assert_eq!(record.patient.age, 30);
    assert_eq!(record.patient.phone_number.as_deref(), Some("3001234567"));
    let checkup = &record.checkups[0];
    assert_eq!(checkup.heart_rate.as_deref(), Some("72"));
    assert_eq!(checkup.weight.as_deref(), Some("70.5"));
    assert_eq!(checkup.temperature.as_deref(), Some("98.6"));
}

#[test]
fn test_bad_item_reports_its_index() {
    let err = serde_json::from_value::<CompleteRecordInput>(json!({
        "checkups": [{"symptoms": "ok"}, {"symptoms": ["a", "b"]}]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("item 1"), "{err}");
}

#[test]
fn test_explicit_null_checkup_is_not_linked() {
    let store = RecordStore::open_in_memory().unwrap();
    let input: CompleteRecordInput = serde_json::from_value(json!({
        "patient": {
            "patient_name": "Zara Butt",
            "age": 22,
            "gender": "Female",
            "blood_group": "O+",
            "date_of_birth": "2002-08-08"
        },
        "checkups": [{"date_of_checkup": "2024-02-02"}],
        "treatments": [
            {"related_disease": "Asthma", "checkup": null},
            {"related_disease": "Rhinitis"}
        ]
    }))
    .unwrap();

    let record = store.create_record(&input).unwrap().record;
    let by_disease = |name: &str| {
        record
            .treatments
            .iter()
            .find(|t| t.related_disease.as_deref() == Some(name))
            .unwrap()
    };
    assert_eq!(by_disease("Asthma").checkup, None);
    assert_eq!(by_disease("Rhinitis").checkup, Some(record.checkups[0].id));
}

#[test]
fn test_failed_treatment_leaves_nothing_behind() {
    let store = RecordStore::open_in_memory().unwrap();
    let input = CompleteRecordInput {
        patient: Some(patient("Rolled Back", None)),
        medical_history: Some(MedicalHistoryInput {
            allergies: Some("Dust".into()),
            ..Default::default()
        }),
        checkups: Some(vec![checkup("2024-01-01", "Flu")]),
        treatments: Some(vec![TreatmentPlanInput {
            assigned_doctor: Some("D".repeat(101)),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let err = store.create_record(&input).unwrap_err();
    match err {
        RecordError::Validation { section, errors } => {
            assert_eq!(section, RecordSection::Treatment(0));
            assert!(errors.get("assigned_doctor").is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.list_patients().unwrap().is_empty());
}

#[test]
fn test_retrieval_orders_checkups_descending() {
    let store = RecordStore::open_in_memory().unwrap();
    let created = store
        .create_record(&CompleteRecordInput {
            patient: Some(patient("Ordered", None)),
            checkups: Some(vec![
                checkup("2022-12-01", "A"),
                checkup("2024-02-01", "B"),
                checkup("2023-06-01", "C"),
            ]),
            ..Default::default()
        })
        .unwrap();

    let record = store.get_record(created.patient_id).unwrap();
    let diagnoses: Vec<_> = record
        .checkups
        .iter()
        .map(|c| c.current_diagnosis.clone().unwrap())
        .collect();
    assert_eq!(diagnoses, ["B", "C", "A"]);
}

#[test]
fn test_update_keeps_phone_of_same_patient() {
    let store = RecordStore::open_in_memory().unwrap();
    let created = store
        .create_record(&CompleteRecordInput {
            patient: Some(patient("Phone Owner", Some("+923451234567"))),
            ..Default::default()
        })
        .unwrap();

    // Re-sending the same phone for the same patient is not a conflict.
    let updated = store
        .update_record(
            created.patient_id,
            &CompleteRecordInput {
                patient: Some(patient("Phone Owner", Some("+923451234567"))),
                notes: Some(vec![NoteInput {
                    special_warnings: Some("Latex allergy".into()),
                    ..Default::default()
                }]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.notes.len(), 1);

    // A different patient claiming it is.
    let err = store
        .create_record(&CompleteRecordInput {
            patient: Some(patient("Claimant", Some("+923451234567"))),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        RecordError::Validation {
            section: RecordSection::Patient,
            ..
        }
    ));
}

#[test]
fn test_update_with_empty_collection_clears_it() {
    let store = RecordStore::open_in_memory().unwrap();
    let created = store
        .create_record(&CompleteRecordInput {
            patient: Some(patient("Clearable", None)),
            checkups: Some(vec![checkup("2024-01-01", "Cold")]),
            ..Default::default()
        })
        .unwrap();

    let updated = store
        .update_record(
            created.patient_id,
            &CompleteRecordInput {
                checkups: Some(Vec::new()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(updated.checkups.is_empty());
    assert_eq!(updated.patient.patient_name, "Clearable");
}

#[test]
fn test_list_and_delete() {
    let store = RecordStore::open_in_memory().unwrap();
    let first = store
        .create_record(&CompleteRecordInput {
            patient: Some(patient("First", None)),
            ..Default::default()
        })
        .unwrap();
    let second = store
        .create_record(&CompleteRecordInput {
            patient: Some(patient("Second", None)),
            checkups: Some(vec![checkup("2024-04-04", "Sprain")]),
            ..Default::default()
        })
        .unwrap();

    let listed = store.list_patients().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].patient.id, second.patient_id);
    assert_eq!(listed[0].checkups_count, 1);

    let json = serde_json::to_value(&listed[0]).unwrap();
    assert_eq!(json["patient_name"], "Second");
    assert_eq!(json["last_checkup_date"], "2024-04-04");

    store.delete_patient(first.patient_id).unwrap();
    assert!(matches!(
        store.get_record(first.patient_id),
        Err(RecordError::NotFound(_))
    ));
    assert_eq!(store.list_patients().unwrap().len(), 1);
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("health_sync.db");

    let id = {
        let store = RecordStore::open(&path).unwrap();
        store
            .create_record(&CompleteRecordInput {
                patient: Some(patient("Durable", None)),
                checkups: Some(vec![checkup("2024-03-03", "Asthma")]),
                ..Default::default()
            })
            .unwrap()
            .patient_id
    };

    let store = RecordStore::open(&path).unwrap();
    let record = store.get_record(id).unwrap();
    assert_eq!(record.patient.patient_name, "Durable");
    assert_eq!(record.checkups.len(), 1);
}
