//! Complete-record operations: transactional writes and assembled reads.
//!
//! A complete record is one patient plus its history, checkups, lab tests,
//! treatments and notes. Writes run in a single transaction; the first
//! failing section rolls the whole request back.

use rusqlite::Connection;
use tracing::{debug, info};

use super::clinical::{
    checkup_belongs_to, count_children, delete_children, get_medical_history, insert_checkup,
    insert_lab_tests, insert_note, insert_treatment, last_checkup_date, list_checkups,
    list_lab_tests, list_notes, list_treatments, upsert_medical_history, ChildCollection,
};
use super::patients::{find_patient_with, get_patient, insert_patient, update_patient, ContactColumn};
use super::Database;
use crate::error::{RecordError, RecordResult, RecordSection};
use crate::models::{
    CompleteRecord, CompleteRecordInput, CreatedRecord, IsBlank, MedicalHistoryInput, NewPatient,
    PatientInput, PatientOverview,
};
use crate::validation::{self, FieldErrors};

impl Database {
    /// Validate and persist a complete record in one transaction.
    ///
    /// Blank sub-records are skipped. Treatments with no `checkup` key are
    /// linked to the first checkup created by the same request.
    pub fn create_record(&mut self, input: &CompleteRecordInput) -> RecordResult<CreatedRecord> {
        let tx = self.conn.transaction()?;

        let patient_input = input.patient.clone().unwrap_or_default();
        let patient = validation::validate_patient(&patient_input)
            .map_err(|e| RecordError::validation(RecordSection::Patient, e))?;
        ensure_contacts_free(&tx, &patient, None)?;
        let patient_id = insert_patient(&tx, &patient)?;

        if let Some(history) = input.medical_history.as_ref().filter(|h| !h.is_blank()) {
            write_medical_history(&tx, patient_id, history)?;
        }
        write_collections(&tx, patient_id, input)?;

        tx.commit()?;
        info!(patient_id, "Created complete patient record");

        Ok(CreatedRecord::new(self.get_record(patient_id)?))
    }

    /// Apply an update to an existing record.
    ///
    /// Patient fields present in `input` overwrite stored values, medical
    /// history is merged field by field, and each collection present is
    /// replaced wholesale.
    pub fn update_record(
        &mut self,
        id: i64,
        input: &CompleteRecordInput,
    ) -> RecordResult<CompleteRecord> {
        let tx = self.conn.transaction()?;

        let existing = get_patient(&tx, id)?.ok_or(RecordError::NotFound(id))?;

        if let Some(changes) = &input.patient {
            let merged = PatientInput::from(&existing).merged_with(changes.clone());
            let patient = validation::validate_patient(&merged)
                .map_err(|e| RecordError::validation(RecordSection::Patient, e))?;
            ensure_contacts_free(&tx, &patient, Some(id))?;
            update_patient(&tx, id, &patient)?;
        }

        if let Some(changes) = input.medical_history.as_ref().filter(|h| !h.is_blank()) {
            let merged = match get_medical_history(&tx, id)? {
                Some(current) => MedicalHistoryInput::from(&current).merged_with(changes.clone()),
                None => changes.clone(),
            };
            write_medical_history(&tx, id, &merged)?;
        }

        for (present, collection) in [
            (input.checkups.is_some(), ChildCollection::CheckUps),
            (input.lab_tests.is_some(), ChildCollection::LabTests),
            (input.treatments.is_some(), ChildCollection::Treatments),
            (input.notes.is_some(), ChildCollection::Notes),
        ] {
            if present {
                let removed = delete_children(&tx, id, collection)?;
                debug!(patient_id = id, ?collection, removed, "Replacing collection");
            }
        }
        write_collections(&tx, id, input)?;

        tx.commit()?;
        info!(patient_id = id, "Updated patient record");

        self.get_record(id)
    }

    /// Assemble a patient and all of its child collections.
    pub fn get_record(&self, id: i64) -> RecordResult<CompleteRecord> {
        let conn = &self.conn;
        let patient = get_patient(conn, id)?.ok_or(RecordError::NotFound(id))?;

        Ok(CompleteRecord {
            medical_history: get_medical_history(conn, id)?,
            checkups: list_checkups(conn, id)?,
            lab_tests: list_lab_tests(conn, id)?,
            treatments: list_treatments(conn, id)?,
            notes: list_notes(conn, id)?,
            patient,
        })
    }

    /// Every patient, newest first, with child counts.
    pub fn list_overviews(&self) -> RecordResult<Vec<PatientOverview>> {
        self.list_patients()?
            .into_iter()
            .map(|patient| {
                let counts = count_children(&self.conn, patient.id)?;
                let last_checkup_date = last_checkup_date(&self.conn, patient.id)?;
                Ok::<_, RecordError>(PatientOverview {
                    patient,
                    medical_history_count: counts.medical_history,
                    checkups_count: counts.checkups,
                    lab_tests_count: counts.lab_tests,
                    treatments_count: counts.treatments,
                    notes_count: counts.notes,
                    last_checkup_date,
                })
            })
            .collect()
    }

    /// Delete a patient and, by cascade, everything it owns.
    pub fn delete_record(&self, id: i64) -> RecordResult<()> {
        if !self.delete_patient(id)? {
            return Err(RecordError::NotFound(id));
        }
        info!(patient_id = id, "Deleted patient record");
        Ok(())
    }
}

/// Reject phone numbers or emails already held by another patient.
fn ensure_contacts_free(
    conn: &Connection,
    patient: &NewPatient,
    current: Option<i64>,
) -> RecordResult<()> {
    let mut errors = FieldErrors::new();

    let checks = [
        (
            ContactColumn::Phone,
            "phone_number",
            "phone number",
            &patient.phone_number,
        ),
        (
            ContactColumn::Email,
            "email_address",
            "email address",
            &patient.email_address,
        ),
    ];
    for (column, field, label, value) in checks {
        let Some(value) = value else { continue };
        if let Some(holder) = find_patient_with(conn, column, value)? {
            if Some(holder) != current {
                errors.add(field, format!("patient with this {label} already exists."));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RecordError::validation(RecordSection::Patient, errors))
    }
}

fn write_medical_history(
    conn: &Connection,
    patient_id: i64,
    history: &MedicalHistoryInput,
) -> RecordResult<()> {
    let history = validation::validate_medical_history(history)
        .map_err(|e| RecordError::validation(RecordSection::MedicalHistory, e))?;
    upsert_medical_history(conn, patient_id, &history)?;
    Ok(())
}

/// Insert the checkups, lab tests, treatments and notes present in `input`.
fn write_collections(
    conn: &Connection,
    patient_id: i64,
    input: &CompleteRecordInput,
) -> RecordResult<()> {
    let mut first_checkup = None;
    for (i, checkup) in present(&input.checkups) {
        let checkup = validation::validate_checkup(checkup)
            .map_err(|e| RecordError::validation(RecordSection::CheckUp(i), e))?;
        let id = insert_checkup(conn, patient_id, &checkup)?;
        first_checkup.get_or_insert(id);
    }

    for (i, lab) in present(&input.lab_tests) {
        let lab = validation::validate_lab_tests(lab)
            .map_err(|e| RecordError::validation(RecordSection::LabTests(i), e))?;
        insert_lab_tests(conn, patient_id, &lab)?;
    }

    for (i, raw) in present(&input.treatments) {
        let section = RecordSection::Treatment(i);
        let mut treatment = validation::validate_treatment(raw)
            .map_err(|e| RecordError::validation(section, e))?;

        match raw.checkup {
            Some(Some(checkup_id)) => {
                if !checkup_belongs_to(conn, checkup_id, patient_id)? {
                    let mut errors = FieldErrors::new();
                    errors.add(
                        "checkup",
                        format!("Invalid pk \"{checkup_id}\" - object does not exist."),
                    );
                    return Err(RecordError::validation(section, errors));
                }
            }
            Some(None) => {}
            None => treatment.checkup = first_checkup,
        }
        insert_treatment(conn, patient_id, &treatment)?;
    }

    for (i, note) in present(&input.notes) {
        let note = validation::validate_note(note)
            .map_err(|e| RecordError::validation(RecordSection::Note(i), e))?;
        insert_note(conn, patient_id, &note)?;
    }

    Ok(())
}

/// Non-blank items of an optional collection, with their original indices.
fn present<T: IsBlank>(items: &Option<Vec<T>>) -> impl Iterator<Item = (usize, &T)> {
    items
        .iter()
        .flatten()
        .enumerate()
        .filter(|(_, item)| !item.is_blank())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckUpInput, LabTestsInput, NoteInput, TreatmentPlanInput};
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn patient(name: &str) -> PatientInput {
        PatientInput {
            patient_name: Some(name.into()),
            age: Some(52),
            gender: Some("Male".into()),
            blood_group: Some("O-".into()),
            date_of_birth: Some("1972-08-01".into()),
            ..Default::default()
        }
    }

    fn checkup(date: &str) -> CheckUpInput {
        CheckUpInput {
            date_of_checkup: Some(date.into()),
            symptoms: Some("Headache".into()),
            ..Default::default()
        }
    }

    fn patient_count(db: &Database) -> i64 {
        db.conn()
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_create_links_treatment_to_first_checkup() {
        let mut db = setup_db();
        let input = CompleteRecordInput {
            patient: Some(patient("Imran Ahmed")),
            checkups: Some(vec![checkup("2024-02-10")]),
            treatments: Some(vec![TreatmentPlanInput {
                related_disease: Some("Migraine".into()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let created = db.create_record(&input).unwrap();
        assert_eq!(created.status, "created");

        let record = created.record;
        assert_eq!(record.checkups.len(), 1);
        assert_eq!(record.treatments[0].checkup, Some(record.checkups[0].id));
        assert_eq!(
            record.treatments[0].checkup_date,
            NaiveDate::from_ymd_opt(2024, 2, 10)
        );
        assert_eq!(record.treatments[0].patient_name, "Imran Ahmed");
    }

    #[test]
    fn test_child_failure_rolls_back_patient() {
        let mut db = setup_db();
        let input = CompleteRecordInput {
            patient: Some(patient("Imran Ahmed")),
            checkups: Some(vec![
                checkup("2024-02-10"),
                CheckUpInput {
                    date_of_checkup: Some("not a date".into()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };

        let err = db.create_record(&input).unwrap_err();
        match err {
            RecordError::Validation { section, errors } => {
                assert_eq!(section, RecordSection::CheckUp(1));
                assert!(errors.get("date_of_checkup").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(patient_count(&db), 0);
    }

    #[test]
    fn test_foreign_checkup_reference_rejected() {
        let mut db = setup_db();
        let other = db
            .create_record(&CompleteRecordInput {
                patient: Some(patient("Other")),
                checkups: Some(vec![checkup("2024-01-01")]),
                ..Default::default()
            })
            .unwrap();
        let foreign_checkup = other.record.checkups[0].id;

        let err = db
            .create_record(&CompleteRecordInput {
                patient: Some(patient("Second")),
                treatments: Some(vec![TreatmentPlanInput {
                    checkup: Some(Some(foreign_checkup)),
                    ..Default::default()
                }]),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::Validation {
                section: RecordSection::Treatment(0),
                ..
            }
        ));
        assert_eq!(patient_count(&db), 1);
    }

    #[test]
    fn test_duplicate_phone_is_validation_error() {
        let mut db = setup_db();
        let mut first = patient("A");
        first.phone_number = Some("+923001112223".into());
        db.create_record(&CompleteRecordInput {
            patient: Some(first.clone()),
            ..Default::default()
        })
        .unwrap();

        let err = db
            .create_record(&CompleteRecordInput {
                patient: Some(first),
                ..Default::default()
            })
            .unwrap_err();
        match err {
            RecordError::Validation { section, errors } => {
                assert_eq!(section, RecordSection::Patient);
                assert_eq!(
                    errors.get("phone_number").unwrap()[0],
                    "patient with this phone number already exists."
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_identical_creates_make_two_patients() {
        let mut db = setup_db();
        let input = CompleteRecordInput {
            patient: Some(patient("Twin")),
            ..Default::default()
        };
        let a = db.create_record(&input).unwrap();
        let b = db.create_record(&input).unwrap();
        assert_ne!(a.patient_id, b.patient_id);
        assert_eq!(patient_count(&db), 2);
    }

    #[test]
    fn test_blank_children_skipped() {
        let mut db = setup_db();
        let created = db
            .create_record(&CompleteRecordInput {
                patient: Some(patient("Sparse")),
                medical_history: Some(MedicalHistoryInput::default()),
                lab_tests: Some(vec![LabTestsInput::default()]),
                notes: Some(vec![NoteInput::default()]),
                ..Default::default()
            })
            .unwrap();
        assert!(created.record.medical_history.is_none());
        assert!(created.record.lab_tests.is_empty());
        assert!(created.record.notes.is_empty());
    }

    #[test]
    fn test_get_record_orders_by_date_desc() {
        let mut db = setup_db();
        let created = db
            .create_record(&CompleteRecordInput {
                patient: Some(patient("Ordered")),
                checkups: Some(vec![
                    checkup("2023-05-01"),
                    checkup("2024-05-01"),
                    checkup("2023-11-15"),
                ]),
                treatments: Some(vec![
                    TreatmentPlanInput {
                        next_followup_date: Some("2024-01-01".into()),
                        ..Default::default()
                    },
                    TreatmentPlanInput {
                        related_disease: Some("Undated".into()),
                        ..Default::default()
                    },
                    TreatmentPlanInput {
                        next_followup_date: Some("2024-06-01".into()),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            })
            .unwrap();

        let record = db.get_record(created.patient_id).unwrap();
        let dates: Vec<String> = record
            .checkups
            .iter()
            .map(|c| c.date_of_checkup.to_string())
            .collect();
        assert_eq!(dates, ["2024-05-01", "2023-11-15", "2023-05-01"]);

        let followups: Vec<Option<String>> = record
            .treatments
            .iter()
            .map(|t| t.next_followup_date.map(|d| d.to_string()))
            .collect();
        assert_eq!(
            followups,
            [
                Some("2024-06-01".to_string()),
                Some("2024-01-01".to_string()),
                None
            ]
        );
    }

    #[test]
    fn test_get_unknown_record_is_not_found() {
        let db = setup_db();
        assert!(matches!(db.get_record(42), Err(RecordError::NotFound(42))));
        assert!(matches!(db.delete_record(42), Err(RecordError::NotFound(42))));
    }

    #[test]
    fn test_update_overlays_and_replaces() {
        let mut db = setup_db();
        let created = db
            .create_record(&CompleteRecordInput {
                patient: Some(patient("Before")),
                medical_history: Some(MedicalHistoryInput {
                    allergies: Some("Penicillin".into()),
                    ..Default::default()
                }),
                checkups: Some(vec![checkup("2024-01-01"), checkup("2024-02-01")]),
                notes: Some(vec![NoteInput {
                    doctor_remarks: Some("Keep".into()),
                    ..Default::default()
                }]),
                ..Default::default()
            })
            .unwrap();
        let id = created.patient_id;

        let updated = db
            .update_record(
                id,
                &CompleteRecordInput {
                    patient: Some(PatientInput {
                        patient_name: Some("After".into()),
                        ..Default::default()
                    }),
                    medical_history: Some(MedicalHistoryInput {
                        past_conditions: Some("Asthma".into()),
                        ..Default::default()
                    }),
                    checkups: Some(vec![checkup("2024-03-01")]),
                    treatments: Some(vec![TreatmentPlanInput {
                        procedures: Some("Nebulization".into()),
                        ..Default::default()
                    }]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.patient.patient_name, "After");
        assert_eq!(updated.patient.age, 52);
        let history = updated.medical_history.unwrap();
        assert_eq!(history.allergies.as_deref(), Some("Penicillin"));
        assert_eq!(history.past_conditions.as_deref(), Some("Asthma"));
        assert_eq!(updated.checkups.len(), 1);
        assert_eq!(updated.treatments[0].checkup, Some(updated.checkups[0].id));
        assert_eq!(updated.notes.len(), 1);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let mut db = setup_db();
        let err = db
            .update_record(7, &CompleteRecordInput::default())
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound(7)));
    }

    #[test]
    fn test_list_overviews_counts() {
        let mut db = setup_db();
        db.create_record(&CompleteRecordInput {
            patient: Some(patient("Counted")),
            checkups: Some(vec![checkup("2024-01-01"), checkup("2024-03-01")]),
            lab_tests: Some(vec![LabTestsInput {
                lab_results: Some("CBC normal".into()),
                ..Default::default()
            }]),
            ..Default::default()
        })
        .unwrap();

        let overviews = db.list_overviews().unwrap();
        assert_eq!(overviews.len(), 1);
        let o = &overviews[0];
        assert_eq!(o.checkups_count, 2);
        assert_eq!(o.lab_tests_count, 1);
        assert_eq!(o.treatments_count, 0);
        assert_eq!(o.last_checkup_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_delete_cascades() {
        let mut db = setup_db();
        let created = db
            .create_record(&CompleteRecordInput {
                patient: Some(patient("Gone")),
                checkups: Some(vec![checkup("2024-01-01")]),
                ..Default::default()
            })
            .unwrap();
        db.delete_record(created.patient_id).unwrap();

        let checkups: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM checkups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(checkups, 0);
    }
}
