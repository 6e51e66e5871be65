//! Child-record database operations (history, checkups, labs, treatments, notes).

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::{DbError, DbResult};
use crate::models::{
    AdditionalNote, CheckUp, LabTests, LabTestsInput, MedicalHistory, MedicalHistoryInput,
    NewCheckUp, NewTreatmentPlan, NoteInput, TreatmentPlan,
};

/// Child collections that are replaced wholesale on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildCollection {
    CheckUps,
    LabTests,
    Treatments,
    Notes,
}

impl ChildCollection {
    fn table(&self) -> &'static str {
        match self {
            ChildCollection::CheckUps => "checkups",
            ChildCollection::LabTests => "lab_tests",
            ChildCollection::Treatments => "treatment_plans",
            ChildCollection::Notes => "additional_notes",
        }
    }
}

// =========================================================================
// Medical history
// =========================================================================

/// Insert or replace the single history row for a patient.
pub(crate) fn upsert_medical_history(
    conn: &Connection,
    patient_id: i64,
    history: &MedicalHistoryInput,
) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO medical_history (
            patient_id, past_conditions, family_history, previous_surgeries, allergies
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(patient_id) DO UPDATE SET
            past_conditions = excluded.past_conditions,
            family_history = excluded.family_history,
            previous_surgeries = excluded.previous_surgeries,
            allergies = excluded.allergies
        "#,
        params![
            patient_id,
            history.past_conditions,
            history.family_history,
            history.previous_surgeries,
            history.allergies,
        ],
    )
    .map_err(DbError::classify)?;

    conn.query_row(
        "SELECT id FROM medical_history WHERE patient_id = ?",
        [patient_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub(crate) fn get_medical_history(
    conn: &Connection,
    patient_id: i64,
) -> DbResult<Option<MedicalHistory>> {
    conn.query_row(
        r#"
        SELECT h.id, h.patient_id, p.patient_name, h.past_conditions,
               h.family_history, h.previous_surgeries, h.allergies
        FROM medical_history h
        JOIN patients p ON p.id = h.patient_id
        WHERE h.patient_id = ?
        "#,
        [patient_id],
        |row| {
            Ok(MedicalHistory {
                id: row.get(0)?,
                patient: row.get(1)?,
                patient_name: row.get(2)?,
                past_conditions: row.get(3)?,
                family_history: row.get(4)?,
                previous_surgeries: row.get(5)?,
                allergies: row.get(6)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

// =========================================================================
// Checkups
// =========================================================================

pub(crate) fn insert_checkup(
    conn: &Connection,
    patient_id: i64,
    checkup: &NewCheckUp,
) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO checkups (
            patient_id, date_of_checkup, symptoms, current_diagnosis,
            blood_pressure, heart_rate, temperature, weight, height, bmi,
            physical_exam_findings
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            patient_id,
            checkup.date_of_checkup,
            checkup.symptoms,
            checkup.current_diagnosis,
            checkup.blood_pressure,
            checkup.heart_rate,
            checkup.temperature,
            checkup.weight,
            checkup.height,
            checkup.bmi,
            checkup.physical_exam_findings,
        ],
    )
    .map_err(DbError::classify)?;
    Ok(conn.last_insert_rowid())
}

/// Checkups for a patient, most recent first.
pub(crate) fn list_checkups(conn: &Connection, patient_id: i64) -> DbResult<Vec<CheckUp>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT c.id, c.patient_id, p.patient_name, c.date_of_checkup, c.symptoms,
               c.current_diagnosis, c.blood_pressure, c.heart_rate, c.temperature,
               c.weight, c.height, c.bmi, c.physical_exam_findings
        FROM checkups c
        JOIN patients p ON p.id = c.patient_id
        WHERE c.patient_id = ?
        ORDER BY c.date_of_checkup DESC, c.id DESC
        "#,
    )?;

    let rows = stmt.query_map([patient_id], |row| {
        Ok(CheckUp {
            id: row.get(0)?,
            patient: row.get(1)?,
            patient_name: row.get(2)?,
            date_of_checkup: row.get(3)?,
            symptoms: row.get(4)?,
            current_diagnosis: row.get(5)?,
            blood_pressure: row.get(6)?,
            heart_rate: row.get(7)?,
            temperature: row.get(8)?,
            weight: row.get(9)?,
            height: row.get(10)?,
            bmi: row.get(11)?,
            physical_exam_findings: row.get(12)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Whether `checkup_id` is a checkup of `patient_id`.
pub(crate) fn checkup_belongs_to(
    conn: &Connection,
    checkup_id: i64,
    patient_id: i64,
) -> DbResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM checkups WHERE id = ?1 AND patient_id = ?2",
            [checkup_id, patient_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// =========================================================================
// Lab tests
// =========================================================================

pub(crate) fn insert_lab_tests(
    conn: &Connection,
    patient_id: i64,
    lab: &LabTestsInput,
) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO lab_tests (patient_id, lab_results, imaging, other_tests)
         VALUES (?1, ?2, ?3, ?4)",
        params![patient_id, lab.lab_results, lab.imaging, lab.other_tests],
    )
    .map_err(DbError::classify)?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn list_lab_tests(conn: &Connection, patient_id: i64) -> DbResult<Vec<LabTests>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT l.id, l.patient_id, p.patient_name, l.lab_results, l.imaging, l.other_tests
        FROM lab_tests l
        JOIN patients p ON p.id = l.patient_id
        WHERE l.patient_id = ?
        ORDER BY l.id
        "#,
    )?;

    let rows = stmt.query_map([patient_id], |row| {
        Ok(LabTests {
            id: row.get(0)?,
            patient: row.get(1)?,
            patient_name: row.get(2)?,
            lab_results: row.get(3)?,
            imaging: row.get(4)?,
            other_tests: row.get(5)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// =========================================================================
// Treatment plans
// =========================================================================

pub(crate) fn insert_treatment(
    conn: &Connection,
    patient_id: i64,
    treatment: &NewTreatmentPlan,
) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO treatment_plans (
            patient_id, checkup_id, related_disease, assigned_doctor,
            prescribed_medications, procedures, next_followup_date,
            lifestyle_recommendations, physiotherapy_advice
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            patient_id,
            treatment.checkup,
            treatment.related_disease,
            treatment.assigned_doctor,
            treatment.prescribed_medications,
            treatment.procedures,
            treatment.next_followup_date,
            treatment.lifestyle_recommendations,
            treatment.physiotherapy_advice,
        ],
    )
    .map_err(DbError::classify)?;
    Ok(conn.last_insert_rowid())
}

/// Treatments for a patient by follow-up date, latest first; undated last.
pub(crate) fn list_treatments(conn: &Connection, patient_id: i64) -> DbResult<Vec<TreatmentPlan>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.id, t.patient_id, p.patient_name, t.checkup_id, c.date_of_checkup,
               t.related_disease, t.assigned_doctor, t.prescribed_medications,
               t.procedures, t.next_followup_date, t.lifestyle_recommendations,
               t.physiotherapy_advice
        FROM treatment_plans t
        JOIN patients p ON p.id = t.patient_id
        LEFT JOIN checkups c ON c.id = t.checkup_id
        WHERE t.patient_id = ?
        ORDER BY t.next_followup_date IS NULL, t.next_followup_date DESC, t.id DESC
        "#,
    )?;

    let rows = stmt.query_map([patient_id], |row| {
        Ok(TreatmentPlan {
            id: row.get(0)?,
            patient: row.get(1)?,
            patient_name: row.get(2)?,
            checkup: row.get(3)?,
            checkup_date: row.get(4)?,
            related_disease: row.get(5)?,
            assigned_doctor: row.get(6)?,
            prescribed_medications: row.get(7)?,
            procedures: row.get(8)?,
            next_followup_date: row.get(9)?,
            lifestyle_recommendations: row.get(10)?,
            physiotherapy_advice: row.get(11)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// =========================================================================
// Notes
// =========================================================================

pub(crate) fn insert_note(conn: &Connection, patient_id: i64, note: &NoteInput) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO additional_notes (patient_id, doctor_remarks, special_warnings)
         VALUES (?1, ?2, ?3)",
        params![patient_id, note.doctor_remarks, note.special_warnings],
    )
    .map_err(DbError::classify)?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn list_notes(conn: &Connection, patient_id: i64) -> DbResult<Vec<AdditionalNote>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT n.id, n.patient_id, p.patient_name, n.doctor_remarks, n.special_warnings
        FROM additional_notes n
        JOIN patients p ON p.id = n.patient_id
        WHERE n.patient_id = ?
        ORDER BY n.id
        "#,
    )?;

    let rows = stmt.query_map([patient_id], |row| {
        Ok(AdditionalNote {
            id: row.get(0)?,
            patient: row.get(1)?,
            patient_name: row.get(2)?,
            doctor_remarks: row.get(3)?,
            special_warnings: row.get(4)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// =========================================================================
// Collection-wide helpers
// =========================================================================

/// Remove every row of one child collection for a patient.
pub(crate) fn delete_children(
    conn: &Connection,
    patient_id: i64,
    collection: ChildCollection,
) -> DbResult<usize> {
    let sql = format!("DELETE FROM {} WHERE patient_id = ?", collection.table());
    Ok(conn.execute(&sql, [patient_id])?)
}

/// Per-collection row counts for one patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ChildCounts {
    pub medical_history: u32,
    pub checkups: u32,
    pub lab_tests: u32,
    pub treatments: u32,
    pub notes: u32,
}

pub(crate) fn count_children(conn: &Connection, patient_id: i64) -> DbResult<ChildCounts> {
    conn.query_row(
        r#"
        SELECT
            (SELECT COUNT(*) FROM medical_history WHERE patient_id = ?1),
            (SELECT COUNT(*) FROM checkups WHERE patient_id = ?1),
            (SELECT COUNT(*) FROM lab_tests WHERE patient_id = ?1),
            (SELECT COUNT(*) FROM treatment_plans WHERE patient_id = ?1),
            (SELECT COUNT(*) FROM additional_notes WHERE patient_id = ?1)
        "#,
        [patient_id],
        |row| {
            Ok(ChildCounts {
                medical_history: row.get(0)?,
                checkups: row.get(1)?,
                lab_tests: row.get(2)?,
                treatments: row.get(3)?,
                notes: row.get(4)?,
            })
        },
    )
    .map_err(Into::into)
}

pub(crate) fn last_checkup_date(conn: &Connection, patient_id: i64) -> DbResult<Option<NaiveDate>> {
    conn.query_row(
        "SELECT MAX(date_of_checkup) FROM checkups WHERE patient_id = ?",
        [patient_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
