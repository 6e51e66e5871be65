//! Patient database operations.
//!
//! Row functions take a `&Connection` so they can run either directly or
//! inside a transaction (`Transaction` derefs to `Connection`).

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{NewPatient, Patient};

const PATIENT_COLUMNS: &str = r#"
    id, patient_name, guardian_name, age, gender, blood_group,
    date_of_birth, phone_number, email_address, address, created_at, updated_at
"#;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        guardian_name: row.get(2)?,
        age: row.get(3)?,
        gender: row.get(4)?,
        blood_group: row.get(5)?,
        date_of_birth: row.get(6)?,
        phone_number: row.get(7)?,
        email_address: row.get(8)?,
        address: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Insert a new patient, returning its row ID.
pub(crate) fn insert_patient(conn: &Connection, patient: &NewPatient) -> DbResult<i64> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        r#"
        INSERT INTO patients (
            patient_name, guardian_name, age, gender, blood_group, date_of_birth,
            phone_number, email_address, address, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
        "#,
        params![
            patient.patient_name,
            patient.guardian_name,
            patient.age,
            patient.gender,
            patient.blood_group,
            patient.date_of_birth,
            patient.phone_number,
            patient.email_address,
            patient.address,
            now,
        ],
    )
    .map_err(DbError::classify)?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite every column of an existing patient.
pub(crate) fn update_patient(conn: &Connection, id: i64, patient: &NewPatient) -> DbResult<bool> {
    let rows_affected = conn
        .execute(
            r#"
            UPDATE patients SET
                patient_name = ?2,
                guardian_name = ?3,
                age = ?4,
                gender = ?5,
                blood_group = ?6,
                date_of_birth = ?7,
                phone_number = ?8,
                email_address = ?9,
                address = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
            params![
                id,
                patient.patient_name,
                patient.guardian_name,
                patient.age,
                patient.gender,
                patient.blood_group,
                patient.date_of_birth,
                patient.phone_number,
                patient.email_address,
                patient.address,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(DbError::classify)?;
    Ok(rows_affected > 0)
}

pub(crate) fn get_patient(conn: &Connection, id: i64) -> DbResult<Option<Patient>> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
        [id],
        patient_from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Find which patient (if any) already holds a phone number or email.
pub(crate) fn find_patient_with(
    conn: &Connection,
    column: ContactColumn,
    value: &str,
) -> DbResult<Option<i64>> {
    let sql = match column {
        ContactColumn::Phone => "SELECT id FROM patients WHERE phone_number = ?",
        ContactColumn::Email => "SELECT id FROM patients WHERE email_address = ?",
    };
    conn.query_row(sql, [value], |row| row.get(0))
        .optional()
        .map_err(Into::into)
}

/// Unique contact columns on the patients table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContactColumn {
    Phone,
    Email,
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Database {
    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        get_patient(&self.conn, id)
    }

    /// List all patients, newest first.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id DESC"))?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search patients by name (prefix match). `%` and `_` in the query
    /// match literally.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", escape_like(query));
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {PATIENT_COLUMNS}
            FROM patients
            WHERE patient_name LIKE ? ESCAPE '\'
            ORDER BY patient_name
            LIMIT ?
            "#
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient; child rows go with it via ON DELETE CASCADE.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
