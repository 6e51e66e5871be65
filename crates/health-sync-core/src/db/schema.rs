//! SQLite schema definition.

/// Complete database schema for health-sync.
pub const SCHEMA: &str = r#"
-- Enable foreign keys (required for cascade deletes)
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_name TEXT NOT NULL,
    guardian_name TEXT,
    age INTEGER NOT NULL CHECK (age >= 0 AND age <= 150),
    gender TEXT NOT NULL CHECK (gender IN ('Male', 'Female', 'Other')),
    blood_group TEXT NOT NULL
        CHECK (blood_group IN ('A+', 'A-', 'B+', 'B-', 'AB+', 'AB-', 'O+', 'O-')),
    date_of_birth TEXT NOT NULL,                 -- YYYY-MM-DD
    phone_number TEXT UNIQUE,                    -- NULLs never collide
    email_address TEXT UNIQUE,
    address TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(patient_name);

-- ============================================================================
-- Medical History (zero-or-one per patient)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL UNIQUE REFERENCES patients(id) ON DELETE CASCADE,
    past_conditions TEXT,
    family_history TEXT,
    previous_surgeries TEXT,
    allergies TEXT
);

-- ============================================================================
-- Checkups
-- ============================================================================

CREATE TABLE IF NOT EXISTS checkups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date_of_checkup TEXT NOT NULL,               -- YYYY-MM-DD
    symptoms TEXT,
    current_diagnosis TEXT,
    blood_pressure TEXT,
    heart_rate TEXT,
    temperature TEXT,
    weight TEXT,
    height TEXT,
    bmi TEXT,
    physical_exam_findings TEXT
);

CREATE INDEX IF NOT EXISTS idx_checkups_patient ON checkups(patient_id, date_of_checkup);

-- ============================================================================
-- Lab Tests
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_tests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    lab_results TEXT,
    imaging TEXT,
    other_tests TEXT
);

CREATE INDEX IF NOT EXISTS idx_lab_tests_patient ON lab_tests(patient_id);

-- ============================================================================
-- Treatment Plans
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatment_plans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    checkup_id INTEGER REFERENCES checkups(id) ON DELETE SET NULL,
    related_disease TEXT,
    assigned_doctor TEXT,
    prescribed_medications TEXT,
    procedures TEXT,
    next_followup_date TEXT,                     -- YYYY-MM-DD or NULL
    lifestyle_recommendations TEXT,
    physiotherapy_advice TEXT
);

CREATE INDEX IF NOT EXISTS idx_treatments_patient ON treatment_plans(patient_id);

-- ============================================================================
-- Additional Notes
-- ============================================================================

CREATE TABLE IF NOT EXISTS additional_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_remarks TEXT,
    special_warnings TEXT
);

CREATE INDEX IF NOT EXISTS idx_notes_patient ON additional_notes(patient_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_gender_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO patients (patient_name, age, gender, blood_group, date_of_birth)
             VALUES ('Ali', 30, 'Robot', 'O+', '1994-01-01')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO patients (patient_name, age, gender, blood_group, date_of_birth)
             VALUES ('Ali', 30, 'Male', 'O+', '1994-01-01')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_unique_phone_allows_many_nulls() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        for name in ["A", "B"] {
            conn.execute(
                "INSERT INTO patients (patient_name, age, gender, blood_group, date_of_birth)
                 VALUES (?1, 1, 'Other', 'O+', '2000-01-01')",
                [name],
            )
            .unwrap();
        }

        conn.execute(
            "UPDATE patients SET phone_number = '+100' WHERE patient_name = 'A'",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "UPDATE patients SET phone_number = '+100' WHERE patient_name = 'B'",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_cascade_delete() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (patient_name, age, gender, blood_group, date_of_birth)
             VALUES ('Ali', 30, 'Male', 'O+', '1994-01-01')",
            [],
        )
        .unwrap();
        let patient_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO checkups (patient_id, date_of_checkup) VALUES (?1, '2024-01-01')",
            [patient_id],
        )
        .unwrap();

        conn.execute("DELETE FROM patients WHERE id = ?1", [patient_id])
            .unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM checkups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
