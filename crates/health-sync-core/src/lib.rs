//! Health-Sync Core Library
//!
//! Patient-record storage with a normalization front door for loosely
//! shaped (typically model-generated) JSON.
//!
//! # Architecture
//!
//! ```text
//!   arbitrary JSON ──▶ Normalizer ──┐
//!                                   ▼
//!   CompleteRecordInput ──▶ validation ──▶ one SQLite transaction
//!                                                  │
//!        ┌──────────┬───────────┬────────┬─────────┼──────────┐
//!        ▼          ▼           ▼        ▼         ▼          ▼
//!     patient   history    checkups  lab_tests treatments   notes
//!                                                  │
//!                                  get_record ◀────┘ (assembled, date-ordered)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, CheckUp, CompleteRecord, etc.)
//! - [`normalize`]: Arbitrary JSON to complete-record input
//! - [`validation`]: Field-level checks applied before writing

pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod validation;

// Re-export commonly used types
pub use db::{Database, DbError};
pub use error::{RecordError, RecordResult, RecordSection};
pub use models::{
    BloodGroup, CompleteRecord, CompleteRecordInput, CreatedRecord, Gender, Patient,
    PatientOverview,
};
pub use normalize::{ContactPolicy, NormalizationReport, Normalizer};
pub use validation::FieldErrors;

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::info;

/// Thread-safe handle to the record database.
///
/// Cloning shares the same connection. Calls block; async callers should
/// run them on a blocking thread.
#[derive(Clone)]
pub struct RecordStore {
    db: Arc<Mutex<Database>>,
}

impl RecordStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> RecordResult<Self> {
        let db = Database::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened record database");
        Ok(Self::from_database(db))
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> RecordResult<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    // =========================================================================
    // Complete-record operations
    // =========================================================================

    pub fn create_record(&self, input: &CompleteRecordInput) -> RecordResult<CreatedRecord> {
        let mut db = self.db.lock()?;
        db.create_record(input)
    }

    pub fn get_record(&self, id: i64) -> RecordResult<CompleteRecord> {
        let db = self.db.lock()?;
        db.get_record(id)
    }

    pub fn update_record(
        &self,
        id: i64,
        input: &CompleteRecordInput,
    ) -> RecordResult<CompleteRecord> {
        let mut db = self.db.lock()?;
        db.update_record(id, input)
    }

    /// Delete a patient and everything it owns.
    pub fn delete_patient(&self, id: i64) -> RecordResult<()> {
        let db = self.db.lock()?;
        db.delete_record(id)
    }

    /// Every patient with child counts, newest first.
    pub fn list_patients(&self) -> RecordResult<Vec<PatientOverview>> {
        let db = self.db.lock()?;
        db.list_overviews()
    }

    /// Search patients by name prefix.
    pub fn search_patients(&self, query: &str, limit: usize) -> RecordResult<Vec<Patient>> {
        let db = self.db.lock()?;
        Ok(db.search_patients(query, limit)?)
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Normalize an arbitrary document and store it as a new record.
    pub fn ingest(
        &self,
        document: &serde_json::Value,
        normalizer: &Normalizer,
    ) -> RecordResult<(CreatedRecord, Vec<String>)> {
        let NormalizationReport { record, repaired } = normalizer.normalize(document);
        let created = self.create_record(&record)?;
        info!(
            patient_id = created.patient_id,
            repaired = repaired.len(),
            "Ingested normalized record"
        );
        Ok((created, repaired))
    }
}
