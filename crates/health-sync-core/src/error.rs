//! Errors surfaced by the record store.

use std::fmt;

use thiserror::Error;

use crate::db::DbError;
use crate::validation::FieldErrors;

/// Which part of a complete record failed validation. List sections carry
/// the index of the offending item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSection {
    Patient,
    MedicalHistory,
    CheckUp(usize),
    LabTests(usize),
    Treatment(usize),
    Note(usize),
}

impl RecordSection {
    /// Headline used in API error payloads.
    pub fn message(&self) -> &'static str {
        match self {
            RecordSection::Patient => "Patient data validation failed",
            RecordSection::MedicalHistory => "Medical history validation failed",
            RecordSection::CheckUp(_) => "Checkup data validation failed",
            RecordSection::LabTests(_) => "Lab tests validation failed",
            RecordSection::Treatment(_) => "Treatment plan validation failed",
            RecordSection::Note(_) => "Notes validation failed",
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            RecordSection::Patient | RecordSection::MedicalHistory => None,
            RecordSection::CheckUp(i)
            | RecordSection::LabTests(i)
            | RecordSection::Treatment(i)
            | RecordSection::Note(i) => Some(*i),
        }
    }
}

impl fmt::Display for RecordSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(i) => write!(f, "{} (item {})", self.message(), i),
            None => f.write_str(self.message()),
        }
    }
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("{section}")]
    Validation {
        section: RecordSection,
        errors: FieldErrors,
    },

    #[error("Patient not found: {0}")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl RecordError {
    pub fn validation(section: RecordSection, errors: FieldErrors) -> Self {
        RecordError::Validation { section, errors }
    }
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Database(DbError::classify(e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for RecordError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RecordError::LockPoisoned(e.to_string())
    }
}

pub type RecordResult<T> = Result<T, RecordError>;
