//! Patient models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Administrative gender as stored on the patient row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

/// Error for a string that names no known choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChoice(pub String);

impl fmt::Display for InvalidChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" is not a valid choice.", self.0)
    }
}

impl std::error::Error for InvalidChoice {}

impl FromStr for Gender {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s.trim())
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

impl FromStr for BloodGroup {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodGroup::ALL
            .into_iter()
            .find(|b| b.as_str() == s.trim())
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! text_choice_sql {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_choice_sql!(Gender);
text_choice_sql!(BloodGroup);

/// A stored patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Row ID
    pub id: i64,
    pub patient_name: String,
    pub guardian_name: Option<String>,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: BloodGroup,
    pub date_of_birth: NaiveDate,
    /// Unique across patients when present
    pub phone_number: Option<String>,
    /// Unique across patients when present
    pub email_address: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A validated patient ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub patient_name: String,
    pub guardian_name: Option<String>,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: BloodGroup,
    pub date_of_birth: NaiveDate,
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub address: Option<String>,
}

/// A patient row plus counts of its child collections (list view).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientOverview {
    #[serde(flatten)]
    pub patient: Patient,
    pub medical_history_count: u32,
    pub checkups_count: u32,
    pub lab_tests_count: u32,
    pub treatments_count: u32,
    pub notes_count: u32,
    pub last_checkup_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" Other ".parse::<Gender>().unwrap(), Gender::Other);
        assert!("male".parse::<Gender>().is_err());
    }

    #[test]
    fn test_blood_group_roundtrip_strings() {
        for group in BloodGroup::ALL {
            assert_eq!(group.as_str().parse::<BloodGroup>().unwrap(), group);
        }
        assert!("C+".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn test_blood_group_serde_uses_symbol() {
        let json = serde_json::to_string(&BloodGroup::AbNegative).unwrap();
        assert_eq!(json, "\"AB-\"");
    }

    #[test]
    fn test_invalid_choice_message() {
        let err = "Robot".parse::<Gender>().unwrap_err();
        assert_eq!(err.to_string(), "\"Robot\" is not a valid choice.");
    }
}
