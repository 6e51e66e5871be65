//! Clinical child records owned by a patient.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Background history (zero-or-one per patient).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalHistory {
    pub id: i64,
    /// Owning patient ID
    pub patient: i64,
    pub patient_name: String,
    pub past_conditions: Option<String>,
    pub family_history: Option<String>,
    pub previous_surgeries: Option<String>,
    pub allergies: Option<String>,
}

/// One dated clinical encounter.
///
/// Vitals are display strings ("120/80", "70 kg") rather than numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckUp {
    pub id: i64,
    pub patient: i64,
    pub patient_name: String,
    pub date_of_checkup: NaiveDate,
    pub symptoms: Option<String>,
    pub current_diagnosis: Option<String>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<String>,
    pub temperature: Option<String>,
    pub weight: Option<String>,
    pub height: Option<String>,
    pub bmi: Option<String>,
    pub physical_exam_findings: Option<String>,
}

/// Lab, imaging and other test results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabTests {
    pub id: i64,
    pub patient: i64,
    pub patient_name: String,
    pub lab_results: Option<String>,
    pub imaging: Option<String>,
    pub other_tests: Option<String>,
}

/// A treatment plan, optionally tied to the checkup it came out of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentPlan {
    pub id: i64,
    pub patient: i64,
    pub patient_name: String,
    /// Linked checkup ID
    pub checkup: Option<i64>,
    /// Date of the linked checkup
    pub checkup_date: Option<NaiveDate>,
    pub related_disease: Option<String>,
    pub assigned_doctor: Option<String>,
    pub prescribed_medications: Option<String>,
    pub procedures: Option<String>,
    pub next_followup_date: Option<NaiveDate>,
    pub lifestyle_recommendations: Option<String>,
    pub physiotherapy_advice: Option<String>,
}

/// Doctor remarks and warnings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdditionalNote {
    pub id: i64,
    pub patient: i64,
    pub patient_name: String,
    pub doctor_remarks: Option<String>,
    pub special_warnings: Option<String>,
}

/// A validated checkup ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckUp {
    pub date_of_checkup: NaiveDate,
    pub symptoms: Option<String>,
    pub current_diagnosis: Option<String>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<String>,
    pub temperature: Option<String>,
    pub weight: Option<String>,
    pub height: Option<String>,
    pub bmi: Option<String>,
    pub physical_exam_findings: Option<String>,
}

/// A validated treatment plan ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTreatmentPlan {
    pub checkup: Option<i64>,
    pub related_disease: Option<String>,
    pub assigned_doctor: Option<String>,
    pub prescribed_medications: Option<String>,
    pub procedures: Option<String>,
    pub next_followup_date: Option<NaiveDate>,
    pub lifestyle_recommendations: Option<String>,
    pub physiotherapy_advice: Option<String>,
}
