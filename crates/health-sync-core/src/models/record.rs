//! Complete patient record: the request and response documents.

use serde::{Deserialize, Serialize};

use super::clinical::{AdditionalNote, CheckUp, LabTests, MedicalHistory, TreatmentPlan};
use super::lenient;
use super::patient::Patient;

/// A patient and all of its child collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteRecord {
    pub patient: Patient,
    pub medical_history: Option<MedicalHistory>,
    pub checkups: Vec<CheckUp>,
    pub lab_tests: Vec<LabTests>,
    pub treatments: Vec<TreatmentPlan>,
    pub notes: Vec<AdditionalNote>,
}

/// Result of a successful create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedRecord {
    /// Always "created"
    pub status: String,
    pub patient_id: i64,
    pub record: CompleteRecord,
}

impl CreatedRecord {
    pub fn new(record: CompleteRecord) -> Self {
        Self {
            status: "created".into(),
            patient_id: record.patient.id,
            record,
        }
    }
}

// =========================================================================
// Write-side input documents
// =========================================================================

/// Patient fields as they arrive over the wire. Every field is optional so
/// that partial updates and normalization output share one shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientInput {
    #[serde(deserialize_with = "lenient::text")]
    pub patient_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub guardian_name: Option<String>,
    #[serde(deserialize_with = "lenient::integer")]
    pub age: Option<i64>,
    #[serde(deserialize_with = "lenient::text")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub blood_group: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub phone_number: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub email_address: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub address: Option<String>,
}

impl PatientInput {
    /// Overlay `other` on top of `self`: fields present in `other` win.
    pub fn merged_with(self, other: PatientInput) -> PatientInput {
        PatientInput {
            patient_name: other.patient_name.or(self.patient_name),
            guardian_name: other.guardian_name.or(self.guardian_name),
            age: other.age.or(self.age),
            gender: other.gender.or(self.gender),
            blood_group: other.blood_group.or(self.blood_group),
            date_of_birth: other.date_of_birth.or(self.date_of_birth),
            phone_number: other.phone_number.or(self.phone_number),
            email_address: other.email_address.or(self.email_address),
            address: other.address.or(self.address),
        }
    }
}

impl From<&Patient> for PatientInput {
    fn from(p: &Patient) -> Self {
        Self {
            patient_name: Some(p.patient_name.clone()),
            guardian_name: p.guardian_name.clone(),
            age: Some(i64::from(p.age)),
            gender: Some(p.gender.to_string()),
            blood_group: Some(p.blood_group.to_string()),
            date_of_birth: Some(p.date_of_birth.format("%Y-%m-%d").to_string()),
            phone_number: p.phone_number.clone(),
            email_address: p.email_address.clone(),
            address: p.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MedicalHistoryInput {
    #[serde(deserialize_with = "lenient::text")]
    pub past_conditions: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub family_history: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub previous_surgeries: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub allergies: Option<String>,
}

impl MedicalHistoryInput {
    pub fn merged_with(self, other: MedicalHistoryInput) -> MedicalHistoryInput {
        MedicalHistoryInput {
            past_conditions: other.past_conditions.or(self.past_conditions),
            family_history: other.family_history.or(self.family_history),
            previous_surgeries: other.previous_surgeries.or(self.previous_surgeries),
            allergies: other.allergies.or(self.allergies),
        }
    }
}

impl From<&MedicalHistory> for MedicalHistoryInput {
    fn from(h: &MedicalHistory) -> Self {
        Self {
            past_conditions: h.past_conditions.clone(),
            family_history: h.family_history.clone(),
            previous_surgeries: h.previous_surgeries.clone(),
            allergies: h.allergies.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckUpInput {
    #[serde(deserialize_with = "lenient::text")]
    pub date_of_checkup: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub symptoms: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub current_diagnosis: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub blood_pressure: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub heart_rate: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub temperature: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub weight: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub height: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub bmi: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub physical_exam_findings: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabTestsInput {
    #[serde(deserialize_with = "lenient::text")]
    pub lab_results: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub imaging: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub other_tests: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreatmentPlanInput {
    /// Explicit checkup reference. When the key is absent the first checkup
    /// created in the same request is linked; an explicit `null` links none.
    #[serde(
        deserialize_with = "lenient::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub checkup: Option<Option<i64>>,
    #[serde(deserialize_with = "lenient::text")]
    pub related_disease: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub assigned_doctor: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub prescribed_medications: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub procedures: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub next_followup_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub lifestyle_recommendations: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub physiotherapy_advice: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoteInput {
    #[serde(deserialize_with = "lenient::text")]
    pub doctor_remarks: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub special_warnings: Option<String>,
}

/// The "complete patient record" write document.
///
/// Collections accept either a list or a single object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompleteRecordInput {
    pub patient: Option<PatientInput>,
    pub medical_history: Option<MedicalHistoryInput>,
    #[serde(deserialize_with = "lenient::one_or_many")]
    pub checkups: Option<Vec<CheckUpInput>>,
    #[serde(deserialize_with = "lenient::one_or_many")]
    pub lab_tests: Option<Vec<LabTestsInput>>,
    #[serde(deserialize_with = "lenient::one_or_many")]
    pub treatments: Option<Vec<TreatmentPlanInput>>,
    #[serde(deserialize_with = "lenient::one_or_many")]
    pub notes: Option<Vec<NoteInput>>,
}

/// Sub-records whose every field is absent are skipped on write.
pub trait IsBlank {
    fn is_blank(&self) -> bool;
}

macro_rules! blank_when_default {
    ($($ty:ty),*) => {
        $(impl IsBlank for $ty {
            fn is_blank(&self) -> bool {
                *self == <$ty>::default()
            }
        })*
    };
}

blank_when_default!(
    PatientInput,
    MedicalHistoryInput,
    CheckUpInput,
    LabTestsInput,
    TreatmentPlanInput,
    NoteInput
);
