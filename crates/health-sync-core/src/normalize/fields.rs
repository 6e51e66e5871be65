//! Field tables: where each stored field may be found in loosely shaped
//! input, and how it is coerced.
//!
//! Sources are tried in order and the first non-empty one wins. Dotted
//! sources walk nested objects.

/// How a raw value becomes a stored field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coercion {
    /// Display text, falling back to the given default. An empty default
    /// leaves the field unset.
    Text(&'static str),
    /// Like `Text`, truncated to at most this many characters.
    BoundedText(&'static str, usize),
    /// Whole years, clamped to the valid age range.
    Age,
    Gender,
    BloodGroup,
    /// Date with a fixed `YYYY-MM-DD` fallback.
    Date(&'static str),
    /// Date falling back to the normalizer's fallback date.
    DateOrFallback,
    /// Date that is dropped when missing or unparseable.
    OptionalDate,
    Phone,
    Email,
    /// Supplied BMI, else computed from weight and height.
    Bmi,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub sources: &'static [&'static str],
    pub coercion: Coercion,
}

const fn field(
    name: &'static str,
    sources: &'static [&'static str],
    coercion: Coercion,
) -> FieldSpec {
    FieldSpec {
        name,
        sources,
        coercion,
    }
}

// Section locations in the input document.
pub const PATIENT_KEYS: &[&str] = &["patient", "patient_info", "patient_details"];
pub const HISTORY_KEYS: &[&str] = &["medical_history", "history"];
pub const CHECKUP_KEYS: &[&str] = &["checkups", "checkup", "visits"];
pub const LAB_TEST_KEYS: &[&str] = &["lab_tests", "lab_test", "labs"];
pub const TREATMENT_KEYS: &[&str] = &["treatments", "treatment", "treatment_plans", "treatment_plan"];
pub const NOTE_KEYS: &[&str] = &["notes", "additional_notes"];

pub const WEIGHT_SOURCES: &[&str] = &["vitals.weight", "weight"];
pub const HEIGHT_SOURCES: &[&str] = &["vitals.height", "height"];

pub const DEFAULT_BMI: &str = "24.2";

pub const NAME_MAX: usize = 100;
pub const VITAL_MAX: usize = 50;

pub const PATIENT_FIELDS: &[FieldSpec] = &[
    field(
        "patient_name",
        &["patient_name", "name", "full_name"],
        Coercion::BoundedText("Unknown Patient", NAME_MAX),
    ),
    field(
        "guardian_name",
        &["guardian_name", "guardian", "father_name", "parent_name"],
        Coercion::BoundedText("Unknown Guardian", NAME_MAX),
    ),
    field("age", &["age"], Coercion::Age),
    field("gender", &["gender", "sex"], Coercion::Gender),
    field(
        "blood_group",
        &["blood_group", "blood_type", "bloodgroup"],
        Coercion::BloodGroup,
    ),
    field(
        "date_of_birth",
        &["date_of_birth", "dob", "birth_date"],
        Coercion::Date("2000-01-01"),
    ),
    field(
        "phone_number",
        &["phone_number", "phone", "contact_number", "mobile"],
        Coercion::Phone,
    ),
    field("email_address", &["email_address", "email"], Coercion::Email),
    field("address", &["address"], Coercion::Text("")),
];

pub const MEDICAL_HISTORY_FIELDS: &[FieldSpec] = &[
    field(
        "past_conditions",
        &["past_conditions", "conditions", "medical_conditions", "chronic_conditions"],
        Coercion::Text("No significant past conditions"),
    ),
    field(
        "family_history",
        &["family_history"],
        Coercion::Text("No significant family history"),
    ),
    field(
        "previous_surgeries",
        &["previous_surgeries", "surgeries", "surgical_history"],
        Coercion::Text("No previous surgeries"),
    ),
    field(
        "allergies",
        &["allergies", "allergy"],
        Coercion::Text("No known allergies"),
    ),
];

pub const CHECKUP_FIELDS: &[FieldSpec] = &[
    field(
        "date_of_checkup",
        &["date_of_checkup", "checkup_date", "visit_date", "date"],
        Coercion::DateOrFallback,
    ),
    field(
        "symptoms",
        &["symptoms", "chief_complaint", "complaints"],
        Coercion::Text("General checkup"),
    ),
    field(
        "current_diagnosis",
        &["current_diagnosis", "diagnosis"],
        Coercion::Text("Routine examination"),
    ),
    field(
        "blood_pressure",
        &["vitals.blood_pressure", "vitals.bp", "blood_pressure", "bp"],
        Coercion::BoundedText("120/80", VITAL_MAX),
    ),
    field(
        "heart_rate",
        &[
            "vitals.pulse_rate",
            "vitals.heart_rate",
            "heart_rate",
            "pulse_rate",
            "pulse",
        ],
        Coercion::BoundedText("72", VITAL_MAX),
    ),
    field(
        "temperature",
        &["vitals.temperature", "temperature", "temp"],
        Coercion::BoundedText("98.6", VITAL_MAX),
    ),
    field("weight", WEIGHT_SOURCES, Coercion::BoundedText("70", VITAL_MAX)),
    field("height", HEIGHT_SOURCES, Coercion::BoundedText("170", VITAL_MAX)),
    field("bmi", &["vitals.bmi", "bmi"], Coercion::Bmi),
    field(
        "physical_exam_findings",
        &["physical_exam_findings", "physical_exam", "examination", "exam_findings"],
        Coercion::Text("Normal"),
    ),
];

pub const LAB_TEST_FIELDS: &[FieldSpec] = &[
    field(
        "lab_results",
        &["lab_results", "results", "lab_result"],
        Coercion::Text("No lab results available"),
    ),
    field(
        "imaging",
        &["imaging", "radiology", "scans"],
        Coercion::Text("No imaging performed"),
    ),
    field(
        "other_tests",
        &["other_tests", "additional_tests", "tests"],
        Coercion::Text("No additional tests"),
    ),
];

pub const TREATMENT_FIELDS: &[FieldSpec] = &[
    field(
        "related_disease",
        &["related_disease", "disease", "condition", "diagnosis"],
        Coercion::BoundedText("General treatment", NAME_MAX),
    ),
    field(
        "assigned_doctor",
        &["assigned_doctor", "doctor", "physician"],
        Coercion::BoundedText("Dr. General", NAME_MAX),
    ),
    field(
        "prescribed_medications",
        &["medications", "prescribed_medications", "medicines", "drugs"],
        Coercion::Text("As prescribed"),
    ),
    field(
        "procedures",
        &["procedures", "procedure"],
        Coercion::Text("Standard care"),
    ),
    field(
        "next_followup_date",
        &["next_followup_date", "follow_up_date", "followup_date", "next_visit"],
        Coercion::OptionalDate,
    ),
    field(
        "lifestyle_recommendations",
        &["lifestyle_recommendations", "lifestyle", "recommendations"],
        Coercion::Text("Maintain healthy lifestyle"),
    ),
    field(
        "physiotherapy_advice",
        &["physiotherapy_advice", "physiotherapy"],
        Coercion::Text("As needed"),
    ),
];

pub const NOTE_FIELDS: &[FieldSpec] = &[
    field(
        "doctor_remarks",
        &["doctor_remarks", "remarks", "doctor_notes", "note"],
        Coercion::Text("No specific remarks"),
    ),
    field(
        "special_warnings",
        &["special_warnings", "warnings", "warning"],
        Coercion::Text("No special warnings"),
    ),
];

/// Whether a top-level key names a patient field, so that a bare patient
/// object can stand in for the whole record.
pub fn is_patient_key(key: &str) -> bool {
    PATIENT_FIELDS
        .iter()
        .flat_map(|f| f.sources.iter())
        .any(|source| *source == key)
}
