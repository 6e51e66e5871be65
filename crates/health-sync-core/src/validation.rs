//! Field-level validation applied before anything is written.
//!
//! Each `validate_*` function turns a loosely-typed input document into the
//! typed write model, or collects every failing field with its messages.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{
    BloodGroup, CheckUpInput, Gender, LabTestsInput, MedicalHistoryInput, NewCheckUp,
    NewPatient, NewTreatmentPlan, NoteInput, PatientInput, TreatmentPlanInput,
};

pub const REQUIRED: &str = "This field is required.";
pub const DATE_FORMAT: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

pub const MAX_AGE: i64 = 150;
const NAME_MAX: usize = 100;
const PHONE_MAX: usize = 20;
const VITAL_MAX: usize = 50;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Field name to list of error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Trim, mapping blank strings to `None`.
pub fn clean_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &Option<String>, max: usize) {
    if let Some(v) = value {
        if v.chars().count() > max {
            errors.add(field, max_length_message(max));
        }
    }
}

fn optional_date(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<NaiveDate> {
    let raw = clean_text(value)?;
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        errors.add(field, DATE_FORMAT);
    }
    parsed
}

fn required_date(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<NaiveDate> {
    if clean_text(value).is_none() {
        errors.add(field, REQUIRED);
        return None;
    }
    optional_date(errors, field, value)
}

fn choice<T: std::str::FromStr<Err = crate::models::InvalidChoice>>(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
) -> Option<T> {
    let Some(raw) = clean_text(value) else {
        errors.add(field, REQUIRED);
        return None;
    };
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

pub fn validate_patient(input: &PatientInput) -> Result<NewPatient, FieldErrors> {
    let mut errors = FieldErrors::new();

    let patient_name = clean_text(&input.patient_name);
    if patient_name.is_none() {
        errors.add("patient_name", REQUIRED);
    }
    check_length(&mut errors, "patient_name", &patient_name, NAME_MAX);

    let guardian_name = clean_text(&input.guardian_name);
    check_length(&mut errors, "guardian_name", &guardian_name, NAME_MAX);

    let age = match input.age {
        None => {
            errors.add("age", REQUIRED);
            None
        }
        Some(a) if a < 0 => {
            errors.add("age", "Ensure this value is greater than or equal to 0.");
            None
        }
        Some(a) if a > MAX_AGE => {
            errors.add(
                "age",
                format!("Ensure this value is less than or equal to {MAX_AGE}."),
            );
            None
        }
        Some(a) => u32::try_from(a).ok(),
    };

    let gender = choice::<Gender>(&mut errors, "gender", &input.gender);
    let blood_group = choice::<BloodGroup>(&mut errors, "blood_group", &input.blood_group);
    let date_of_birth = required_date(&mut errors, "date_of_birth", &input.date_of_birth);

    let phone_number = clean_text(&input.phone_number);
    check_length(&mut errors, "phone_number", &phone_number, PHONE_MAX);

    let email_address = clean_text(&input.email_address);
    if let Some(email) = &email_address {
        if !EMAIL_RE.is_match(email) {
            errors.add("email_address", INVALID_EMAIL);
        }
    }

    let address = clean_text(&input.address);

    match (patient_name, age, gender, blood_group, date_of_birth) {
        (Some(patient_name), Some(age), Some(gender), Some(blood_group), Some(date_of_birth))
            if errors.is_empty() =>
        {
            Ok(NewPatient {
                patient_name,
                guardian_name,
                age,
                gender,
                blood_group,
                date_of_birth,
                phone_number,
                email_address,
                address,
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_medical_history(
    input: &MedicalHistoryInput,
) -> Result<MedicalHistoryInput, FieldErrors> {
    Ok(MedicalHistoryInput {
        past_conditions: clean_text(&input.past_conditions),
        family_history: clean_text(&input.family_history),
        previous_surgeries: clean_text(&input.previous_surgeries),
        allergies: clean_text(&input.allergies),
    })
}

pub fn validate_checkup(input: &CheckUpInput) -> Result<NewCheckUp, FieldErrors> {
    let mut errors = FieldErrors::new();

    let date_of_checkup = required_date(&mut errors, "date_of_checkup", &input.date_of_checkup);

    let vitals = [
        ("blood_pressure", clean_text(&input.blood_pressure)),
        ("heart_rate", clean_text(&input.heart_rate)),
        ("temperature", clean_text(&input.temperature)),
        ("weight", clean_text(&input.weight)),
        ("height", clean_text(&input.height)),
        ("bmi", clean_text(&input.bmi)),
    ];
    for (field, value) in &vitals {
        check_length(&mut errors, field, value, VITAL_MAX);
    }
    let [blood_pressure, heart_rate, temperature, weight, height, bmi] = vitals.map(|(_, v)| v);

    let Some(date_of_checkup) = date_of_checkup else {
        return Err(errors);
    };

    errors.into_result(|| NewCheckUp {
        date_of_checkup,
        symptoms: clean_text(&input.symptoms),
        current_diagnosis: clean_text(&input.current_diagnosis),
        blood_pressure,
        heart_rate,
        temperature,
        weight,
        height,
        bmi,
        physical_exam_findings: clean_text(&input.physical_exam_findings),
    })
}

pub fn validate_lab_tests(input: &LabTestsInput) -> Result<LabTestsInput, FieldErrors> {
    Ok(LabTestsInput {
        lab_results: clean_text(&input.lab_results),
        imaging: clean_text(&input.imaging),
        other_tests: clean_text(&input.other_tests),
    })
}

/// Validates field shapes only; whether `checkup` belongs to the patient is
/// checked against the database by the write path.
pub fn validate_treatment(input: &TreatmentPlanInput) -> Result<NewTreatmentPlan, FieldErrors> {
    let mut errors = FieldErrors::new();

    let related_disease = clean_text(&input.related_disease);
    check_length(&mut errors, "related_disease", &related_disease, NAME_MAX);
    let assigned_doctor = clean_text(&input.assigned_doctor);
    check_length(&mut errors, "assigned_doctor", &assigned_doctor, NAME_MAX);

    let next_followup_date =
        optional_date(&mut errors, "next_followup_date", &input.next_followup_date);

    errors.into_result(|| NewTreatmentPlan {
        checkup: input.checkup.flatten(),
        related_disease,
        assigned_doctor,
        prescribed_medications: clean_text(&input.prescribed_medications),
        procedures: clean_text(&input.procedures),
        next_followup_date,
        lifestyle_recommendations: clean_text(&input.lifestyle_recommendations),
        physiotherapy_advice: clean_text(&input.physiotherapy_advice),
    })
}

pub fn validate_note(input: &NoteInput) -> Result<NoteInput, FieldErrors> {
    Ok(NoteInput {
        doctor_remarks: clean_text(&input.doctor_remarks),
        special_warnings: clean_text(&input.special_warnings),
    })
}

/// Whether a string passes the email check used for patients.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}
