//! Prompt templates for record summaries and report structuring.
//!
//! Templates use a single `{record}` or `{text}` placeholder that is
//! substituted verbatim.

/// Summary of a stored complete record, passed as pretty-printed JSON.
pub const RECORD_SUMMARY_TEMPLATE: &str = r#"You are a helpful medical assistant.

Your job is to take the full patient record and create a summary of 7-10 lines in the form of a paragraph.

Rules:
- Always mention patient's name and age first.
- If "current_diagnosis" exists, report it clearly.
- If no disease/diagnosis, write exactly: "Patient has no reported medical conditions."
- Mention prescribed medications (or "None").
- Mention recovery plan (procedures, lifestyle, physiotherapy, follow-up).
- Write dates in a clear manner like 20th March 2021.
- Bold the important words and terminologies.
- Merge other important details (allergies, doctor remarks, warnings) in a simple way.
- Be concise, clear, and easy to read.
- At the very end, add a Risk line:
  - If labs/vitals/diagnosis indicate a risk, state it clearly (e.g., "High risk due to uncontrolled diabetes").
  - If nothing serious, write "No immediate risks reported."
- After that, add a Doctor's Note written in simple words a patient can easily understand. Avoid medical jargon.

You must consider all the fields in the data.

Now create a short summary in the form of a paragraph with 7-10 lines only, then finish with the risk line.

Patient Record JSON:
{record}"#;

/// Summary of free report text, either pasted or read from an upload.
pub const REPORT_SUMMARY_TEMPLATE: &str = r#"You are a helpful medical assistant.

Your job is to analyze the following medical report and create a concise summary of 7-10 lines.

Rules:
- Extract patient name, age, and gender if mentioned
- Identify the main diagnosis or medical condition
- Mention key symptoms and vital signs
- List prescribed medications if any
- Include treatment recommendations
- Highlight any allergies or warnings
- Add a risk assessment at the end
- Use bold (**text**) for important medical terms
- Be clear, concise, and patient-friendly

Medical Report:
{text}"#;

/// Conversion of report text into the complete-record shape.
pub const STRUCTURE_TEXT_TEMPLATE: &str = r#"Convert this medical report text into structured JSON format:

Text: {text}

Return ONLY valid JSON with these keys:
- patient: {patient_name, guardian_name, age, gender, blood_group, date_of_birth, phone_number, email_address, address}
- medical_history: {past_conditions, family_history, previous_surgeries, allergies}
- checkups: [{symptoms, current_diagnosis, date_of_checkup, blood_pressure, heart_rate, temperature, weight, height, bmi, physical_exam_findings}]
- lab_tests: [{lab_results, imaging, other_tests}]
- treatments: [{related_disease, assigned_doctor, prescribed_medications, procedures, next_followup_date, lifestyle_recommendations, physiotherapy_advice}]
- notes: [{doctor_remarks, special_warnings}]

Use ISO date format YYYY-MM-DD when possible. If information is missing, omit the field or use null."#;

/// Sent alongside an inline image or PDF to get the complete-record shape.
pub const DOCUMENT_EXTRACTION_INSTRUCTIONS: &str = "Extract structured data from the attached medical \
report and return ONLY valid JSON. Keys: patient (patient_name, guardian_name, age, gender, \
blood_group, date_of_birth, phone_number, email_address, address), medical_history \
(past_conditions, family_history, previous_surgeries, allergies), checkups (list of {symptoms, \
current_diagnosis, date_of_checkup, blood_pressure, heart_rate, temperature, weight, height, bmi, \
physical_exam_findings}), lab_tests (list of {lab_results, imaging, other_tests}), treatments \
(list of {related_disease, assigned_doctor, prescribed_medications, procedures, \
next_followup_date, lifestyle_recommendations, physiotherapy_advice}), notes (list of \
{doctor_remarks, special_warnings}). Use ISO date format YYYY-MM-DD when possible. If a field \
is missing, omit it or set it to null.";

/// Sent alongside an inline image or PDF to get its plain text.
pub const TRANSCRIPTION_PROMPT: &str = "Transcribe all readable text in the attached medical \
document as plain text. Keep the original wording, numbers and units. Do not summarize, \
interpret or add commentary. If the document contains no readable text, return nothing.";

pub fn record_summary_prompt(record_json: &str) -> String {
    RECORD_SUMMARY_TEMPLATE.replace("{record}", record_json)
}

pub fn report_summary_prompt(text: &str) -> String {
    REPORT_SUMMARY_TEMPLATE.replace("{text}", text)
}

pub fn structure_text_prompt(text: &str) -> String {
    STRUCTURE_TEXT_TEMPLATE.replace("{text}", text)
}
