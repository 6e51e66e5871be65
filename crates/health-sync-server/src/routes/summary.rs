//! AI summaries of stored records, pasted text and uploaded reports.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use health_sync_llm::{excerpt, extraction::EXCERPT_CHARS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::documents::{document_text, read_upload};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextRequest {
    pub text: String,
}

impl TextRequest {
    /// Trimmed text, or the error for a missing one.
    pub fn into_text(self) -> ApiResult<String> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(ApiError::bad_request(
                "No text provided",
                "Please provide medical report text in the \"text\" field",
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
pub struct RecordSummary {
    pub success: bool,
    pub patient_id: i64,
    pub patient_name: String,
    pub summary: String,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct TextSummary {
    pub success: bool,
    pub summary: String,
    pub input_length: usize,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub success: bool,
    pub summary: String,
    pub filename: String,
    pub file_size: usize,
    pub extracted_text: String,
    pub source: &'static str,
}

pub async fn patient_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecordSummary>> {
    let record = state.with_store(move |store| store.get_record(id)).await?;
    let data = serde_json::to_value(&record).map_err(|e| ApiError::Internal(e.to_string()))?;

    let summary = state.summaries.summarize_record(&data).await?;
    info!(patient_id = id, "Generated record summary");

    Ok(Json(RecordSummary {
        success: true,
        patient_id: id,
        patient_name: record.patient.patient_name,
        summary,
        data,
    }))
}

pub async fn text_summary(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<Json<TextSummary>> {
    let Json(request) = payload?;
    let text = request.into_text()?;

    let summary = state.summaries.summarize_text(&text).await?;
    Ok(Json(TextSummary {
        success: true,
        summary,
        input_length: text.chars().count(),
        source: "text_input",
    }))
}

pub async fn file_summary(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<FileSummary>> {
    let upload = read_upload(&mut multipart).await?;
    let text = document_text(&state.summaries, &upload).await?;

    let summary = state.summaries.summarize_text(&text).await?;
    info!(filename = %upload.filename, "Generated report summary");

    Ok(Json(FileSummary {
        success: true,
        summary,
        file_size: upload.size(),
        extracted_text: excerpt(&text, EXCERPT_CHARS),
        filename: upload.filename,
        source: "file_upload",
    }))
}
