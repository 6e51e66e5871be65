//! Report text or files to a normalized complete-record document.
//!
//! Nothing is stored here; clients review the result and post it to the
//! create endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use health_sync_core::CompleteRecordInput;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::documents::{document_structure, read_upload};
use crate::error::ApiResult;
use crate::routes::summary::TextRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Extraction {
    pub success: bool,
    /// JSON as returned by the model.
    pub extracted: Map<String, Value>,
    /// The same document after normalization, ready to create.
    pub record: CompleteRecordInput,
    pub repaired: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub source: &'static str,
}

fn normalized(
    state: &AppState,
    extracted: Map<String, Value>,
    filename: Option<String>,
    source: &'static str,
) -> Extraction {
    let report = state.normalizer.normalize(&Value::Object(extracted.clone()));
    debug!(repaired = report.repaired.len(), "Normalized extracted record");
    Extraction {
        success: true,
        extracted,
        record: report.record,
        repaired: report.repaired,
        filename,
        source,
    }
}

pub async fn extract_text(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<Json<Extraction>> {
    let Json(request) = payload?;
    let text = request.into_text()?;

    let extracted = state.summaries.structure_text(&text).await?;
    Ok(Json(normalized(&state, extracted, None, "text_input")))
}

pub async fn extract_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Extraction>> {
    let upload = read_upload(&mut multipart).await?;
    let extracted = document_structure(&state.summaries, &upload).await?;
    Ok(Json(normalized(
        &state,
        extracted,
        Some(upload.filename),
        "file_upload",
    )))
}
