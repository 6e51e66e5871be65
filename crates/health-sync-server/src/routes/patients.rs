//! Complete-record CRUD and ingestion.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use health_sync_core::{
    CompleteRecord, CompleteRecordInput, CreatedRecord, Patient, PatientOverview,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PatientList {
    pub count: usize,
    pub patients: Vec<PatientOverview>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    #[serde(flatten)]
    pub created: CreatedRecord,
    /// Field paths that normalization filled in or repaired.
    pub repaired: Vec<String>,
}

pub async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<PatientList>> {
    let patients = state.with_store(|store| store.list_patients()).await?;
    Ok(Json(PatientList {
        count: patients.len(),
        patients,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    20
}

/// Name-prefix search, alphabetical.
pub async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Patient>>> {
    let SearchParams { q, limit } = params;
    let patients = state
        .with_store(move |store| store.search_patients(q.trim(), limit))
        .await?;
    Ok(Json(patients))
}

pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<CompleteRecordInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedRecord>)> {
    let Json(input) = payload?;
    let created = state
        .with_store(move |store| store.create_record(&input))
        .await?;
    info!(patient_id = created.patient_id, "Created complete record");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CompleteRecord>> {
    let record = state.with_store(move |store| store.get_record(id)).await?;
    Ok(Json(record))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<CompleteRecordInput>, JsonRejection>,
) -> ApiResult<Json<CompleteRecord>> {
    let Json(input) = payload?;
    let record = state
        .with_store(move |store| store.update_record(id, &input))
        .await?;
    info!(patient_id = id, "Updated complete record");
    Ok(Json(record))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let name = state
        .with_store(move |store| {
            let record = store.get_record(id)?;
            store.delete_patient(id)?;
            Ok(record.patient.patient_name)
        })
        .await?;
    info!(patient_id = id, "Deleted patient");
    Ok(Json(json!({
        "success": true,
        "message": format!("Patient {name} and all related data deleted successfully")
    })))
}

/// Normalize an arbitrary document, then store it.
pub async fn ingest_patient(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let Json(document) = payload?;
    let normalizer = state.normalizer.clone();
    let (created, repaired) = state
        .with_store(move |store| store.ingest(&document, &normalizer))
        .await?;
    Ok((StatusCode::CREATED, Json(IngestResponse { created, repaired })))
}
