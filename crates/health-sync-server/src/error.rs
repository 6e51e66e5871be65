//! API error type and its JSON payloads.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use health_sync_core::{DbError, RecordError};
use health_sync_llm::{ConfigurationError, LlmError};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::documents::SUPPORTED_EXTENSIONS;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("{error}: {details}")]
    BadRequest {
        error: String,
        details: String,
        filename: Option<String>,
    },

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Failed to read upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("Unsupported file type: {extension}")]
    UnsupportedFile { extension: String },

    #[error("Word document extraction not implemented")]
    NotImplemented { filename: String, file_size: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: details.into(),
            filename: None,
        }
    }

    pub fn bad_file(
        error: impl Into<String>,
        details: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: details.into(),
            filename: Some(filename.into()),
        }
    }

    fn status_and_body(&self) -> (StatusCode, Map<String, Value>) {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(false));

        let status = match self {
            ApiError::Record(RecordError::Validation { section, errors }) => {
                body.insert("error".into(), section.message().into());
                body.insert("details".into(), json!(errors));
                if let Some(index) = section.index() {
                    body.insert("item".into(), index.into());
                }
                StatusCode::BAD_REQUEST
            }
            ApiError::Record(RecordError::NotFound(id)) => {
                body.insert("error".into(), "Patient not found".into());
                body.insert("details".into(), format!("No patient with id {id}").into());
                StatusCode::NOT_FOUND
            }
            ApiError::Record(RecordError::Database(DbError::Constraint(msg))) => {
                body.insert("error".into(), "Record conflicts with existing data".into());
                body.insert("details".into(), msg.clone().into());
                StatusCode::CONFLICT
            }
            ApiError::Record(e) => {
                body.insert("error".into(), "Database error".into());
                body.insert("details".into(), e.to_string().into());
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Llm(LlmError::Configuration(e)) => {
                let headline = match e {
                    ConfigurationError::MissingApiKey => "AI API key not found",
                    ConfigurationError::InvalidValue { .. } => "AI configuration invalid",
                };
                body.insert("error".into(), headline.into());
                body.insert("details".into(), e.to_string().into());
                body.insert("note".into(), e.note().into());
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Llm(LlmError::Extraction(e)) => {
                body.insert("error".into(), "Could not structure the report into JSON".into());
                body.insert("details".into(), e.to_string().into());
                body.insert("raw_response".into(), e.raw_response().into());
                StatusCode::BAD_GATEWAY
            }
            ApiError::Llm(e) => {
                body.insert("error".into(), "Failed to generate AI summary".into());
                body.insert("details".into(), e.to_string().into());
                StatusCode::BAD_GATEWAY
            }
            ApiError::BadRequest {
                error,
                details,
                filename,
            } => {
                body.insert("error".into(), error.clone().into());
                body.insert("details".into(), details.clone().into());
                if let Some(name) = filename {
                    body.insert("filename".into(), name.clone().into());
                }
                StatusCode::BAD_REQUEST
            }
            ApiError::Json(rejection) => {
                body.insert("error".into(), "Invalid request body".into());
                body.insert("details".into(), rejection.body_text().into());
                StatusCode::BAD_REQUEST
            }
            ApiError::Upload(e) => {
                body.insert("error".into(), "Failed to read file".into());
                body.insert("details".into(), e.body_text().into());
                e.status()
            }
            ApiError::UnsupportedFile { extension } => {
                body.insert("error".into(), "Unsupported file type".into());
                body.insert(
                    "details".into(),
                    format!("Supported formats: {}", SUPPORTED_EXTENSIONS.join(", ")).into(),
                );
                body.insert("uploaded_extension".into(), extension.clone().into());
                StatusCode::BAD_REQUEST
            }
            ApiError::NotImplemented {
                filename,
                file_size,
            } => {
                body.insert(
                    "error".into(),
                    "Word document extraction not implemented".into(),
                );
                body.insert(
                    "details".into(),
                    "Word document extraction is not supported by this server".into(),
                );
                body.insert(
                    "note".into(),
                    "Convert the document to PDF or plain text and upload again".into(),
                );
                body.insert("filename".into(), filename.clone().into());
                body.insert("file_size".into(), (*file_size).into());
                StatusCode::NOT_IMPLEMENTED
            }
            ApiError::Internal(msg) => {
                body.insert("error".into(), "Internal server error".into());
                body.insert("details".into(), msg.clone().into());
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(Value::Object(body))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
