//! Gemini wrapper for patient summaries and report structuring.
//!
//! This crate turns stored records and uploaded reports into prose
//! summaries, and reports into complete-record shaped JSON, using Gemini's
//! `generateContent` API.

pub mod client;
pub mod config;
pub mod extraction;
pub mod prompts;
pub mod summary;

pub use client::{GeminiClient, GenerationRequest, Part, TextGenerator};
pub use config::{ConfigurationError, LlmConfig};
pub use extraction::{excerpt, extract_json_object, ExtractionError};
pub use summary::{SummaryService, NO_DATA_SUMMARY};

use thiserror::Error;

/// Errors from model-backed operations.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Gemini request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("No text in Gemini response")]
    EmptyResponse,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LlmResult<T> = Result<T, LlmError>;
