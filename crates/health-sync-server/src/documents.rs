//! Uploaded report files: reading the multipart field and turning the file
//! into text or structured JSON.

use std::path::Path;

use axum::extract::Multipart;
use health_sync_llm::SummaryService;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

pub const SUPPORTED_EXTENSIONS: &[&str] = &[".txt", ".pdf", ".doc", ".docx", ".jpg", ".jpeg", ".png"];

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// How a file's content is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Decoded as UTF-8.
    PlainText,
    /// Sent to the model inline with this MIME type.
    Inline(&'static str),
    Word,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> ApiResult<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();

        match extension.as_str() {
            ".txt" => Ok(DocumentKind::PlainText),
            ".pdf" => Ok(DocumentKind::Inline("application/pdf")),
            ".png" => Ok(DocumentKind::Inline("image/png")),
            ".jpg" | ".jpeg" => Ok(DocumentKind::Inline("image/jpeg")),
            ".doc" | ".docx" => Ok(DocumentKind::Word),
            _ => Err(ApiError::UnsupportedFile { extension }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn kind(&self) -> ApiResult<DocumentKind> {
        DocumentKind::from_filename(&self.filename)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn not_implemented(&self) -> ApiError {
        ApiError::NotImplemented {
            filename: self.filename.clone(),
            file_size: self.size(),
        }
    }

    fn utf8(&self) -> ApiResult<String> {
        String::from_utf8(self.bytes.clone()).map_err(|_| {
            ApiError::bad_file(
                "Failed to read file",
                "Text files must be UTF-8 encoded",
                &self.filename,
            )
        })
    }
}

/// Read the `file` field, skipping any others.
pub async fn read_upload(multipart: &mut Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?.to_vec();
        debug!(filename = %filename, size = bytes.len(), "Received upload");
        return Ok(Upload { filename, bytes });
    }
    Err(ApiError::bad_request(
        "No file uploaded",
        "Please upload a medical report file",
    ))
}

/// The report's text: decoded directly for `.txt`, transcribed by the
/// model for images and PDFs.
pub async fn document_text(summaries: &SummaryService, upload: &Upload) -> ApiResult<String> {
    let text = match upload.kind()? {
        DocumentKind::PlainText => upload.utf8()?,
        DocumentKind::Inline(mime) => {
            summaries
                .transcribe_document(mime, upload.bytes.clone())
                .await?
        }
        DocumentKind::Word => return Err(upload.not_implemented()),
    };

    if text.trim().is_empty() {
        return Err(ApiError::bad_file(
            "No text extracted from file",
            "The file appears to be empty or unreadable",
            &upload.filename,
        ));
    }
    Ok(text)
}

/// Complete-record shaped JSON from the report, before normalization.
pub async fn document_structure(
    summaries: &SummaryService,
    upload: &Upload,
) -> ApiResult<Map<String, Value>> {
    match upload.kind()? {
        DocumentKind::PlainText => {
            let text = upload.utf8()?;
            if text.trim().is_empty() {
                return Err(ApiError::bad_file(
                    "No text extracted from file",
                    "The file appears to be empty or unreadable",
                    &upload.filename,
                ));
            }
            Ok(summaries.structure_text(&text).await?)
        }
        DocumentKind::Inline(mime) => Ok(summaries
            .structure_document(mime, upload.bytes.clone())
            .await?),
        DocumentKind::Word => Err(upload.not_implemented()),
    }
}
