//! Gemini `generateContent` client behind a small generator trait.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::extraction::{excerpt, EXCERPT_CHARS};
use crate::{LlmError, LlmResult};

/// One piece of model input.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Raw document bytes sent inline (base64 on the wire).
    InlineData { mime_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub parts: Vec<Part>,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            parts: vec![Part::Text(prompt.into())],
            temperature,
            max_output_tokens: None,
        }
    }

    pub fn with_inline_data(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.parts.push(Part::InlineData {
            mime_type: mime_type.into(),
            data,
        });
        self
    }
}

/// Anything that turns a prompt into text.
///
/// The Gemini client is the production implementation; tests substitute
/// canned generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> LlmResult<String>;
}

// =========================================================================
// Wire format
// =========================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum WirePart {
    #[serde(rename = "text")]
    Text(String),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: String,
        data: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

fn request_body(request: &GenerationRequest) -> GenerateContentBody {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart::Text(text.clone()),
            Part::InlineData { mime_type, data } => WirePart::InlineData {
                mime_type: mime_type.clone(),
                data: BASE64.encode(data),
            },
        })
        .collect();

    GenerateContentBody {
        contents: vec![WireContent {
            role: "user",
            parts,
        }],
        generation_config: WireGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

/// Text of the first candidate, parts concatenated.
fn response_text(response: GenerateContentResponse) -> LlmResult<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

// =========================================================================
// Client
// =========================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_output_tokens: Option<u32>,
}

impl GeminiClient {
    /// Build a client. Fails without an API key.
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        let api_key = config.api_key()?.to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key,
            max_output_tokens: config.max_output_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> LlmResult<String> {
        let mut body = request_body(&request);
        if body.generation_config.max_output_tokens.is_none() {
            body.generation_config.max_output_tokens = self.max_output_tokens;
        }

        let started = std::time::Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Gemini request rejected");
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: excerpt(&error_body, EXCERPT_CHARS),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        debug!(
            elapsed_ms = elapsed_ms(started.elapsed()),
            "Gemini response received"
        );
        response_text(parsed)
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
