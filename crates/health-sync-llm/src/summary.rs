//! Summaries and structured extraction on top of a text generator.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::client::{GeminiClient, GenerationRequest, TextGenerator};
use crate::config::{ConfigurationError, LlmConfig};
use crate::extraction::extract_json_object;
use crate::prompts::{
    record_summary_prompt, report_summary_prompt, structure_text_prompt,
    DOCUMENT_EXTRACTION_INSTRUCTIONS, TRANSCRIPTION_PROMPT,
};
use crate::{LlmError, LlmResult};

/// Returned instead of calling the model for an empty record.
pub const NO_DATA_SUMMARY: &str = "No Data Found!";

/// Entry point for every model-backed operation.
///
/// Built once at startup. Without an API key the service still constructs,
/// and each call reports [`ConfigurationError::MissingApiKey`].
#[derive(Clone)]
pub struct SummaryService {
    generator: Option<Arc<dyn TextGenerator>>,
    temperature: f32,
    extraction_temperature: f32,
}

impl SummaryService {
    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        let generator: Option<Arc<dyn TextGenerator>> = match GeminiClient::new(config) {
            Ok(client) => {
                info!(model = %config.model, "Gemini client ready");
                Some(Arc::new(client))
            }
            Err(LlmError::Configuration(ConfigurationError::MissingApiKey)) => {
                warn!("GOOGLE_API_KEY not set; summary endpoints will be unavailable");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            generator,
            temperature: config.temperature,
            extraction_temperature: config.extraction_temperature,
        })
    }

    pub fn with_generator(generator: Arc<dyn TextGenerator>, config: &LlmConfig) -> Self {
        Self {
            generator: Some(generator),
            temperature: config.temperature,
            extraction_temperature: config.extraction_temperature,
        }
    }

    /// A service with no backend: every call fails with a missing-key error.
    pub fn unconfigured(config: &LlmConfig) -> Self {
        Self {
            generator: None,
            temperature: config.temperature,
            extraction_temperature: config.extraction_temperature,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    fn generator(&self) -> Result<&dyn TextGenerator, ConfigurationError> {
        self.generator
            .as_deref()
            .ok_or(ConfigurationError::MissingApiKey)
    }

    async fn run(&self, request: GenerationRequest) -> LlmResult<String> {
        let text = self.generator()?.generate(request).await?;
        Ok(text.trim().to_string())
    }

    /// Paragraph summary of a complete record.
    pub async fn summarize_record(&self, record: &Value) -> LlmResult<String> {
        self.generator()?;
        if is_empty_document(record) {
            return Ok(NO_DATA_SUMMARY.to_string());
        }

        let pretty = serde_json::to_string_pretty(record)?;
        self.run(GenerationRequest::text(
            record_summary_prompt(&pretty),
            self.temperature,
        ))
        .await
    }

    /// Short summary of free report text.
    pub async fn summarize_text(&self, text: &str) -> LlmResult<String> {
        self.run(GenerationRequest::text(
            report_summary_prompt(text),
            self.temperature,
        ))
        .await
    }

    /// Plain text of an image or PDF, read by the model.
    pub async fn transcribe_document(&self, mime_type: &str, data: Vec<u8>) -> LlmResult<String> {
        self.run(
            GenerationRequest::text(TRANSCRIPTION_PROMPT, self.extraction_temperature)
                .with_inline_data(mime_type, data),
        )
        .await
    }

    /// Complete-record shaped JSON from report text. The result still needs
    /// normalization before it can be stored.
    pub async fn structure_text(&self, text: &str) -> LlmResult<Map<String, Value>> {
        let response = self
            .run(GenerationRequest::text(
                structure_text_prompt(text),
                self.extraction_temperature,
            ))
            .await?;
        Ok(extract_json_object(&response)?)
    }

    /// Complete-record shaped JSON from an image or PDF.
    pub async fn structure_document(
        &self,
        mime_type: &str,
        data: Vec<u8>,
    ) -> LlmResult<Map<String, Value>> {
        let response = self
            .run(
                GenerationRequest::text(
                    DOCUMENT_EXTRACTION_INSTRUCTIONS,
                    self.extraction_temperature,
                )
                .with_inline_data(mime_type, data),
            )
            .await?;
        Ok(extract_json_object(&response)?)
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Part;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns a fixed reply and records every request.
    struct CannedGenerator {
        reply: String,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl CannedGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, request: GenerationRequest) -> LlmResult<String> {
            self.seen.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    fn service(generator: Arc<CannedGenerator>) -> SummaryService {
        SummaryService::with_generator(generator, &LlmConfig::default())
    }

    #[tokio::test]
    async fn test_summarize_record_embeds_json() {
        let generator = CannedGenerator::new("  **Ali**, 40, is healthy.\n");
        let summary = service(generator.clone())
            .summarize_record(&json!({"patient": {"patient_name": "Ali", "age": 40}}))
            .await
            .unwrap();

        assert_eq!(summary, "**Ali**, 40, is healthy.");
        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.7);
        match &requests[0].parts[0] {
            Part::Text(prompt) => assert!(prompt.contains("\"patient_name\": \"Ali\"")),
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_record_skips_model() {
        let generator = CannedGenerator::new("unused");
        let summary = service(generator.clone())
            .summarize_record(&json!({}))
            .await
            .unwrap();
        assert_eq!(summary, NO_DATA_SUMMARY);
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_service() {
        let service = SummaryService::unconfigured(&LlmConfig::default());
        assert!(!service.is_configured());
        let err = service.summarize_text("BP 120/80").await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::Configuration(ConfigurationError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_structure_document_sends_inline_data() {
        let generator = CannedGenerator::new("```json\n{\"patient\": {\"patient_name\": \"Sara\"}}\n```");
        let map = service(generator.clone())
            .structure_document("image/png", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(map["patient"]["patient_name"], "Sara");
        let request = &generator.requests()[0];
        assert_eq!(request.temperature, 0.3);
        assert_eq!(
            request.parts[1],
            Part::InlineData {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3]
            }
        );
    }

    #[tokio::test]
    async fn test_structure_text_unparseable() {
        let generator = CannedGenerator::new("Sorry, I cannot help with that.");
        let err = service(generator)
            .structure_text("gibberish")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Extraction(_)));
    }

    #[test]
    fn test_from_config_without_key() {
        let service = SummaryService::from_config(&LlmConfig::default()).unwrap();
        assert!(!service.is_configured());
    }
}
