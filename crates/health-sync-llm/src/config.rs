//! Gemini settings, read once at startup.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const TEMPERATURE_VAR: &str = "GEMINI_TEMPERATURE";
pub const MAX_OUTPUT_TOKENS_VAR: &str = "GEMINI_MAX_OUTPUT_TOKENS";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const TIMEOUT_VAR: &str = "GEMINI_TIMEOUT_SECS";

/// Configuration problems with the model backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No API key found. Please set GOOGLE_API_KEY environment variable and restart.")]
    MissingApiKey,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl ConfigurationError {
    /// Setup hint shown next to the error.
    pub fn note(&self) -> String {
        match self {
            ConfigurationError::MissingApiKey => {
                format!("Please set {API_KEY_VAR} environment variable in .env file")
            }
            ConfigurationError::InvalidValue { key, .. } => {
                format!("Fix or unset {key} and restart")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Absent keys are allowed at startup; summary calls fail instead.
    pub api_key: Option<String>,
    pub model: String,
    /// Sampling temperature for summaries.
    pub temperature: f32,
    /// Sampling temperature for JSON extraction.
    pub extraction_temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            extraction_temperature: 0.3,
            max_output_tokens: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self {
            api_key: get(API_KEY_VAR),
            ..Self::default()
        };

        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(url) = get(BASE_URL_VAR) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get(TEMPERATURE_VAR) {
            config.temperature = parse_value(&raw)
                .filter(|t: &f32| (0.0..=2.0).contains(t))
                .ok_or_else(|| invalid(TEMPERATURE_VAR, raw))?;
        }
        if let Some(raw) = get(MAX_OUTPUT_TOKENS_VAR) {
            config.max_output_tokens = Some(
                parse_value(&raw)
                    .filter(|n: &u32| *n > 0)
                    .ok_or_else(|| invalid(MAX_OUTPUT_TOKENS_VAR, raw))?,
            );
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs: u64 = parse_value(&raw)
                .filter(|n: &u64| *n > 0)
                .ok_or_else(|| invalid(TIMEOUT_VAR, raw))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// The API key, or the error every model call reports without one.
    pub fn api_key(&self) -> Result<&str, ConfigurationError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigurationError::MissingApiKey)
    }
}

fn parse_value<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

fn invalid(key: &'static str, value: String) -> ConfigurationError {
    ConfigurationError::InvalidValue { key, value }
}
