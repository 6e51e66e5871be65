//! Server settings from `HEALTH_SYNC_*` environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use health_sync_core::ContactPolicy;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "HEALTH_SYNC";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_DATABASE_PATH: &str = "health_sync.db";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub max_upload_bytes: u64,
    /// What normalization does with missing contact details.
    pub contact_policy: ContactPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            contact_policy: ContactPolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from the given variables instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
            .set_default("contact_policy", "synthesize")?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()
    }

    /// Upload limit as a body-size limit.
    pub fn upload_limit(&self) -> usize {
        usize::try_from(self.max_upload_bytes).unwrap_or(usize::MAX)
    }
}
