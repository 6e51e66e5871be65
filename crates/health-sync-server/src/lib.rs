//! REST API for complete patient records and AI summaries.
//!
//! # Modules
//!
//! - [`config`]: `HEALTH_SYNC_*` settings
//! - [`routes`]: Handlers for records, summaries and extraction
//! - [`documents`]: Uploaded report files
//! - [`error`]: Error payloads

pub mod config;
pub mod documents;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;
