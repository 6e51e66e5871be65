use std::sync::Arc;

use health_sync_core::{Normalizer, RecordError, RecordStore};
use health_sync_llm::SummaryService;

use crate::error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub summaries: SummaryService,
    pub normalizer: Arc<Normalizer>,
}

impl AppState {
    pub fn new(store: RecordStore, summaries: SummaryService, normalizer: Normalizer) -> Self {
        Self {
            store,
            summaries,
            normalizer: Arc::new(normalizer),
        }
    }

    /// Run a store operation on the blocking pool.
    pub async fn with_store<F, T>(&self, op: F) -> ApiResult<T>
    where
        F: FnOnce(&RecordStore) -> Result<T, RecordError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| ApiError::Internal(format!("Database task failed: {e}")))?
            .map_err(ApiError::from)
    }
}
