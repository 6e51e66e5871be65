pub mod extract;
pub mod patients;
pub mod summary;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "summaries_configured": state.summaries.is_configured(),
    }))
}
