use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{self, extract, patients, summary};
use crate::state::AppState;

/// Every API route, with CORS, request tracing and the upload size limit.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/health/", get(routes::health))
        .route(
            "/api/patients/",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route("/api/patients/search/", get(patients::search_patients))
        .route("/api/patients/ingest/", post(patients::ingest_patient))
        .route(
            "/api/patients/:id/",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route("/api/patients/:id/summary/", post(summary::patient_summary))
        .route("/api/summary/text/", post(summary::text_summary))
        .route("/api/summary/file/", post(summary::file_summary))
        .route("/api/extract/text/", post(extract::extract_text))
        .route("/api/extract/file/", post(extract::extract_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
