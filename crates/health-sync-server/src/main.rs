use anyhow::Context;
use health_sync_core::{Normalizer, RecordStore};
use health_sync_llm::{LlmConfig, SummaryService};
use health_sync_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("Failed to load server configuration")?;
    let llm_config = LlmConfig::from_env().context("Failed to load Gemini configuration")?;

    let store = RecordStore::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database_path.display()
        )
    })?;
    let summaries =
        SummaryService::from_config(&llm_config).context("Failed to build Gemini client")?;
    let normalizer = Normalizer::new().with_contact_policy(config.contact_policy);

    let app = build_router(
        AppState::new(store, summaries, normalizer),
        config.upload_limit(),
    );

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to address: {}", config.bind_address))?;
    info!(address = %config.bind_address, "Health Sync API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    info!("Health Sync API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
