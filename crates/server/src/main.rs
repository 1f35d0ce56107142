use anyhow::{Context, Result};
use deck_server::{logging, router, AppState, Settings};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    logging::init(&settings.log_level, &settings.log_format);

    log::info!("Starting deck API");
    log::info!("API Host: {}", settings.bind_address());
    log::info!("CORS Origins: {:?}", settings.cors_origins_list());
    log::info!("Detector model: {}", settings.hf_model_name);

    let address = settings.bind_address();
    let state = Arc::new(AppState::from_settings(settings));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("Shutting down deck API");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
