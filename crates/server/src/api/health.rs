//! Service metadata and health.

use super::{utc_timestamp, AppState};
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub models_loaded: bool,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Deck AI-Content API",
        "version": VERSION,
        "health": "/api/health",
    }))
}

/// Healthy when the default model is loaded or can be loaded.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let models_loaded = state.detectors.is_ready();
    if !models_loaded {
        log::error!(
            "Health check: model '{}' is neither loaded nor available",
            state.detectors.default_model()
        );
    }

    Json(HealthResponse {
        status: if models_loaded { "healthy" } else { "degraded" },
        timestamp: utc_timestamp(),
        version: VERSION,
        models_loaded,
    })
}
