//! AI-content detection endpoints.

use super::upload::UploadForm;
use super::{blocking, ApiError, AppState};
use crate::files::{extension_of, ScopedTempFile};
use crate::validate::{validate_text, validate_upload};
use axum::extract::{Multipart, State};
use axum::Json;
use deck_core::{DetectionResult, PresentationDetection};
use deck_detector::detect_presentation;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TextDetectionRequest {
    pub text: String,
    /// Detector model; the configured default when omitted.
    #[serde(default)]
    pub model: Option<String>,
}

pub async fn detect_text(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextDetectionRequest>,
) -> Result<Json<DetectionResult>, ApiError> {
    validate_text(&request.text)?;

    let result = blocking(move || {
        let detector = state.detectors.get(request.model.as_deref())?;
        Ok(detector.detect(&request.text)?)
    })
    .await?;

    log::info!(
        "Text detection complete: {} ({:.2})",
        result.label,
        result.confidence
    );
    Ok(Json(result))
}

pub async fn detect_pptx(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PresentationDetection>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    validate_upload(&form.file_name, form.data.len(), &state.settings)?;

    let result = blocking(move || {
        let upload = ScopedTempFile::with_contents(
            &state.settings.temp_dir,
            &extension_of(&form.file_name),
            &form.data,
        )?;
        let detector = state.detectors.get(None)?;
        Ok(detect_presentation(&detector, upload.path(), &form.file_name)?)
    })
    .await?;

    Ok(Json(result))
}
