//! Request validation performed before any document or model work.

use crate::config::Settings;
use crate::files::extension_of;
use thiserror::Error;

pub const MIN_TEXT_LENGTH: usize = 10;
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// A request was rejected at the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Check an uploaded presentation's extension, then its size.
pub fn validate_upload(file_name: &str, size: usize, settings: &Settings) -> Result<(), ValidationError> {
    let ext = extension_of(file_name);
    let allowed = settings.allowed_extensions();
    if !allowed.contains(&ext) {
        return Err(ValidationError(format!(
            "Invalid file extension '{}'. Allowed extensions: {}",
            ext,
            allowed.join(", ")
        )));
    }

    validate_file_size(size as u64, settings)
}

pub fn validate_file_size(size: u64, settings: &Settings) -> Result<(), ValidationError> {
    if size > settings.max_upload_size_bytes() {
        return Err(ValidationError(format!(
            "File size ({:.2}MB) exceeds maximum allowed size ({}MB)",
            size as f64 / 1024.0 / 1024.0,
            settings.max_upload_size_mb
        )));
    }
    Ok(())
}

/// Text must be non-blank and between the length limits once trimmed.
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError("Text input cannot be empty".to_string()));
    }

    let length = trimmed.chars().count();
    if length < MIN_TEXT_LENGTH {
        return Err(ValidationError(format!(
            "Text must be at least {} characters long",
            MIN_TEXT_LENGTH
        )));
    }
    if length > MAX_TEXT_LENGTH {
        return Err(ValidationError(format!(
            "Text must not exceed {} characters",
            MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_threshold(threshold: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ValidationError(format!(
            "confidence_threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}
