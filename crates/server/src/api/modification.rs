//! PowerPoint modification endpoint.

use super::upload::UploadForm;
use super::{blocking, ApiError, AppState};
use crate::files::{extension_of, ScopedTempFile};
use crate::validate::{validate_threshold, validate_upload};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use deck_core::{RgbColor, StyleConfig};
use deck_detector::{modify_presentation, ModifyOptions, DEFAULT_CONFIDENCE_THRESHOLD};
use std::sync::Arc;

pub const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Rewrite AI-detected slides and/or restyle every run; responds with the
/// modified file.
///
/// Form fields: `file`, `replace_ai_content` (default true), `font_name`,
/// `text_color` (hex), `confidence_threshold` (default 0.7).
pub async fn modify_pptx(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    validate_upload(&form.file_name, form.data.len(), &state.settings)?;

    let options = modify_options(&form)?;
    let file_name = form.file_name.clone();

    let modified = blocking(move || {
        let temp_dir = &state.settings.temp_dir;
        let input = ScopedTempFile::with_contents(temp_dir, &extension_of(&form.file_name), &form.data)?;
        let output = ScopedTempFile::create(temp_dir, ".pptx")?;

        let summary = modify_presentation(
            &state.detectors,
            &state.rewriter,
            input.path(),
            output.path(),
            &options,
        )?;
        log::debug!("Modification summary: {:?}", summary);

        Ok(std::fs::read(output.path())?)
    })
    .await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PPTX_MIME));
    let disposition = format!("attachment; filename=\"modified_{}\"", header_safe(&file_name));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::internal(format!("Invalid download name: {}", e)))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, modified).into_response())
}

fn modify_options(form: &UploadForm) -> Result<ModifyOptions, ApiError> {
    let confidence_threshold = form.f64_or("confidence_threshold", DEFAULT_CONFIDENCE_THRESHOLD)?;
    validate_threshold(confidence_threshold)?;

    let color = form
        .text("text_color")
        .map(|hex| {
            RgbColor::from_hex(hex)
                .map_err(|_| ApiError::Validation(format!("Invalid text_color '{}'", hex)))
        })
        .transpose()?;
    let style = StyleConfig::new(form.text("font_name").map(str::to_string), None, color)?;

    Ok(ModifyOptions {
        replace_ai_content: form.bool_or("replace_ai_content", true)?,
        confidence_threshold,
        model: None,
        style,
    })
}

/// File name usable inside a quoted header parameter.
fn header_safe(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_names() {
        assert_eq!(header_safe("Q3 plan.pptx"), "Q3 plan.pptx");
        assert_eq!(header_safe("a\"b\r\n.pptx"), "a_b__.pptx");
        assert_eq!(header_safe("präsentation.pptx"), "pr_sentation.pptx");
    }
}
