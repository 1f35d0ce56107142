//! Multipart form parsing for presentation uploads.

use super::ApiError;
use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;

const FALLBACK_FILE_NAME: &str = "upload.pptx";

/// The uploaded file plus any plain form fields sent with it.
#[derive(Debug)]
pub struct UploadForm {
    pub file_name: String,
    pub data: Bytes,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part; the `file` part is required.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut file = None;
        let mut fields = HashMap::new();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "file" {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
                let data = field.bytes().await.map_err(bad_multipart)?;
                file = Some((file_name, data));
            } else {
                let value = field.text().await.map_err(bad_multipart)?;
                fields.insert(name, value);
            }
        }

        let (file_name, data) = file.ok_or_else(|| ApiError::Validation("Missing file upload".to_string()))?;
        Ok(Self {
            file_name,
            data,
            fields,
        })
    }

    /// A text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, ApiError> {
        match self.text(name) {
            None => Ok(default),
            Some(value) => parse_bool(value)
                .ok_or_else(|| ApiError::Validation(format!("{} must be a boolean, got '{}'", name, value))),
        }
    }

    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64, ApiError> {
        match self.text(name) {
            None => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|_| ApiError::Validation(format!("{} must be a number, got '{}'", name, value))),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("Invalid multipart body: {}", e))
}
