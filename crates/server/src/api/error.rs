//! Error responses: `{detail, error_type, timestamp}` with 400 or 500.

use super::utc_timestamp;
use crate::validate::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::backtrace::Backtrace;

/// Anything a handler can fail with. Failures past validation carry the
/// stack where they reached the handler, logged with the 500 response.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request input, rejected before any work.
    Validation(String),
    /// A failure from document handling or detection.
    Core {
        source: deck_core::Error,
        backtrace: Backtrace,
    },
    /// The worker running the request died, or the response could not be built.
    Internal { message: String, backtrace: Backtrace },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    error_type: String,
    timestamp: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            backtrace: Backtrace::force_capture(),
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            ApiError::Validation(_) => None,
            ApiError::Core { backtrace, .. } | ApiError::Internal { backtrace, .. } => Some(backtrace),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Core {
                source: deck_core::Error::InvalidInput(_),
                ..
            } => StatusCode::BAD_REQUEST,
            ApiError::Core { .. } | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ValidationError",
            ApiError::Core { source, .. } => source.kind(),
            ApiError::Internal { .. } => "InternalError",
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Validation(message) | ApiError::Internal { message, .. } => message.clone(),
            ApiError::Core {
                source: deck_core::Error::InvalidInput(message),
                ..
            } => message.clone(),
            ApiError::Core { source, .. } => source.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.0)
    }
}

impl From<deck_core::Error> for ApiError {
    fn from(source: deck_core::Error) -> Self {
        ApiError::Core {
            source,
            backtrace: Backtrace::force_capture(),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::from(deck_core::Error::IoError(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match self.backtrace() {
                Some(backtrace) => log::error!(
                    "Request failed: {} ({})\nStack backtrace:\n{}",
                    self.detail(),
                    self.error_type(),
                    backtrace
                ),
                None => log::error!("Request failed: {} ({})", self.detail(), self.error_type()),
            }
        } else {
            log::warn!("Request rejected: {}", self.detail());
        }

        let body = ErrorBody {
            detail: self.detail(),
            error_type: self.error_type().to_string(),
            timestamp: utc_timestamp(),
        };
        (status, Json(body)).into_response()
    }
}
