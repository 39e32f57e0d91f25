//! Error handling for the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unknown leak pattern: {0}")]
    UnknownPattern(String),

    #[error("forbidden")]
    Forbidden,

    #[error("heap dump already in progress")]
    DumpInProgress,

    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownPattern(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::DumpInProgress => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable tag for the JSON body.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::UnknownPattern(_) => "unknown_pattern",
            Self::Forbidden => "forbidden",
            Self::DumpInProgress => "capture_in_progress",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<leaklab_engine::leaks::UnknownPattern> for AppError {
    fn from(err: leaklab_engine::leaks::UnknownPattern) -> Self {
        Self::UnknownPattern(err.0)
    }
}

impl From<leaklab_engine::Error> for AppError {
    fn from(err: leaklab_engine::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// JSON body every error response carries.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn from_error(err: &AppError) -> Self {
        Self {
            error: err.tag(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::from_error(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_the_contract() {
        assert_eq!(
            AppError::UnknownPattern("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::DumpInProgress.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_carries_tag_and_message() {
        let body = ErrorResponse::from_error(&AppError::UnknownPattern("dom-node".to_string()));

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"], "unknown_pattern");
        assert_eq!(value["message"], "unknown leak pattern: dom-node");
    }

    #[test]
    fn test_forbidden_body_is_constant() {
        // Both denial paths produce this same shape; nothing reveals
        // which check failed.
        let value =
            serde_json::to_value(ErrorResponse::from_error(&AppError::Forbidden)).unwrap();
        assert_eq!(value["error"], "forbidden");
        assert_eq!(value["message"], "forbidden");
    }
}
