//! Application error types and handling.
//!
//! Provides structured error responses for the API.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No Spotify access token is available.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Spotify answered with a non-success status.
    #[error("Spotify returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The refresh token is missing or the refresh exchange failed.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The authorization code exchange did not yield an access token.
    #[error("Authentication failed")]
    AuthFailed(serde_json::Value),

    /// Mosaic generation was asked to work on zero images.
    #[error("No album covers found.")]
    NoImages,

    /// An album cover could not be downloaded or decoded.
    #[error("Image decode error: {0}")]
    Decode(String),

    /// Spotify handed back a page cursor that was already followed.
    #[error("Pagination cursor did not advance: {0}")]
    CursorLoop(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Outbound HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::RefreshFailed(_) => "REFRESH_FAILED",
            Self::AuthFailed(_) => "AUTH_FAILED",
            Self::NoImages => "NO_IMAGES",
            Self::Decode(_) => "DECODE_ERROR",
            Self::CursorLoop(_) => "CURSOR_LOOP",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether Spotify rejected the bearer token.
    pub fn is_upstream_unauthorized(&self) -> bool {
        matches!(self, Self::Upstream { status: 401, .. })
    }

    /// Create an unauthenticated error for a missing access token.
    pub fn missing_token() -> Self {
        Self::Unauthenticated("Missing Spotify access token. Please log in.".to_string())
    }

    /// Create a decode error for an album cover.
    pub fn decode(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Decode(format!("{}: {}", url, reason))
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::AuthFailed(details) => Some(details.clone()),
            Self::Upstream { body, .. } => Some(
                serde_json::from_str(body)
                    .unwrap_or_else(|_| serde_json::Value::String(body.clone())),
            ),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) | Self::RefreshFailed(_) => StatusCode::UNAUTHORIZED,
            Self::Upstream { status: 401, .. } => StatusCode::UNAUTHORIZED,
            Self::NoImages | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::AuthFailed(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. }
            | Self::Decode(_)
            | Self::CursorLoop(_)
            | Self::Internal(_)
            | Self::Http(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut error_response = ErrorResponse::new(self.error_code(), self.to_string());
        if let Some(details) = self.details() {
            error_response = error_response.with_details(details);
        }

        tracing::error!(
            error_code = %self.error_code(),
            status = %status.as_u16(),
            message = %self.to_string(),
            "API error"
        );

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::missing_token().error_code(), "UNAUTHENTICATED");
        assert_eq!(AppError::NoImages.error_code(), "NO_IMAGES");
        assert_eq!(
            AppError::Upstream {
                status: 429,
                body: String::new()
            }
            .error_code(),
            "UPSTREAM_ERROR"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::missing_token().status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::RefreshFailed("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::NoImages.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Decode("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_status_mapping() {
        let unauthorized = AppError::Upstream {
            status: 401,
            body: "{}".into(),
        };
        assert!(unauthorized.is_upstream_unauthorized());
        assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);

        let throttled = AppError::Upstream {
            status: 429,
            body: "slow down".into(),
        };
        assert!(!throttled.is_upstream_unauthorized());
        assert_eq!(throttled.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_details_keep_json_body() {
        let err = AppError::Upstream {
            status: 500,
            body: r#"{"error":{"status":500,"message":"boom"}}"#.into(),
        };
        let details = err.details().unwrap();
        assert_eq!(details["error"]["message"], "boom");

        let err = AppError::Upstream {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(err.details().unwrap(), "Bad Gateway");
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("TEST_ERROR"));
        assert!(json.contains("Test message"));
        assert!(!json.contains("details"));
    }
}
