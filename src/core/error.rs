//! # Error Handling Module
//!
//! All failures in the gateway flow through [`OfferingError`], built with the
//! `thiserror` crate. Each variant carries enough context to render a useful
//! message, and the type knows how to map itself to an HTTP status code and a
//! structured JSON error body via `IntoResponse`.
//!
//! Two variants matter to callers:
//! - `InvalidArgument` is the only error a request handler ever surfaces; it
//!   means a raw filter token failed canonical validation.
//! - `UpstreamFetch` (and the `HttpClient`/`Json` conversions feeding it) is
//!   always absorbed inside the aggregator's degradation policy and never
//!   reaches a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the gateway
pub type OfferingResult<T> = Result<T, OfferingError>;

/// Comprehensive error types for the offering gateway
///
/// Each variant represents a different category of error. The `#[error("...")]`
/// attribute from `thiserror` implements `Display` with the given message.
#[derive(Debug, Error, Clone)]
pub enum OfferingError {
    /// A raw filter token failed canonical enumeration validation
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// An upstream pricing source could not be fetched or parsed
    #[error("Upstream fetch failed ({origin}): {message}")]
    UpstreamFetch { origin: &'static str, message: String },

    /// Configuration-related errors (invalid config, missing files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O errors (socket binding, file reads, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// HTTP client errors when calling upstream sources
    #[error("HTTP client error: {message}")]
    HttpClient { message: String },
}

impl OfferingError {
    /// Create an invalid-argument error for a named filter field
    pub fn invalid_argument<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    /// Create an upstream fetch error tagged with the originating source
    pub fn upstream<S: Into<String>>(origin: &'static str, message: S) -> Self {
        Self::UpstreamFetch {
            origin,
            message: message.into(),
        }
    }

    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamFetch { .. } => StatusCode::BAD_GATEWAY,
            Self::HttpClient { .. } => StatusCode::BAD_GATEWAY,
            Self::Json { .. } => StatusCode::BAD_GATEWAY,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a string representation of the error type for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::UpstreamFetch { .. } => "upstream_fetch_error",
            Self::Configuration { .. } => "configuration_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::HttpClient { .. } => "http_client_error",
        }
    }
}

impl From<std::io::Error> for OfferingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OfferingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for OfferingError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for OfferingError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpClient {
            message: err.to_string(),
        }
    }
}

/// Convert errors into HTTP responses with the appropriate status code
///
/// This lets request handlers return `OfferingResult<Json<T>>` directly and
/// have axum render failures as structured JSON error bodies.
impl IntoResponse for OfferingError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_response = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });

        (status, Json(error_response)).into_response()
    }
}
