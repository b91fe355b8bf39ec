//! Client-facing error responses.
//!
//! # Responsibilities
//! - Reduce every failure to a small fixed vocabulary of codes
//! - Render the structured JSON error body
//! - Render the static fallback pages served outside the API prefix
//!
//! # Design Decisions
//! - Internal error text never reaches the client; callers log it
//! - A deployment flavor may prefix every code (`LADYBUG_TIMEOUT`)

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error codes exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Timeout,
    InternalError,
    BadRequest,
    PayloadTooLarge,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
        }
    }
}

/// A failure as seen by the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no route for {method} {path}")]
    NotFound { method: String, path: String },
    #[error("handler did not respond within {0:?}")]
    Timeout(Duration),
    #[error("internal server error")]
    Internal,
    #[error("{0}")]
    BadRequest(String),
    #[error("request body too large")]
    PayloadTooLarge,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::NotFound { .. } => ErrorCode::NotFound,
            ApiError::Timeout(_) => ErrorCode::Timeout,
            ApiError::Internal => ErrorCode::InternalError,
            ApiError::BadRequest(_) => ErrorCode::BadRequest,
            ApiError::PayloadTooLarge => ErrorCode::PayloadTooLarge,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

/// Marker placed on responses produced for an unhandled failure (panic).
#[derive(Debug, Clone, Copy)]
pub struct UnhandledError;

/// Renders [`ApiError`]s for one deployment.
#[derive(Debug, Clone)]
pub struct ErrorResponder {
    code_prefix: Option<String>,
    docs_path: String,
}

impl ErrorResponder {
    pub fn new(code_prefix: Option<String>, docs_path: impl Into<String>) -> Self {
        Self {
            code_prefix,
            docs_path: docs_path.into(),
        }
    }

    /// Code text including the deployment flavor.
    pub fn code(&self, code: ErrorCode) -> String {
        match &self.code_prefix {
            Some(prefix) => format!("{}_{}", prefix, code.as_str()),
            None => code.as_str().to_string(),
        }
    }

    pub fn docs_path(&self) -> &str {
        &self.docs_path
    }

    /// JSON error response.
    pub fn respond(&self, error: &ApiError) -> Response {
        let mut body = json!({
            "status": "error",
            "code": self.code(error.code()),
            "message": error.to_string(),
        });

        if let ApiError::NotFound { path, .. } = error {
            body["path"] = json!(path);
            body["docs"] = json!(self.docs_path);
        }

        (error.status(), Json(body)).into_response()
    }
}

/// Static page for unknown paths outside the API prefix.
pub fn not_found_page() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html("<!DOCTYPE html><html><head><title>404 Not Found</title></head><body><h1>404</h1><p>The page you are looking for does not exist.</p></body></html>"),
    )
        .into_response()
}

/// Static page for unhandled failures outside the API prefix.
pub fn error_page() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html("<!DOCTYPE html><html><head><title>500 Internal Server Error</title></head><body><h1>500</h1><p>Something went wrong.</p></body></html>"),
    )
        .into_response()
}
