//! Security response headers.
//!
//! # Responsibilities
//! - Add `x-content-type-options`, `x-frame-options` and `referrer-policy`
//!
//! # Design Decisions
//! - Headers a handler already set are left alone
//! - Disabled entirely by `security.enable_headers = false`

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

/// Layer the security headers onto a router when enabled.
pub fn apply_security_headers(router: Router, enabled: bool) -> Router {
    if !enabled {
        return router;
    }

    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
}
