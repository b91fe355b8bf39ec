//! Per-route dispatch.
//!
//! # Responsibilities
//! - Build the [`RouteContext`] (captures, query, JSON body, request id)
//! - Run the handler on its own task against the handler deadline
//! - Turn handler failures and panics into generic 500s
//! - Record request metrics
//!
//! # Design Decisions
//! - The deadline only short-circuits the client response; the handler task
//!   keeps running and its late result is dropped, never written
//! - Handler error text is logged, never returned

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, Request};
use axum::http::{header, request::Parts, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::RequestPartsExt;
use http_body_util::LengthLimitError;
use serde_json::Value;

use crate::http::request::X_REQUEST_ID;
use crate::http::response::{ApiError, ErrorResponder};
use crate::observability::metrics;
use crate::routing::{LoadedRoute, RegisteredRoute, RouteContext};

/// A mounted route: the loaded module plus what dispatch needs.
#[derive(Clone)]
pub struct RouteEndpoint {
    loaded: LoadedRoute,
    timeout: Duration,
    errors: Arc<ErrorResponder>,
}

impl RouteEndpoint {
    pub fn new(loaded: LoadedRoute, timeout: Duration, errors: Arc<ErrorResponder>) -> Self {
        Self {
            loaded,
            timeout,
            errors,
        }
    }

    pub fn route(&self) -> Arc<RegisteredRoute> {
        self.loaded.route.clone()
    }

    /// Serve one request.
    pub async fn dispatch(self, request: Request) -> Response {
        let start_time = Instant::now();
        let route = self.loaded.route.clone();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let response = match self.build_context(request).await {
            Ok(ctx) => self.invoke(ctx).await,
            Err(e) => {
                tracing::debug!(route = %route.route_path, error = %e, "Rejected request");
                self.errors.respond(&e)
            }
        };

        tracing::debug!(
            method = %method,
            path = %path,
            route = %route.meta.name,
            status = response.status().as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Route served"
        );
        metrics::record_request(
            method.as_str(),
            response.status().as_u16(),
            &route.route_path,
            start_time,
        );
        response
    }

    async fn build_context(&self, request: Request) -> Result<RouteContext, ApiError> {
        let (mut parts, body) = request.into_parts();

        let params = extract_params(&mut parts).await;
        let query = parts
            .extract::<Query<HashMap<String, String>>>()
            .await
            .map(|Query(q)| q)
            .unwrap_or_default();

        let bytes = read_body(body).await?;
        let body = parse_body(&parts.headers, &bytes)?;

        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(RouteContext {
            method: parts.method,
            path: parts.uri.path().to_string(),
            params,
            query,
            headers: parts.headers,
            body,
            request_id,
            route: self.loaded.route.clone(),
            options: self.loaded.options.clone(),
        })
    }

    async fn invoke(&self, ctx: RouteContext) -> Response {
        let route = self.loaded.route.clone();
        let handler = self.loaded.handler.clone();
        let timed_out = Arc::new(AtomicBool::new(false));

        let task = {
            let timed_out = timed_out.clone();
            let route = route.clone();
            tokio::spawn(async move {
                let outcome = handler.call(ctx).await;
                if timed_out.load(Ordering::Acquire) {
                    tracing::warn!(
                        route = %route.route_path,
                        ok = outcome.is_ok(),
                        "Handler finished after its deadline, result discarded"
                    );
                }
                outcome
            })
        };

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(reply))) => reply.into_response(),
            Ok(Ok(Err(e))) => {
                tracing::error!(route = %route.route_path, error = %e, "Handler failed");
                self.errors.respond(&ApiError::Internal)
            }
            Ok(Err(join_error)) => {
                tracing::error!(route = %route.route_path, error = %join_error, "Handler panicked");
                self.errors.respond(&ApiError::Internal)
            }
            Err(_) => {
                timed_out.store(true, Ordering::Release);
                tracing::warn!(
                    route = %route.route_path,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Handler timed out"
                );
                metrics::record_timeout(&route.route_path);
                self.errors.respond(&ApiError::Timeout(self.timeout))
            }
        }
    }
}

async fn extract_params(parts: &mut Parts) -> HashMap<String, String> {
    parts
        .extract::<Path<HashMap<String, String>>>()
        .await
        .map(|Path(params)| params)
        .unwrap_or_default()
}

/// Buffer the request body. Only the configured size limit yields a 413.
async fn read_body(body: Body) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
        if exceeds_limit(&e) {
            ApiError::PayloadTooLarge
        } else {
            tracing::debug!(error = %e, "Failed to read request body");
            ApiError::BadRequest("failed to read request body".to_string())
        }
    })
}

fn exceeds_limit(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Decode a JSON request body. Empty bodies and non-JSON content types yield `None`.
fn parse_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Option<Value>, ApiError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().ends_with("json"))
        .unwrap_or(false);
    if !is_json {
        return Ok(None);
    }

    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        headers
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(&json_headers(), b"").unwrap(), None);
        assert_eq!(parse_body(&json_headers(), br#"{"a":1}"#).unwrap(), Some(json!({"a": 1})));
        assert_eq!(parse_body(&HeaderMap::new(), b"a=1").unwrap(), None);
        assert!(matches!(
            parse_body(&json_headers(), b"{oops"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_body_over_limit_is_payload_too_large() {
        let body = Body::new(http_body_util::Limited::new(Body::from("0123456789"), 4));
        assert!(matches!(read_body(body).await, Err(ApiError::PayloadTooLarge)));
    }

    #[tokio::test]
    async fn test_interrupted_body_is_bad_request() {
        let chunks = vec![
            Ok(Bytes::from_static(b"{\"partial\"")),
            Err(std::io::Error::other("connection reset")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));
        assert!(matches!(read_body(body).await, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_complete_body_is_read() {
        let bytes = read_body(Body::from("hello")).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }
}
