//! Response envelope.
//!
//! Every JSON object leaving the server is merged with the standard fields,
//! in increasing precedence:
//!
//! ```text
//! {status: "success"}
//!     → {operator, framework, version, timestamp, marker}   (from Settings)
//!     → fields emitted by the handler                        (always win)
//! ```
//!
//! Arrays, scalars, `null` and non-JSON bodies pass through untouched. The
//! [`Enveloped`] extension marks a decorated response so a second pass is a
//! no-op.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::config::Settings;

/// Response extension set once the envelope has been applied.
#[derive(Debug, Clone, Copy)]
pub struct Enveloped;

/// Builds envelope fields from the process settings.
#[derive(Debug, Clone)]
pub struct Envelope {
    settings: Arc<Settings>,
}

impl Envelope {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Standard fields for a response emitted now.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("status".into(), Value::from("success"));
        fields.insert("operator".into(), Value::from(self.settings.author.clone()));
        fields.insert("framework".into(), Value::from(self.settings.name.clone()));
        fields.insert("version".into(), Value::from(self.settings.version.clone()));
        fields.insert(
            "timestamp".into(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields.insert("marker".into(), Value::from(self.settings.marker.clone()));
        fields
    }

    /// Merge the envelope into a body. Non-object bodies are returned as-is.
    pub fn wrap(&self, body: Value) -> Value {
        match body {
            Value::Object(emitted) => {
                let mut merged = self.fields();
                merged.extend(emitted);
                Value::Object(merged)
            }
            other => other,
        }
    }

    /// Decorate a finished response.
    pub async fn decorate(&self, response: Response) -> Response {
        if response.extensions().get::<Enveloped>().is_some() || !is_json(&response) {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to buffer response body for envelope");
                return Response::from_parts(parts, Body::empty());
            }
        };

        let body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(value @ Value::Object(_)) => match serde_json::to_vec(&self.wrap(value)) {
                Ok(encoded) => {
                    parts.headers.remove(header::CONTENT_LENGTH);
                    Body::from(encoded)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode enveloped body");
                    Body::from(bytes)
                }
            },
            _ => Body::from(bytes),
        };

        parts.extensions.insert(Enveloped);
        Response::from_parts(parts, body)
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Middleware applying the envelope to every response.
pub async fn envelope_middleware(
    State(envelope): State<Arc<Envelope>>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let response = next.run(request).await;
    envelope.decorate(response).await
}
