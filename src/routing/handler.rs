//! Route handlers and the catalog manifests resolve them from.
//!
//! Handlers are compiled into the binary and registered under a name; a
//! route manifest only refers to that name. The catalog ships with two
//! built-ins:
//!
//! - `static`: replies with the manifest's `response` value (default `{}`)
//!   and optional numeric `status` (default 200)
//! - `echo`: reflects method, path, captures, query and body

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};

use crate::routing::registry::RegisteredRoute;

/// Error returned by a handler. Its text is logged, never sent to clients.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a handler invocation.
pub type HandlerResult = Result<Reply, HandlerError>;

/// Everything a handler gets to see about one request.
#[derive(Debug, Clone)]
pub struct RouteContext {
    pub method: Method,
    /// Request path as received, prefix included.
    pub path: String,
    /// Values of `{name}` captures.
    pub params: HashMap<String, String>,
    /// Decoded query string.
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    /// Parsed JSON body, when one was sent.
    pub body: Option<Value>,
    pub request_id: Option<String>,
    /// The route being served.
    pub route: Arc<RegisteredRoute>,
    /// Non-metadata fields of the route manifest.
    pub options: Arc<Map<String, Value>>,
}

/// A JSON reply produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// 200 with the given body.
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// A route handler: an asynchronous function of the request context.
pub trait RouteHandler: Send + Sync + 'static {
    fn call(&self, ctx: RouteContext) -> BoxFuture<'static, HandlerResult>;
}

/// Adapter turning an async closure into a [`RouteHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: RouteContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.f)(ctx))
    }
}

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RouteHandler>
where
    F: Fn(RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// Named handlers available to route manifests.
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    handlers: BTreeMap<String, Arc<dyn RouteHandler>>,
}

impl HandlerCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the `static` and `echo` handlers.
    pub fn with_builtins() -> Self {
        Self::new()
            .register("static", handler_fn(static_reply))
            .register("echo", handler_fn(echo))
    }

    /// Add (or replace) a named handler.
    pub fn register(mut self, name: impl Into<String>, handler: Arc<dyn RouteHandler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RouteHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

async fn static_reply(ctx: RouteContext) -> HandlerResult {
    let body = ctx
        .options
        .get("response")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let status = match ctx.options.get("status") {
        None => StatusCode::OK,
        Some(value) => value
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| format!("static handler: invalid status {}", value))?,
    };

    Ok(Reply::json(body).with_status(status))
}

async fn echo(ctx: RouteContext) -> HandlerResult {
    Ok(Reply::json(json!({
        "route": ctx.route.meta.name,
        "method": ctx.method.as_str(),
        "path": ctx.path,
        "params": ctx.params,
        "query": ctx.query,
        "body": ctx.body,
    })))
}
