//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use route_host::routing::HandlerError;
use route_host::{bootstrap, handler_fn, HandlerCatalog, HttpServer, ServerConfig};

pub const FIXTURE_ROUTES: usize = 11;
pub const FIXTURE_LOAD_ERRORS: usize = 2;
pub const FIXTURE_CATEGORIES: usize = 3;

/// Longer than the test handler timeout.
pub const LATE_DELAY: Duration = Duration::from_millis(400);

pub fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Config pointing at the fixture routes and settings.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.api.routes_dir = fixtures().join("routes").display().to_string();
    config.api.settings_path = fixtures().join("settings.json").display().to_string();
    config.api.handler_timeout_ms = 200;
    config
}

/// Built-ins plus the misbehaving handlers the failure fixtures refer to.
pub fn test_catalog() -> HandlerCatalog {
    HandlerCatalog::with_builtins()
        .register(
            "never",
            handler_fn(|_ctx| async {
                std::future::pending::<()>().await;
                Ok::<_, HandlerError>(route_host::Reply::json(Value::Null))
            }),
        )
        .register(
            "late",
            handler_fn(|_ctx| async {
                tokio::time::sleep(LATE_DELAY).await;
                Ok::<_, HandlerError>(route_host::Reply::json(Value::Null))
            }),
        )
        .register(
            "fail",
            handler_fn(|_ctx| async {
                Err::<route_host::Reply, HandlerError>("database password is hunter2".into())
            }),
        )
        .register(
            "panic",
            handler_fn(|_ctx| async {
                if true {
                    panic!("handler exploded");
                }
                Ok::<_, HandlerError>(route_host::Reply::json(Value::Null))
            }),
        )
}

pub fn test_server(config: ServerConfig) -> HttpServer {
    bootstrap(config, &test_catalog())
}

pub fn test_server_with(config: ServerConfig, catalog: &HandlerCatalog) -> HttpServer {
    bootstrap(config, catalog)
}

/// Scratch routes directory removed on drop.
pub struct TempRoutes(pub PathBuf);

impl TempRoutes {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("route-host-it-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    pub fn write(&self, name: &str, content: &str) {
        let path = self.0.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Fixture config pointed at this directory.
    pub fn config(&self) -> ServerConfig {
        let mut config = test_config();
        config.api.routes_dir = self.0.display().to_string();
        config
    }
}

impl Drop for TempRoutes {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

pub fn test_router() -> Router {
    test_server(test_config()).router()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn call(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
