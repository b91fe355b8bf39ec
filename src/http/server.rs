//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with introspection endpoints and loaded routes
//! - Wire up middleware (request ID, tracing, limits, security headers,
//!   panic capture, envelope)
//! - Route misses to the JSON 404 or the static fallback page
//! - Bind server to listener and shut down gracefully

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, on},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ServerConfig, Settings};
use crate::http::dispatch::RouteEndpoint;
use crate::http::envelope::{envelope_middleware, Envelope};
use crate::http::request::{request_span, RequestIdMaker};
use crate::http::response::{error_page, not_found_page, ApiError, ErrorResponder, UnhandledError};
use crate::introspection::{self, DOCS_PATH, HEALTH_PATH, STATS_PATH, STATUS_PATH};
use crate::lifecycle::signals::shutdown_signal;
use crate::routing::matcher::PrefixMatcher;
use crate::routing::{LoadOutcome, RouteRegistry};
use crate::security::headers::apply_security_headers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RouteRegistry>,
    pub settings: Arc<Settings>,
    pub errors: Arc<ErrorResponder>,
    pub prefix: PrefixMatcher,
    pub started_at: Instant,
    pub started: DateTime<Utc>,
}

impl AppState {
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// HTTP server hosting the discovered routes.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server from a finished route scan.
    pub fn new(config: ServerConfig, settings: Settings, outcome: LoadOutcome) -> Self {
        let prefix = PrefixMatcher::new(&config.api.prefix);
        let errors = Arc::new(ErrorResponder::new(
            config.api.error_code_prefix.clone(),
            prefix.join(DOCS_PATH),
        ));

        let state = AppState {
            registry: Arc::new(outcome.registry),
            settings: Arc::new(settings),
            errors,
            prefix,
            started_at: Instant::now(),
            started: Utc::now(),
        };

        let endpoints = outcome
            .routes
            .into_iter()
            .map(|loaded| {
                RouteEndpoint::new(
                    loaded,
                    Duration::from_millis(config.api.handler_timeout_ms),
                    state.errors.clone(),
                )
            })
            .collect();

        let router = Self::build_router(&config, state.clone(), endpoints);
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState, endpoints: Vec<RouteEndpoint>) -> Router {
        let prefix = state.prefix.clone();
        let envelope = Arc::new(Envelope::new(state.settings.clone()));
        let errors = state.errors.clone();

        let mut router = Router::new()
            .route(&prefix.join(DOCS_PATH), get(introspection::docs))
            .route(&prefix.join(STATUS_PATH), get(introspection::status))
            .route(&prefix.join(HEALTH_PATH), get(introspection::health))
            .route(&prefix.join(STATS_PATH), get(introspection::stats));

        for endpoint in endpoints {
            let route = endpoint.route();
            router = router.route(
                &route.route_path,
                on(route.method().filter(), move |request: Request| endpoint.dispatch(request)),
            );
        }

        let router = router
            .fallback(fallback_handler)
            .method_not_allowed_fallback(fallback_handler)
            .with_state(state);
        let router = response_stages(router, errors, envelope, prefix);

        // Outermost first.
        apply_security_headers(router, config.security.enable_headers).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(RequestIdMaker))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size)),
        )
    }

    /// The fully layered router (useful for in-process testing).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.state.prefix.prefix(),
            routes = self.state.registry.len(),
            load_errors = self.state.registry.errors().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Panic capture, envelope and static error pages, innermost first.
fn response_stages(
    router: Router,
    errors: Arc<ErrorResponder>,
    envelope: Arc<Envelope>,
    prefix: PrefixMatcher,
) -> Router {
    router
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            tracing::error!(panic = %panic_message(panic.as_ref()), "Unhandled panic");
            let mut response = errors.respond(&ApiError::Internal);
            response.extensions_mut().insert(UnhandledError);
            response
        }))
        .layer(middleware::from_fn_with_state(envelope, envelope_middleware))
        .layer(middleware::from_fn_with_state(prefix, error_pages))
}

/// Handles every request no route matched.
async fn fallback_handler(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    if state.prefix.matches(&path) {
        tracing::debug!(method = %request.method(), path = %path, "No route matched");
        state.errors.respond(&ApiError::NotFound {
            method: request.method().to_string(),
            path,
        })
    } else {
        not_found_page()
    }
}

/// Swaps unhandled-failure JSON for the static page outside the API prefix.
async fn error_pages(State(prefix): State<PrefixMatcher>, request: Request, next: Next) -> Response {
    let under_prefix = prefix.matches(request.uri().path());
    let response = next.run(request).await;

    if !under_prefix && response.extensions().get::<UnhandledError>().is_some() {
        return error_page();
    }
    response
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}
