//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the settings document (defaults on failure)
//! - Scan the routes directory into a frozen registry
//! - Assemble the HTTP server
//!
//! # Design Decisions
//! - Runs to completion before the listener accepts traffic
//! - Nothing here is fatal: bad settings and bad modules are logged and skipped

use std::path::Path;

use crate::config::{ServerConfig, Settings};
use crate::http::HttpServer;
use crate::introspection::RESERVED_PATHS;
use crate::routing::{HandlerCatalog, LoadOutcome, RouteLoader};

/// Scan `config.api.routes_dir` with the given catalog.
pub fn load_routes(config: &ServerConfig, catalog: &HandlerCatalog) -> LoadOutcome {
    let loader = RESERVED_PATHS
        .iter()
        .fold(RouteLoader::new(&config.api.prefix, catalog), |loader, path| {
            loader.reserve(path)
        });
    loader.scan(Path::new(&config.api.routes_dir))
}

/// Build a ready-to-run server from a validated configuration.
pub fn bootstrap(config: ServerConfig, catalog: &HandlerCatalog) -> HttpServer {
    let settings = Settings::load_or_default(Path::new(&config.api.settings_path));
    let outcome = load_routes(&config, catalog);

    tracing::info!(
        routes = outcome.registry.len(),
        load_errors = outcome.registry.errors().len(),
        handlers = ?catalog.names().collect::<Vec<_>>(),
        "Startup complete"
    );

    HttpServer::new(config, settings, outcome)
}
