//! Directory-discovered JSON API host library.
//!
//! Route modules are manifest files found under a routes directory; each
//! names a compiled-in handler and is mounted under a common prefix. Every
//! JSON object response is wrapped in a standard envelope, and built-in
//! endpoints report on the loaded routes and the process.

pub mod config;
pub mod http;
pub mod introspection;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::{ServerConfig, Settings};
pub use http::HttpServer;
pub use lifecycle::{bootstrap, Shutdown};
pub use routing::{handler_fn, HandlerCatalog, Reply, RouteContext, RouteHandler};
