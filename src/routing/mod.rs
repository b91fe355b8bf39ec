//! Route discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     routes directory
//!     → loader.rs (depth-first walk, one manifest per file)
//!     → module.rs (decode TOML/JSON, validate meta + handler)
//!     → handler.rs (resolve handler name in the catalog)
//!     → matcher.rs (mountable path, no conflicts)
//!     → registry.rs (RegisteredRoute / LoadError, frozen)
//!
//! Request time:
//!     registry read by introspection, handlers invoked by http::dispatch
//! ```
//!
//! # Design Decisions
//! - Routes loaded at startup, immutable at runtime
//! - A bad manifest is recorded and skipped, never fatal
//! - Handlers are compiled in; manifests only name them

pub mod handler;
pub mod loader;
pub mod matcher;
pub mod module;
pub mod registry;

pub use handler::{handler_fn, HandlerCatalog, HandlerError, HandlerResult, Reply, RouteContext, RouteHandler};
pub use loader::{LoadOutcome, LoadedRoute, RouteLoader};
pub use module::{HttpMethod, ManifestError, RouteMeta, RouteModule};
pub use registry::{LoadError, RegisteredRoute, RouteRegistry};
