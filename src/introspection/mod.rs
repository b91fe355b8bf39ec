//! Built-in read-only endpoints describing the host.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `<prefix>/docs` | Routes grouped by category, load errors, summary |
//! | `GET` | `<prefix>/status` | Identity, uptime, memory, route count |
//! | `GET` | `<prefix>/health` | Liveness with uptime and memory |
//! | `GET` | `<prefix>/stats` | Route, category and method counts |
//!
//! Every endpoint is computed from the frozen registry on each call.

pub mod handlers;
pub mod process;

pub use handlers::{docs, health, stats, status};

pub const DOCS_PATH: &str = "/docs";
pub const STATUS_PATH: &str = "/status";
pub const HEALTH_PATH: &str = "/health";
pub const STATS_PATH: &str = "/stats";

/// Paths module routes may not claim.
pub const RESERVED_PATHS: [&str; 4] = [DOCS_PATH, STATUS_PATH, HEALTH_PATH, STATS_PATH];
