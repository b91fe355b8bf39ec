//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! settings file (JSON)
//!     → settings.rs (parse, fall back to defaults)
//!     → Settings shared via Arc with envelope + introspection
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Settings load failure is never fatal

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ApiConfig, Environment, ListenerConfig, LogFormat, ServerConfig};
pub use settings::Settings;
