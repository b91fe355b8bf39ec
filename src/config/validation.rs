//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check the API prefix is mountable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let prefix = &config.api.prefix;
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new("api.prefix", "must start with '/'"));
    } else if prefix.len() < 2 {
        errors.push(ValidationError::new("api.prefix", "must name a path segment"));
    } else if prefix.ends_with('/') {
        errors.push(ValidationError::new("api.prefix", "must not end with '/'"));
    }
    if prefix.contains(['{', '}', '?', '*', ':']) {
        errors.push(ValidationError::new(
            "api.prefix",
            "must be a literal path without captures or query",
        ));
    }

    if config.api.routes_dir.trim().is_empty() {
        errors.push(ValidationError::new("api.routes_dir", "must not be empty"));
    }

    if config.api.handler_timeout_ms == 0 {
        errors.push(ValidationError::new("api.handler_timeout_ms", "must be greater than zero"));
    }

    if let Some(flavor) = &config.api.error_code_prefix {
        let valid = !flavor.is_empty()
            && flavor
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            errors.push(ValidationError::new(
                "api.error_code_prefix",
                "must be upper-case letters, digits or '_'",
            ));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
