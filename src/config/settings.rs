//! Process-wide settings document.
//!
//! Read once at startup from a JSON file and shared read-only (via `Arc`)
//! with the envelope middleware and the introspection endpoints. A missing
//! or malformed file is never fatal: the built-in defaults are used instead.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error raised while reading the settings document.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// External link advertised by the docs endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Link {
    pub name: String,
    pub url: String,
}

/// Identity of the deployment, merged into every JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Framework name reported in the envelope.
    pub name: String,
    pub version: String,
    pub description: String,
    /// Operator (developer) of this deployment.
    pub author: String,
    /// Decorative marker field carried by every envelope.
    pub marker: String,
    pub links: Vec<Link>,
    pub notifications: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "route-host".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Directory-discovered JSON API host".to_string(),
            author: "unknown".to_string(),
            marker: "🐞".to_string(),
            links: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

impl Settings {
    /// Read and parse the settings document.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the settings document, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => {
                tracing::info!(
                    path = %path.display(),
                    name = %settings.name,
                    version = %settings.version,
                    "Settings loaded"
                );
                settings
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load settings, using defaults"
                );
                Self::default()
            }
        }
    }
}
