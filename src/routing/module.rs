//! Route module manifests.
//!
//! A route module is one file on disk pairing metadata with the name of a
//! handler from the [`HandlerCatalog`](crate::routing::handler::HandlerCatalog):
//!
//! ```toml
//! handler = "static"
//! response = { message = "Hello, world!" }
//!
//! [meta]
//! path = "/example/hello"
//! name = "Hello API"
//! method = "GET"
//! category = "example"
//! ```
//!
//! The same shape is accepted as JSON. Keys other than `meta` and
//! `handler` are kept as opaque handler options.

use std::fmt;
use std::str::FromStr;

use axum::routing::MethodFilter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default category for modules that do not declare one.
pub const DEFAULT_CATEGORY: &str = "general";

/// HTTP methods a route module may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    pub fn filter(&self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Delete => MethodFilter::DELETE,
            HttpMethod::Patch => MethodFilter::PATCH,
            HttpMethod::Head => MethodFilter::HEAD,
            HttpMethod::Options => MethodFilter::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ManifestError;

    /// Case-insensitive parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ManifestError::InvalidMethod(s.to_string()))
    }
}

/// Why a manifest was rejected. Each variant maps to one validation step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read module: {0}")]
    Read(String),
    #[error("failed to parse module: {0}")]
    Parse(String),
    #[error("module must be a table of fields")]
    NotATable,
    #[error("module is missing a 'meta' object")]
    MissingMeta,
    #[error("module 'meta' must be an object")]
    MetaNotObject,
    #[error("module is missing a 'handler'")]
    MissingHandler,
    #[error("module 'handler' must be the name of a registered handler")]
    HandlerNotName,
    #[error("module handler '{0}' is not registered")]
    UnknownHandler(String),
    #[error("meta.path is required and must be a non-empty string")]
    MissingPath,
    #[error("meta.name is required and must be a non-empty string")]
    MissingName,
    #[error("meta.method '{0}' is not one of GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS")]
    InvalidMethod(String),
    #[error("invalid metadata: {0}")]
    InvalidMeta(String),
    #[error("meta.path '{path}' is not a mountable route: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("route {method} {path} is already registered")]
    Duplicate { method: HttpMethod, path: String },
    #[error("route {path} conflicts with a registered route: {reason}")]
    Conflict { path: String, reason: String },
}

/// Validated metadata of a route module.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    /// Declared path, relative to the API prefix; may carry a query string.
    pub path: String,
    pub name: String,
    pub method: HttpMethod,
    pub description: Option<String>,
    pub category: String,
    pub author: Option<String>,
    pub version: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    /// Carried through untouched; nothing enforces it.
    pub rate_limit: Option<Value>,
    pub authentication: bool,
}

/// Optional metadata fields, type-checked through serde.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptionalMeta {
    description: Option<String>,
    category: Option<String>,
    author: Option<String>,
    version: Option<String>,
    tags: Vec<String>,
    deprecated: bool,
    rate_limit: Option<Value>,
    authentication: bool,
}

impl RouteMeta {
    /// Path without its query string.
    pub fn route_path(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(p, _)| p)
    }

    /// Query string declared alongside the path, if any.
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, q)| q).filter(|q| !q.is_empty())
    }
}

/// A parsed route module, handler not yet resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteModule {
    pub meta: RouteMeta,
    pub handler: String,
    /// Every other top-level field of the manifest.
    pub options: Map<String, Value>,
}

/// Supported manifest encodings, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
}

impl ManifestFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(ManifestFormat::Toml),
            "json" => Some(ManifestFormat::Json),
            _ => None,
        }
    }

    /// Decode file content into a JSON document.
    pub fn decode(&self, content: &str) -> Result<Value, ManifestError> {
        match self {
            ManifestFormat::Toml => toml::from_str::<Value>(content)
                .map_err(|e| ManifestError::Parse(e.message().to_string())),
            ManifestFormat::Json => {
                serde_json::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))
            }
        }
    }
}

impl RouteModule {
    /// Validate a decoded manifest.
    ///
    /// `handler_known` decides whether the declared handler name resolves.
    /// Checks run in a fixed order and stop at the first violation.
    pub fn from_document<F>(document: Value, handler_known: F) -> Result<Self, ManifestError>
    where
        F: Fn(&str) -> bool,
    {
        let Value::Object(mut document) = document else {
            return Err(ManifestError::NotATable);
        };

        let meta = match document.remove("meta") {
            None | Some(Value::Null) => return Err(ManifestError::MissingMeta),
            Some(Value::Object(meta)) => meta,
            Some(_) => return Err(ManifestError::MetaNotObject),
        };

        let handler = match document.remove("handler") {
            None | Some(Value::Null) => return Err(ManifestError::MissingHandler),
            Some(Value::String(name)) => name,
            Some(_) => return Err(ManifestError::HandlerNotName),
        };
        if !handler_known(&handler) {
            return Err(ManifestError::UnknownHandler(handler));
        }

        let meta = parse_meta(meta)?;

        Ok(Self {
            meta,
            handler,
            options: document,
        })
    }
}

fn required_str(meta: &Map<String, Value>, key: &str) -> Option<String> {
    meta.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_meta(mut meta: Map<String, Value>) -> Result<RouteMeta, ManifestError> {
    let path = required_str(&meta, "path").ok_or(ManifestError::MissingPath)?;
    let name = required_str(&meta, "name").ok_or(ManifestError::MissingName)?;

    let method = match meta.remove("method") {
        None | Some(Value::Null) => HttpMethod::default(),
        Some(Value::String(m)) => m.parse()?,
        Some(other) => return Err(ManifestError::InvalidMethod(other.to_string())),
    };

    meta.remove("path");
    meta.remove("name");
    let optional: OptionalMeta = serde_json::from_value(Value::Object(meta))
        .map_err(|e| ManifestError::InvalidMeta(e.to_string()))?;

    Ok(RouteMeta {
        path,
        name,
        method,
        description: optional.description,
        category: optional
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        author: optional.author,
        version: optional.version,
        tags: optional.tags,
        deprecated: optional.deprecated,
        rate_limit: optional.rate_limit,
        authentication: optional.authentication,
    })
}
