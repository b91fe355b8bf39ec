//! Route registry.
//!
//! # Responsibilities
//! - Store the routes and load errors produced by a scan
//! - Answer the read-only questions introspection asks
//!
//! # Design Decisions
//! - Built once during startup, immutable afterwards (shared via Arc, no locks)
//! - Categories and method counts use ordered maps for stable output

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::routing::module::{HttpMethod, RouteMeta};

/// A route that passed validation and is mounted on the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredRoute {
    #[serde(flatten)]
    pub meta: RouteMeta,
    /// Prefixed path the router dispatches on (no query string).
    #[serde(skip)]
    pub route_path: String,
    /// Prefixed path for display, declared query string re-attached.
    pub full_path: String,
    /// Manifest the route was loaded from.
    #[serde(skip)]
    pub source: PathBuf,
}

impl RegisteredRoute {
    pub fn method(&self) -> HttpMethod {
        self.meta.method
    }
}

/// A manifest that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadError {
    pub file: String,
    pub error: String,
    #[serde(serialize_with = "iso8601")]
    pub timestamp: DateTime<Utc>,
}

impl LoadError {
    pub fn new(file: &Path, error: impl ToString) -> Self {
        Self {
            file: file.display().to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

fn iso8601<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Routes grouped under one category.
#[derive(Debug, Serialize)]
pub struct Category<'a> {
    pub name: &'a str,
    pub count: usize,
    pub items: Vec<&'a RegisteredRoute>,
}

/// Everything a scan produced.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<Arc<RegisteredRoute>>,
    errors: Vec<LoadError>,
}

impl RouteRegistry {
    pub fn new(routes: Vec<Arc<RegisteredRoute>>, errors: Vec<LoadError>) -> Self {
        Self { routes, errors }
    }

    pub fn routes(&self) -> &[Arc<RegisteredRoute>] {
        &self.routes
    }

    pub fn errors(&self) -> &[LoadError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes grouped by category, categories in name order.
    pub fn categories(&self) -> Vec<Category<'_>> {
        let mut grouped: BTreeMap<&str, Vec<&RegisteredRoute>> = BTreeMap::new();
        for route in &self.routes {
            grouped
                .entry(route.meta.category.as_str())
                .or_default()
                .push(route.as_ref());
        }

        grouped
            .into_iter()
            .map(|(name, items)| Category {
                name,
                count: items.len(),
                items,
            })
            .collect()
    }

    pub fn category_count(&self) -> usize {
        self.categories().len()
    }

    /// Number of routes per HTTP method.
    pub fn method_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for route in &self.routes {
            *counts.entry(route.method().as_str()).or_insert(0) += 1;
        }
        counts
    }
}
