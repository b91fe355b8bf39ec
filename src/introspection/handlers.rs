use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::config::settings::Link;
use crate::http::server::AppState;
use crate::introspection::process::{memory_snapshot, runtime_version, MemorySnapshot, Uptime};
use crate::routing::registry::{Category, LoadError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsSummary {
    pub total_endpoints: usize,
    pub total_categories: usize,
    pub load_errors: usize,
    pub uptime: Uptime,
}

#[derive(Serialize)]
pub struct Docs<'a> {
    pub categories: Vec<Category<'a>>,
    pub summary: DocsSummary,
    pub errors: &'a [LoadError],
    pub links: &'a [Link],
    pub notifications: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub status: &'static str,
    pub framework: String,
    pub version: String,
    pub operator: String,
    pub uptime: Uptime,
    pub memory: MemorySnapshot,
    pub total_routes: usize,
    pub started: String,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime: Uptime,
    pub memory: MemorySnapshot,
    pub timestamp: String,
    pub version: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub total_routes: usize,
    pub load_errors: usize,
    pub total_categories: usize,
    pub methods: BTreeMap<&'static str, usize>,
    pub uptime: Uptime,
    pub runtime: String,
    pub operator: String,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a serializable body, falling back to an empty object.
fn to_json<T: Serialize>(body: &T) -> Json<Value> {
    match serde_json::to_value(body) {
        Ok(value) => Json(value),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize introspection body");
            Json(json!({}))
        }
    }
}

pub async fn docs(State(state): State<AppState>) -> Json<Value> {
    let registry = &state.registry;
    let categories = registry.categories();

    let docs = Docs {
        summary: DocsSummary {
            total_endpoints: registry.len(),
            total_categories: categories.len(),
            load_errors: registry.errors().len(),
            uptime: state.uptime().into(),
        },
        categories,
        errors: registry.errors(),
        links: &state.settings.links,
        notifications: &state.settings.notifications,
    };

    to_json(&docs)
}

pub async fn status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        status: "online",
        framework: state.settings.name.clone(),
        version: state.settings.version.clone(),
        operator: state.settings.author.clone(),
        uptime: state.uptime().into(),
        memory: memory_snapshot().await,
        total_routes: state.registry.len(),
        started: state.started.to_rfc3339_opts(SecondsFormat::Secs, true),
        timestamp: now(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        uptime: state.uptime().into(),
        memory: memory_snapshot().await,
        timestamp: now(),
        version: state.settings.version.clone(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<RouteStats> {
    let registry = &state.registry;
    Json(RouteStats {
        total_routes: registry.len(),
        load_errors: registry.errors().len(),
        total_categories: registry.category_count(),
        methods: registry.method_counts(),
        uptime: state.uptime().into(),
        runtime: runtime_version(),
        operator: state.settings.author.clone(),
    })
}
