//! Route module discovery.
//!
//! # Responsibilities
//! - Walk the routes directory depth-first
//! - Parse and validate every manifest
//! - Resolve handlers from the catalog
//! - Record one LoadError per rejected file, never abort the scan
//!
//! # Design Decisions
//! - Directory entries are visited in file-name order so rescans are deterministic
//! - Files are read fresh on every scan; there is no manifest cache
//! - Conflicting routes are rejected here so router construction cannot fail:
//!   every accepted path is also inserted into a `matchit` table, the same
//!   path router axum mounts routes on

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::routing::handler::{HandlerCatalog, RouteHandler};
use crate::routing::matcher::{check_mountable, PrefixMatcher};
use crate::routing::module::{HttpMethod, ManifestError, ManifestFormat, RouteModule};
use crate::routing::registry::{LoadError, RegisteredRoute, RouteRegistry};

/// Nested directories deeper than this are not visited.
const MAX_DEPTH: usize = 32;

/// A validated route together with its resolved handler.
#[derive(Clone)]
pub struct LoadedRoute {
    pub route: Arc<RegisteredRoute>,
    pub handler: Arc<dyn RouteHandler>,
    pub options: Arc<Map<String, Value>>,
}

/// Result of one scan.
pub struct LoadOutcome {
    pub registry: RouteRegistry,
    pub routes: Vec<LoadedRoute>,
}

/// Scans a directory for route manifests.
pub struct RouteLoader<'a> {
    prefix: PrefixMatcher,
    catalog: &'a HandlerCatalog,
    reserved: Vec<String>,
}

/// Bookkeeping for one scan.
struct ScanState {
    loaded: Vec<LoadedRoute>,
    errors: Vec<LoadError>,
    taken: HashMap<(HttpMethod, String), String>,
    /// Path table mirroring the router, one entry per distinct path.
    paths: matchit::Router<()>,
    mounted: HashSet<String>,
}

impl ScanState {
    fn new(reserved: &[String]) -> Self {
        let mut state = Self {
            loaded: Vec::new(),
            errors: Vec::new(),
            taken: HashMap::new(),
            paths: matchit::Router::new(),
            mounted: HashSet::new(),
        };
        for path in reserved {
            if state.paths.insert(path.as_str(), ()).is_ok() {
                state.mounted.insert(path.clone());
            }
        }
        state
    }
}

impl<'a> RouteLoader<'a> {
    pub fn new(prefix: &str, catalog: &'a HandlerCatalog) -> Self {
        Self {
            prefix: PrefixMatcher::new(prefix),
            catalog,
            reserved: Vec::new(),
        }
    }

    /// Keep module routes off a path mounted elsewhere (relative to the prefix).
    pub fn reserve(mut self, path: &str) -> Self {
        self.reserved.push(self.prefix.join(path));
        self
    }

    /// Scan `root` and build the registry.
    pub fn scan(&self, root: &Path) -> LoadOutcome {
        let mut state = ScanState::new(&self.reserved);

        tracing::info!(root = %root.display(), prefix = %self.prefix.prefix(), "Scanning for route modules");
        self.walk(root, 0, &mut state);

        tracing::info!(
            loaded = state.loaded.len(),
            errors = state.errors.len(),
            "Route scan complete"
        );

        let routes: Vec<_> = state.loaded.iter().map(|l| l.route.clone()).collect();
        LoadOutcome {
            registry: RouteRegistry::new(routes, state.errors),
            routes: state.loaded,
        }
    }

    fn walk(&self, dir: &Path, depth: usize, state: &mut ScanState) {
        if depth > MAX_DEPTH {
            record_error(state, dir, "directory nesting too deep");
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                record_error(state, dir, format!("cannot read directory: {}", e));
                return;
            }
        };

        let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    record_error(state, &path, format!("cannot stat: {}", e));
                    continue;
                }
            };

            if metadata.is_dir() {
                self.walk(&path, depth + 1, state);
                continue;
            }

            let format = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(ManifestFormat::from_extension);
            let Some(format) = format else {
                tracing::trace!(file = %path.display(), "Skipping non-manifest file");
                continue;
            };

            match self.load_file(&path, format, state) {
                Ok(loaded) => {
                    tracing::debug!(
                        file = %path.display(),
                        method = %loaded.route.method(),
                        path = %loaded.route.full_path,
                        name = %loaded.route.meta.name,
                        "Route registered"
                    );
                    state.loaded.push(loaded);
                }
                Err(e) => record_error(state, &path, e),
            }
        }
    }

    fn load_file(
        &self,
        path: &Path,
        format: ManifestFormat,
        state: &mut ScanState,
    ) -> Result<LoadedRoute, ManifestError> {
        let content = fs::read_to_string(path).map_err(|e| ManifestError::Read(e.to_string()))?;
        let document = format.decode(&content)?;
        let module = RouteModule::from_document(document, |name| self.catalog.contains(name))?;

        let relative = module.meta.route_path().to_string();
        check_mountable(&relative).map_err(|reason| ManifestError::InvalidPath {
            path: relative.clone(),
            reason,
        })?;

        let route_path = self.prefix.join(&relative);
        let method = module.meta.method;

        if self.reserved.contains(&route_path) {
            return Err(ManifestError::Duplicate {
                method,
                path: route_path,
            });
        }
        if state.taken.contains_key(&(method, route_path.clone())) {
            return Err(ManifestError::Duplicate {
                method,
                path: route_path,
            });
        }

        let handler = self
            .catalog
            .get(&module.handler)
            .ok_or_else(|| ManifestError::UnknownHandler(module.handler.clone()))?;

        if !state.mounted.contains(&route_path) {
            state
                .paths
                .insert(route_path.as_str(), ())
                .map_err(|e| ManifestError::Conflict {
                    path: route_path.clone(),
                    reason: e.to_string(),
                })?;
            state.mounted.insert(route_path.clone());
        }

        let full_path = match module.meta.query() {
            Some(query) => format!("{}?{}", route_path, query),
            None => route_path.clone(),
        };

        state
            .taken
            .insert((method, route_path.clone()), path.display().to_string());

        Ok(LoadedRoute {
            route: Arc::new(RegisteredRoute {
                meta: module.meta,
                route_path,
                full_path,
                source: path.to_path_buf(),
            }),
            handler,
            options: Arc::new(module.options),
        })
    }
}

fn record_error(state: &mut ScanState, path: &Path, error: impl ToString) {
    let error = LoadError::new(path, error);
    tracing::warn!(file = %error.file, error = %error.error, "Failed to load route module");
    metrics::record_load_error();
    state.errors.push(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("route-loader-{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn write(&self, name: &str, content: &str) {
            let path = self.0.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn module(path: &str, name: &str, method: &str) -> String {
        format!(
            "handler = \"static\"\n[meta]\npath = \"{}\"\nname = \"{}\"\nmethod = \"{}\"\n",
            path, name, method
        )
    }

    #[test]
    fn test_scan_recurses_and_skips_bad_files() {
        let dir = TempDir::new();
        dir.write("hello.toml", &module("/hello", "Hello", "get"));
        dir.write("nested/deeper/users.json", r#"{"handler": "echo", "meta": {"path": "/users/{id}", "name": "Users", "method": "POST", "category": "users"}}"#);
        dir.write("nested/no_name.toml", "handler = \"static\"\n[meta]\npath = \"/x\"\n");
        dir.write("bad_method.toml", &module("/y", "Y", "TRACE"));
        dir.write("broken.json", "{ nope");
        dir.write("README.md", "# not a module");

        let catalog = HandlerCatalog::with_builtins();
        let outcome = RouteLoader::new("/api", &catalog).scan(&dir.0);

        let mut paths: Vec<_> = outcome
            .registry
            .routes()
            .iter()
            .map(|r| (r.method(), r.route_path.clone()))
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                (HttpMethod::Get, "/api/hello".to_string()),
                (HttpMethod::Post, "/api/users/{id}".to_string()),
            ]
        );
        assert_eq!(outcome.routes.len(), 2);

        let errors = outcome.registry.errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.file.ends_with("no_name.toml") && e.error.contains("meta.name")));
        assert!(errors.iter().any(|e| e.file.ends_with("bad_method.toml") && e.error.contains("TRACE")));
        assert!(errors.iter().any(|e| e.file.ends_with("broken.json") && e.error.contains("parse")));
    }

    #[test]
    fn test_query_string_is_kept_for_display() {
        let dir = TempDir::new();
        dir.write("search.toml", &module("/search?q=term", "Search", "GET"));

        let catalog = HandlerCatalog::with_builtins();
        let outcome = RouteLoader::new("/ladybug", &catalog).scan(&dir.0);

        let route = &outcome.registry.routes()[0];
        assert_eq!(route.route_path, "/ladybug/search");
        assert_eq!(route.full_path, "/ladybug/search?q=term");
        assert_eq!(route.meta.path, "/search?q=term");
    }

    #[test]
    fn test_duplicates_and_conflicts_are_rejected() {
        let dir = TempDir::new();
        dir.write("a.toml", &module("/items/{id}", "A", "GET"));
        dir.write("b.toml", &module("/items/{id}", "B", "GET"));
        dir.write("c.toml", &module("/items/{item}", "C", "PUT"));
        dir.write("d.toml", &module("/items/{id}", "D", "DELETE"));
        dir.write("e.toml", &module("/docs", "E", "GET"));

        let catalog = HandlerCatalog::with_builtins();
        let outcome = RouteLoader::new("/api", &catalog).reserve("/docs").scan(&dir.0);

        let names: Vec<_> = outcome.registry.routes().iter().map(|r| r.meta.name.as_str()).collect();
        assert_eq!(names, vec!["A", "D"]);

        let errors: Vec<_> = outcome.registry.errors().iter().map(|e| e.error.as_str()).collect();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("already registered"));
        assert!(errors[1].contains("conflicts"));
        assert!(errors[2].contains("already registered"));
    }

    #[test]
    fn test_capture_and_catch_all_at_same_position_conflict() {
        let dir = TempDir::new();
        dir.write("a.toml", &module("/x/{id}", "Capture", "GET"));
        dir.write("b.toml", &module("/x/{*rest}", "CatchAll", "POST"));
        dir.write("c.toml", &module("/x/{id}", "SamePath", "DELETE"));

        let catalog = HandlerCatalog::with_builtins();
        let outcome = RouteLoader::new("/api", &catalog).scan(&dir.0);

        let names: Vec<_> = outcome.registry.routes().iter().map(|r| r.meta.name.as_str()).collect();
        assert_eq!(names, vec!["Capture", "SamePath"]);

        let errors = outcome.registry.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].file.ends_with("b.toml"));
        assert!(errors[0].error.contains("/api/x/{*rest}"));
    }

    #[test]
    fn test_unknown_handler_and_bad_path() {
        let dir = TempDir::new();
        dir.write("a.toml", "handler = \"missing\"\n[meta]\npath = \"/a\"\nname = \"A\"\n");
        dir.write("b.toml", &module("/users/:id", "B", "GET"));

        let catalog = HandlerCatalog::with_builtins();
        let outcome = RouteLoader::new("/api", &catalog).scan(&dir.0);

        assert!(outcome.registry.is_empty());
        let errors = outcome.registry.errors();
        assert!(errors[0].error.contains("'missing' is not registered"));
        assert!(errors[1].error.contains("not a mountable route"));
    }

    #[test]
    fn test_missing_root_is_recorded() {
        let catalog = HandlerCatalog::with_builtins();
        let outcome = RouteLoader::new("/api", &catalog).scan(Path::new("/no/such/routes/dir"));

        assert!(outcome.registry.is_empty());
        assert_eq!(outcome.registry.errors().len(), 1);
        assert!(outcome.registry.errors()[0].error.contains("cannot read directory"));
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let dir = TempDir::new();
        dir.write("one.toml", &module("/one", "One", "GET"));
        dir.write("sub/two.toml", &module("/two", "Two", "POST"));

        let catalog = HandlerCatalog::with_builtins();
        let loader = RouteLoader::new("/api", &catalog);
        let first = loader.scan(&dir.0);
        let second = loader.scan(&dir.0);

        let first: Vec<_> = first.registry.routes().iter().map(|r| r.as_ref().clone()).collect();
        let second: Vec<_> = second.registry.routes().iter().map(|r| r.as_ref().clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_latest_file_content_wins() {
        let dir = TempDir::new();
        dir.write("item.toml", &module("/item", "Before", "GET"));

        let catalog = HandlerCatalog::with_builtins();
        let loader = RouteLoader::new("/api", &catalog);
        assert_eq!(loader.scan(&dir.0).registry.routes()[0].meta.name, "Before");

        dir.write("item.toml", &module("/item", "After", "GET"));
        assert_eq!(loader.scan(&dir.0).registry.routes()[0].meta.name, "After");
    }
}
