//! Path matching logic.
//!
//! # Responsibilities
//! - Decide whether a request path falls under the API prefix
//! - Check that a declared module path can be mounted on the router
//!
//! # Design Decisions
//! - Prefix matching is segment-aware: `/api` matches `/api/x`, not `/apix`
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Matches request paths under a fixed prefix.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Create a new prefix matcher. Trailing slashes are ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` is the prefix itself or lies below it.
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Join a module path onto the prefix.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.prefix, path)
        } else {
            format!("{}/{}", self.prefix, path)
        }
    }
}

/// Check that a path (without query string) can be registered as a route.
pub fn check_mountable(path: &str) -> Result<(), &'static str> {
    if !path.starts_with('/') {
        return Err("must start with '/'");
    }
    if path.contains("//") {
        return Err("must not contain empty segments");
    }

    let segments: Vec<&str> = path.split('/').skip(1).collect();
    for (i, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err("use '{name}' for captures");
        }

        let opens = segment.matches('{').count();
        let closes = segment.matches('}').count();
        if opens != closes || opens > 1 {
            return Err("captures must be a whole '{name}' segment");
        }
        if opens == 1 {
            if !(segment.starts_with('{') && segment.ends_with('}')) {
                return Err("captures must be a whole '{name}' segment");
            }
            let name = &segment[1..segment.len() - 1];
            let name = name.strip_prefix('*').map_or(name, |n| {
                if i + 1 != segments.len() {
                    ""
                } else {
                    n
                }
            });
            if name.is_empty() {
                return Err("captures need a name; wildcards only at the end");
            }
        }
    }
    Ok(())
}
