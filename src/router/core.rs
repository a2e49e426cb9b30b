//! Router core module - hot path for request routing.
//!
//! [`RouteTreeBuilder`] collects registrations at startup; [`RouteTreeBuilder::build`]
//! freezes them into an immutable [`RouteTree`]. After that only the match cache
//! is written to, and concurrent insertion of the same key is idempotent.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use dashmap::DashMap;
use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use super::radix::{CaptureVec, RadixNode, Segment};
use crate::error::ConfigError;
use crate::runtime_config::RuntimeConfig;

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter storage for the hot path; names are shared with the route table.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// HTTP methods a route may be registered for.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Strategy a route was registered with.
///
/// Variants are listed in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Trie route; may contain `{name}` segments or be purely literal
    Template,
    /// Identical full path
    Exact,
    /// Path starts with the stored prefix
    Prefix,
    /// Path contains the stored substring
    Contains,
    /// Last resort for a method
    Fallback,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Template => "template",
            MatchKind::Exact => "exact",
            MatchKind::Prefix => "prefix",
            MatchKind::Contains => "contains",
            MatchKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered route. Immutable once the tree is built.
pub struct Route<H> {
    pub method: Method,
    pub kind: MatchKind,
    /// Pattern, literal, prefix or substring exactly as registered
    pub pattern: Arc<str>,
    /// Template variable names in path order (empty for non-template routes)
    pub param_names: Arc<[Arc<str>]>,
    pub handler: H,
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("kind", &self.kind)
            .field("pattern", &self.pattern)
            .field("param_names", &self.param_names)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful lookup.
///
/// Shared through `Arc`: repeated lookups of the same `(method, path)` return
/// the very same object from the cache.
pub struct MatchResult<H> {
    pub route: Arc<Route<H>>,
    /// Path variables bound by template segments (percent-decoded)
    pub path_params: ParamVec,
}

impl<H> MatchResult<H> {
    #[inline]
    pub fn handler(&self) -> &H {
        &self.route.handler
    }

    /// Get a path parameter by name.
    ///
    /// "Last write wins" when a pattern repeats a variable name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl<H> fmt::Debug for MatchResult<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchResult")
            .field("route", &self.route)
            .field("path_params", &self.path_params)
            .finish()
    }
}

type CacheKey = (Method, String);

/// Startup-time registration surface for a [`RouteTree`].
pub struct RouteTreeBuilder<H> {
    root: RadixNode<H>,
    exact: HashMap<Method, HashMap<String, Arc<Route<H>>>>,
    prefix: HashMap<Method, Vec<Arc<Route<H>>>>,
    contains: HashMap<Method, Vec<Arc<Route<H>>>>,
    fallback: HashMap<Method, Arc<Route<H>>>,
    route_count: usize,
}

impl<H> Default for RouteTreeBuilder<H> {
    fn default() -> Self {
        Self {
            root: RadixNode::default(),
            exact: HashMap::new(),
            prefix: HashMap::new(),
            contains: HashMap::new(),
            fallback: HashMap::new(),
            route_count: 0,
        }
    }
}

impl<H> RouteTreeBuilder<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trie route. `{name}` segments bind path variables.
    pub fn add_route(&mut self, pattern: &str, method: Method, handler: H) -> Result<(), ConfigError> {
        check_method(&method, pattern)?;
        let segments = parse_pattern(pattern)?;
        let param_names: Arc<[Arc<str>]> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Template(name) => Some(Arc::from(*name)),
                Segment::Literal(_) => None,
            })
            .collect();
        let route = Arc::new(Route {
            method,
            kind: MatchKind::Template,
            pattern: Arc::from(pattern),
            param_names,
            handler,
        });
        let replaced = self.root.insert(&segments, Arc::clone(&route));
        self.note_registration(&route, replaced.is_some());
        Ok(())
    }

    /// Register a route matched only by the identical full path.
    pub fn add_exact_route(&mut self, path: &str, method: Method, handler: H) -> Result<(), ConfigError> {
        check_method(&method, path)?;
        let route = flat_route(MatchKind::Exact, path, method, handler);
        let replaced = self
            .exact
            .entry(route.method.clone())
            .or_default()
            .insert(path.to_string(), Arc::clone(&route));
        self.note_registration(&route, replaced.is_some());
        Ok(())
    }

    /// Register a route matched when the path starts with `prefix`.
    pub fn add_prefix_route(&mut self, prefix: &str, method: Method, handler: H) -> Result<(), ConfigError> {
        check_method(&method, prefix)?;
        let route = flat_route(MatchKind::Prefix, prefix, method, handler);
        let replaced = upsert_ordered(self.prefix.entry(route.method.clone()).or_default(), &route);
        self.note_registration(&route, replaced);
        Ok(())
    }

    /// Register a route matched when the path contains `needle` anywhere.
    pub fn add_contains_route(&mut self, needle: &str, method: Method, handler: H) -> Result<(), ConfigError> {
        check_method(&method, needle)?;
        let route = flat_route(MatchKind::Contains, needle, method, handler);
        let replaced = upsert_ordered(self.contains.entry(route.method.clone()).or_default(), &route);
        self.note_registration(&route, replaced);
        Ok(())
    }

    /// Handler used for `method` when nothing else matches.
    pub fn set_fallback(&mut self, method: Method, handler: H) -> Result<(), ConfigError> {
        check_method(&method, "*")?;
        let route = flat_route(MatchKind::Fallback, "*", method, handler);
        let replaced = self.fallback.insert(route.method.clone(), Arc::clone(&route));
        self.note_registration(&route, replaced.is_some());
        Ok(())
    }

    fn note_registration(&mut self, route: &Route<H>, replaced: bool) {
        if replaced {
            warn!(
                method = %route.method,
                kind = %route.kind,
                pattern = %route.pattern,
                "Replaced existing route registration"
            );
        } else {
            self.route_count += 1;
        }
    }

    /// Freeze the registrations into an immutable tree.
    #[must_use]
    pub fn build(self, config: &RuntimeConfig) -> RouteTree<H> {
        let cache = config
            .match_cache_enabled
            .then(|| DashMap::with_capacity(config.match_cache_capacity.min(1024)));

        info!(
            routes_count = self.route_count,
            match_cache = config.match_cache_enabled,
            match_cache_capacity = config.match_cache_capacity,
            routing_algorithm = "segment_trie",
            "Routing table loaded"
        );

        RouteTree {
            root: self.root,
            exact: self.exact,
            prefix: self.prefix,
            contains: self.contains,
            fallback: self.fallback,
            route_count: self.route_count,
            cache,
            cache_capacity: config.match_cache_capacity,
        }
    }
}

/// Immutable route table with a concurrent match cache.
///
/// Lookup order is fixed: trie, flat exact, prefix, contains, fallback.
pub struct RouteTree<H> {
    root: RadixNode<H>,
    exact: HashMap<Method, HashMap<String, Arc<Route<H>>>>,
    prefix: HashMap<Method, Vec<Arc<Route<H>>>>,
    contains: HashMap<Method, Vec<Arc<Route<H>>>>,
    fallback: HashMap<Method, Arc<Route<H>>>,
    route_count: usize,
    /// `None` when caching is disabled; cached `None` values record misses
    cache: Option<DashMap<CacheKey, Option<Arc<MatchResult<H>>>>>,
    cache_capacity: usize,
}

impl<H> RouteTree<H> {
    /// Resolve `(method, path)` to a route.
    ///
    /// Returns `None` when nothing matches and no fallback is registered for
    /// `method`. Never fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use http::Method;
    /// use waypoint::router::RouteTreeBuilder;
    /// use waypoint::runtime_config::RuntimeConfig;
    ///
    /// let mut builder = RouteTreeBuilder::new();
    /// builder.add_route("/users/{id}", Method::GET, "get_user").unwrap();
    /// let tree = builder.build(&RuntimeConfig::default());
    ///
    /// let m = tree.match_route(&Method::GET, "/users/42").unwrap();
    /// assert_eq!(*m.handler(), "get_user");
    /// assert_eq!(m.get_path_param("id"), Some("42"));
    /// ```
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<Arc<MatchResult<H>>> {
        if let Some(cache) = &self.cache {
            // RT0: Cache hit
            if let Some(hit) = cache.get(&(method.clone(), path.to_string())) {
                trace!(method = %method, path = %path, matched = hit.is_some(), "Route cache hit");
                return hit.value().clone();
            }
        }

        // RT1: Route match attempt
        let match_start = Instant::now();
        let outcome = self.resolve(method, path).map(Arc::new);
        let duration_us = match_start.elapsed().as_micros();

        match &outcome {
            // RT3: Route matched
            Some(m) => debug!(
                method = %method,
                path = %path,
                kind = %m.route.kind,
                route_pattern = %m.route.pattern,
                path_params = ?m.path_params,
                duration_us = duration_us,
                "Route matched"
            ),
            // RT4: No route found
            None => debug!(
                method = %method,
                path = %path,
                duration_us = duration_us,
                "No route matched"
            ),
        }

        if let Some(cache) = &self.cache {
            if cache.len() < self.cache_capacity {
                cache
                    .entry((method.clone(), path.to_string()))
                    .or_insert_with(|| outcome.clone());
            }
        }

        outcome
    }

    fn resolve(&self, method: &Method, path: &str) -> Option<MatchResult<H>> {
        let mut captures = CaptureVec::new();
        if let Some(route) = self.root.search(path, method, &mut captures) {
            return Some(MatchResult {
                route: Arc::clone(route),
                path_params: bind_params(&route.param_names, &captures),
            });
        }

        // Flat patterns are compared against both the raw and the decoded path.
        let decoded = decode_path(path);
        let decoded: &str = &decoded;
        let forms = [path, decoded];
        let forms = if decoded == path { &forms[..1] } else { &forms[..] };

        let flat = self
            .exact
            .get(method)
            .and_then(|routes| forms.iter().find_map(|p| routes.get(*p)))
            .or_else(|| {
                self.prefix
                    .get(method)?
                    .iter()
                    .find(|r| forms.iter().any(|p| p.starts_with(r.pattern.as_ref())))
            })
            .or_else(|| {
                self.contains
                    .get(method)?
                    .iter()
                    .find(|r| forms.iter().any(|p| p.contains(r.pattern.as_ref())))
            })
            .or_else(|| self.fallback.get(method))?;

        Some(MatchResult {
            route: Arc::clone(flat),
            path_params: ParamVec::new(),
        })
    }

    /// Number of distinct registrations across all strategies.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    /// Number of memoized lookups (matched and unmatched).
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, DashMap::len)
    }

    /// Every registered route, trie routes first, then the flat collections in priority order.
    #[must_use]
    pub fn routes(&self) -> Vec<Arc<Route<H>>> {
        let mut all = Vec::with_capacity(self.route_count);
        self.root
            .for_each_route(&mut |r: &Arc<Route<H>>| all.push(Arc::clone(r)));
        all.extend(self.exact.values().flat_map(|m| m.values()).cloned());
        all.extend(self.prefix.values().flatten().cloned());
        all.extend(self.contains.values().flatten().cloned());
        all.extend(self.fallback.values().cloned());
        all
    }

    /// Log every registered route at info level.
    pub fn dump_routes(&self) {
        info!(routes_count = self.route_count, "Registered routes");
        for route in self.routes() {
            info!(
                method = %route.method,
                kind = %route.kind,
                pattern = %route.pattern,
                "Route"
            );
        }
    }
}

fn check_method(method: &Method, pattern: &str) -> Result<(), ConfigError> {
    if SUPPORTED_METHODS.contains(method) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedMethod {
            method: method.to_string(),
            pattern: pattern.to_string(),
        })
    }
}

/// Split a route pattern into literal and `{name}` segments.
pub(crate) fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    super::radix::path_segments(pattern)
        .map(|segment| {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some("") => Err(invalid("empty template variable name")),
                Some(name) if name.contains(['{', '}']) => Err(invalid("nested braces in template segment")),
                Some(name) => Ok(Segment::Template(name)),
                None if segment.contains(['{', '}']) => {
                    Err(invalid("template variables must span a whole segment"))
                }
                None => Ok(Segment::Literal(segment)),
            }
        })
        .collect()
}

fn flat_route<H>(kind: MatchKind, pattern: &str, method: Method, handler: H) -> Arc<Route<H>> {
    Arc::new(Route {
        method,
        kind,
        pattern: Arc::from(pattern),
        param_names: Arc::from(Vec::new()),
        handler,
    })
}

/// Replace an entry with the same pattern in place, otherwise append. Returns
/// whether an entry was replaced.
fn upsert_ordered<H>(routes: &mut Vec<Arc<Route<H>>>, route: &Arc<Route<H>>) -> bool {
    match routes.iter_mut().find(|r| r.pattern == route.pattern) {
        Some(slot) => {
            *slot = Arc::clone(route);
            true
        }
        None => {
            routes.push(Arc::clone(route));
            false
        }
    }
}

/// Percent-decode a request path; malformed UTF-8 leaves it untouched.
fn decode_path(path: &str) -> Cow<'_, str> {
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}

fn bind_params(names: &[Arc<str>], values: &[&str]) -> ParamVec {
    names
        .iter()
        .zip(values)
        .map(|(name, raw)| {
            let value = match urlencoding::decode(raw) {
                Ok(Cow::Borrowed(v)) => v.to_owned(),
                Ok(Cow::Owned(v)) => v,
                Err(_) => (*raw).to_owned(),
            };
            (Arc::clone(name), value)
        })
        .collect()
}
