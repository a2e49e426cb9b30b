//! Segment trie used for template and literal route matching.
//!
//! Each edge consumes exactly one `/`-delimited path segment:
//! - literal children match a segment byte-for-byte (case-sensitive), either
//!   as sent or after percent-decoding
//! - a node has at most one template child, which matches any single segment
//! - routes are stored at terminal nodes, keyed by HTTP method
//!
//! Lookup prefers the literal child at every depth and only falls back to the
//! template child when no literal child exists for the segment. A literal
//! descent that later dead-ends is not retried through the template child, so
//! `/api/users/admin` always shadows `/api/users/{id}` for that exact path.
//!
//! Template variable names live on the terminal [`Route`], not on the edge, so
//! `/users/{user_id}/posts` and `/users/{id}/comments` share one wildcard edge
//! while still binding their own names.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::{Route, MAX_INLINE_PARAMS};

/// A path segment as declared in a route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Template(&'a str),
}

/// Split a request path into its non-empty segments.
///
/// Leading, trailing and repeated slashes are ignored, so `/users/` and
/// `/users` address the same node.
#[inline]
pub(crate) fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Values captured by template edges, in path order.
pub(crate) type CaptureVec<'p> = SmallVec<[&'p str; MAX_INLINE_PARAMS]>;

pub(crate) struct RadixNode<H> {
    /// Literal edges keyed by the exact segment text
    children: HashMap<Box<str>, RadixNode<H>>,
    /// Single wildcard edge for `{name}` segments
    param_child: Option<Box<RadixNode<H>>>,
    /// Variable name the wildcard edge was first declared with (diagnostics only)
    param_name: Option<Arc<str>>,
    /// Terminal routes for this node, keyed by HTTP method
    routes: HashMap<Method, Arc<Route<H>>>,
}

impl<H> Default for RadixNode<H> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            param_child: None,
            param_name: None,
            routes: HashMap::new(),
        }
    }
}

impl<H> RadixNode<H> {
    /// Insert `route` under `segments`, returning the route it replaced, if any.
    pub(crate) fn insert(&mut self, segments: &[Segment<'_>], route: Arc<Route<H>>) -> Option<Arc<Route<H>>> {
        let mut node = self;
        for segment in segments {
            node = match *segment {
                Segment::Literal(text) => node.children.entry(Box::from(text)).or_default(),
                Segment::Template(name) => {
                    if node.param_name.is_none() {
                        node.param_name = Some(Arc::from(name));
                    }
                    node.param_child.get_or_insert_with(Default::default).as_mut()
                }
            };
        }
        node.routes.insert(route.method.clone(), route)
    }

    /// Walk the trie for `path`, pushing every template capture into `captures`.
    ///
    /// Returns `None` as soon as a segment has neither a literal nor a template
    /// edge, or when the final node has no route for `method`.
    pub(crate) fn search<'p>(
        &self,
        path: &'p str,
        method: &Method,
        captures: &mut CaptureVec<'p>,
    ) -> Option<&Arc<Route<H>>> {
        let mut node = self;
        for segment in path_segments(path) {
            node = match literal_edge(node, segment) {
                Some(child) => child,
                None => {
                    let child = node.param_child.as_deref()?;
                    captures.push(segment);
                    child
                }
            };
        }
        node.routes.get(method)
    }

    /// Visit every terminal route in the subtree.
    pub(crate) fn for_each_route(&self, f: &mut impl FnMut(&Arc<Route<H>>)) {
        self.routes.values().for_each(&mut *f);
        for child in self.children.values() {
            child.for_each_route(f);
        }
        if let Some(param_child) = &self.param_child {
            param_child.for_each_route(f);
        }
    }

    #[cfg(test)]
    pub(crate) fn param_name(&self) -> Option<&str> {
        self.param_name.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn literal_child(&self, segment: &str) -> Option<&RadixNode<H>> {
        self.children.get(segment)
    }
}

/// Literal edge for a request segment, tried as sent and then percent-decoded.
fn literal_edge<'n, H>(node: &'n RadixNode<H>, segment: &str) -> Option<&'n RadixNode<H>> {
    if let Some(child) = node.children.get(segment) {
        return Some(child);
    }
    if !segment.contains('%') {
        return None;
    }
    let decoded = urlencoding::decode(segment).ok()?;
    node.children.get(&*decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::core::MatchKind;

    fn route(method: Method, pattern: &str, names: &[&str], handler: &'static str) -> Arc<Route<&'static str>> {
        Arc::new(Route {
            method,
            kind: MatchKind::Template,
            pattern: Arc::from(pattern),
            param_names: names.iter().map(|n| Arc::from(*n)).collect(),
            handler,
        })
    }

    fn segments(pattern: &str) -> Vec<Segment<'_>> {
        path_segments(pattern)
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Template(name),
                None => Segment::Literal(s),
            })
            .collect()
    }

    fn insert(root: &mut RadixNode<&'static str>, method: Method, pattern: &'static str, names: &[&str], handler: &'static str) {
        root.insert(&segments(pattern), route(method, pattern, names, handler));
    }

    #[test]
    fn test_literal_beats_template_at_same_depth() {
        let mut root = RadixNode::default();
        insert(&mut root, Method::GET, "/api/users/{id}", &["id"], "get_user");
        insert(&mut root, Method::GET, "/api/users/admin", &[], "admin");

        let mut captures = CaptureVec::new();
        let found = root.search("/api/users/admin", &Method::GET, &mut captures).unwrap();
        assert_eq!(found.handler, "admin");
        assert!(captures.is_empty());

        let mut captures = CaptureVec::new();
        let found = root.search("/api/users/42", &Method::GET, &mut captures).unwrap();
        assert_eq!(found.handler, "get_user");
        assert_eq!(captures.as_slice(), &["42"]);
    }

    #[test]
    fn test_no_backtracking_after_literal_descent() {
        let mut root = RadixNode::default();
        insert(&mut root, Method::GET, "/a/b/c", &[], "literal");
        insert(&mut root, Method::GET, "/a/{x}/d", &["x"], "template");

        let mut captures = CaptureVec::new();
        assert!(root.search("/a/b/d", &Method::GET, &mut captures).is_none());

        let mut captures = CaptureVec::new();
        let found = root.search("/a/z/d", &Method::GET, &mut captures).unwrap();
        assert_eq!(found.handler, "template");
    }

    #[test]
    fn test_segment_count_must_match() {
        let mut root = RadixNode::default();
        insert(&mut root, Method::GET, "/users/{id}", &["id"], "get_user");

        let mut captures = CaptureVec::new();
        assert!(root.search("/users", &Method::GET, &mut captures).is_none());
        let mut captures = CaptureVec::new();
        assert!(root.search("/users/1/extra", &Method::GET, &mut captures).is_none());
    }

    #[test]
    fn test_single_wildcard_edge_per_level() {
        let mut root = RadixNode::default();
        insert(&mut root, Method::GET, "/users/{user_id}/posts", &["user_id"], "posts");
        insert(&mut root, Method::GET, "/users/{id}/comments", &["id"], "comments");

        let users = root.literal_child("users").unwrap();
        assert_eq!(users.param_name(), Some("user_id"));

        let mut captures = CaptureVec::new();
        let found = root.search("/users/7/comments", &Method::GET, &mut captures).unwrap();
        assert_eq!(found.handler, "comments");
        assert_eq!(&*found.param_names[0], "id");
    }

    #[test]
    fn test_encoded_segment_reaches_literal_edge() {
        let mut root = RadixNode::default();
        insert(&mut root, Method::GET, "/wiki/café", &[], "cafe");
        insert(&mut root, Method::GET, "/wiki/{title}", &["title"], "article");

        let mut captures = CaptureVec::new();
        let found = root.search("/wiki/caf%C3%A9", &Method::GET, &mut captures).unwrap();
        assert_eq!(found.handler, "cafe");
        assert!(captures.is_empty());

        let mut captures = CaptureVec::new();
        let found = root.search("/wiki/caf%E9", &Method::GET, &mut captures).unwrap();
        assert_eq!(found.handler, "article");
    }

    #[test]
    fn test_root_route_and_method_filtering() {
        let mut root = RadixNode::default();
        insert(&mut root, Method::GET, "/", &[], "root");

        let mut captures = CaptureVec::new();
        assert_eq!(root.search("/", &Method::GET, &mut captures).unwrap().handler, "root");
        assert!(root.search("/", &Method::POST, &mut captures).is_none());
    }

    #[test]
    fn test_reinsert_returns_previous_route() {
        let mut root = RadixNode::default();
        let first = root.insert(&segments("/items"), route(Method::GET, "/items", &[], "one"));
        let second = root.insert(&segments("/items"), route(Method::GET, "/items", &[], "two"));
        assert!(first.is_none());
        assert_eq!(second.unwrap().handler, "one");
    }
}
