//! # Router Module
//!
//! Path matching and route resolution for the dispatch pipeline.
//!
//! ## Overview
//!
//! A [`RouteTree`] resolves an `(HTTP method, path)` pair with five strategies,
//! tried in a fixed order:
//!
//! 1. **Template / literal trie** - `/pets/{id}`, `/pets/admin`; literal segments
//!    shadow template segments at the same depth
//! 2. **Exact** - identical full path
//! 3. **Prefix** - first registered prefix of the path
//! 4. **Contains** - first registered substring of the path
//! 5. **Fallback** - one catch-all handler per method
//!
//! Routes are registered on a [`RouteTreeBuilder`] and frozen by
//! [`RouteTreeBuilder::build`]. The built tree is immutable; only its match
//! cache (a `DashMap` keyed by method and raw path) is written at request time.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use waypoint::router::RouteTreeBuilder;
//! use waypoint::runtime_config::RuntimeConfig;
//!
//! let mut builder = RouteTreeBuilder::new();
//! builder.add_route("/api/users/{id}", Method::GET, "get_user").unwrap();
//! builder.add_route("/api/users/admin", Method::GET, "admin").unwrap();
//! builder.add_prefix_route("/static/", Method::GET, "assets").unwrap();
//! let tree = builder.build(&RuntimeConfig::default());
//!
//! assert_eq!(*tree.match_route(&Method::GET, "/api/users/admin").unwrap().handler(), "admin");
//! assert_eq!(*tree.match_route(&Method::GET, "/static/app.js").unwrap().handler(), "assets");
//! assert!(tree.match_route(&Method::GET, "/nowhere").is_none());
//! ```

mod core;
mod radix;

pub use self::core::{
    MatchKind, MatchResult, ParamVec, Route, RouteTree, RouteTreeBuilder, MAX_INLINE_PARAMS,
    SUPPORTED_METHODS,
};
