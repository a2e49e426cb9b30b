mod common;

use common::test_runtime_config;
use http::Method;
use std::sync::Arc;
use std::thread;
use waypoint::error::ConfigError;
use waypoint::router::{MatchKind, RouteTree, RouteTreeBuilder};

fn zoo_tree() -> RouteTree<&'static str> {
    let mut builder = RouteTreeBuilder::new();
    builder.add_route("/", Method::GET, "root_handler").unwrap();
    builder.add_route("/zoo/animals", Method::GET, "get_animals").unwrap();
    builder.add_route("/zoo/animals", Method::POST, "create_animal").unwrap();
    builder.add_route("/zoo/animals/{id}", Method::GET, "get_animal").unwrap();
    builder.add_route("/zoo/animals/{id}", Method::PUT, "update_animal").unwrap();
    builder.add_route("/zoo/animals/{id}", Method::PATCH, "patch_animal").unwrap();
    builder.add_route("/zoo/animals/{id}", Method::DELETE, "delete_animal").unwrap();
    builder.add_route("/zoo/animals/keeper", Method::GET, "get_keeper").unwrap();
    builder.add_route("/zoo/health", Method::HEAD, "health_check").unwrap();
    builder.add_route("/zoo/health", Method::OPTIONS, "supported_ops").unwrap();
    builder.build(&test_runtime_config())
}

fn assert_route_match(tree: &RouteTree<&'static str>, method: Method, path: &str, expected: &str) {
    let handler = tree.match_route(&method, path).map(|m| *m.handler());
    assert_eq!(
        handler.unwrap_or("<none>"),
        expected,
        "Handler mismatch for {method} {path}"
    );
}

#[test]
fn test_verbs_on_same_path() {
    let tree = zoo_tree();
    assert_route_match(&tree, Method::GET, "/", "root_handler");
    assert_route_match(&tree, Method::GET, "/zoo/animals", "get_animals");
    assert_route_match(&tree, Method::POST, "/zoo/animals", "create_animal");
    assert_route_match(&tree, Method::PUT, "/zoo/animals/1", "update_animal");
    assert_route_match(&tree, Method::PATCH, "/zoo/animals/1", "patch_animal");
    assert_route_match(&tree, Method::DELETE, "/zoo/animals/1", "delete_animal");
    assert_route_match(&tree, Method::HEAD, "/zoo/health", "health_check");
    assert_route_match(&tree, Method::OPTIONS, "/zoo/health", "supported_ops");
    assert_route_match(&tree, Method::POST, "/zoo/health", "<none>");
}

#[test]
fn test_literal_segment_beats_template() {
    let tree = zoo_tree();
    assert_route_match(&tree, Method::GET, "/zoo/animals/keeper", "get_keeper");
    let m = tree.match_route(&Method::GET, "/zoo/animals/42").unwrap();
    assert_eq!(*m.handler(), "get_animal");
    assert_eq!(m.get_path_param("id"), Some("42"));
    assert_eq!(m.route.kind, MatchKind::Template);
    assert_eq!(&*m.route.pattern, "/zoo/animals/{id}");
}

#[test]
fn test_trailing_and_repeated_slashes_are_ignored() {
    let tree = zoo_tree();
    assert_route_match(&tree, Method::GET, "/zoo/animals/", "get_animals");
    assert_route_match(&tree, Method::GET, "//zoo//animals", "get_animals");
}

#[test]
fn test_matching_is_case_sensitive() {
    let tree = zoo_tree();
    assert_route_match(&tree, Method::GET, "/Zoo/Animals", "<none>");
}

#[test]
fn test_strategy_priority() {
    let mut builder = RouteTreeBuilder::new();
    builder.add_route("/api/users", Method::GET, "trie").unwrap();
    builder.add_exact_route("/api/users", Method::GET, "exact").unwrap();
    builder.add_exact_route("/api/status", Method::GET, "exact_status").unwrap();
    builder.add_prefix_route("/api/", Method::GET, "prefix").unwrap();
    builder.add_contains_route("report", Method::GET, "contains").unwrap();
    builder.set_fallback(Method::GET, "fallback").unwrap();
    let tree = builder.build(&test_runtime_config());

    assert_route_match(&tree, Method::GET, "/api/users", "trie");
    assert_route_match(&tree, Method::GET, "/api/status", "exact_status");
    assert_route_match(&tree, Method::GET, "/api/reports", "prefix");
    assert_route_match(&tree, Method::GET, "/monthly/report.pdf", "contains");
    assert_route_match(&tree, Method::GET, "/anything/else", "fallback");
    assert_route_match(&tree, Method::POST, "/anything/else", "<none>");
}

#[test]
fn test_first_registered_prefix_wins() {
    let mut builder = RouteTreeBuilder::new();
    builder.add_prefix_route("/static/", Method::GET, "static").unwrap();
    builder.add_prefix_route("/static/img/", Method::GET, "images").unwrap();
    let tree = builder.build(&test_runtime_config());
    assert_route_match(&tree, Method::GET, "/static/img/logo.png", "static");
}

#[test]
fn test_no_match_without_fallback_is_none() {
    let tree = zoo_tree();
    assert!(tree.match_route(&Method::GET, "/not/registered").is_none());
    // Cached misses stay misses.
    assert!(tree.match_route(&Method::GET, "/not/registered").is_none());
}

#[test]
fn test_repeated_lookups_share_result() {
    let tree = zoo_tree();
    let first = tree.match_route(&Method::GET, "/zoo/animals/7").unwrap();
    let second = tree.match_route(&Method::GET, "/zoo/animals/7").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.path_params, second.path_params);
}

#[test]
fn test_concurrent_lookups_agree() {
    let tree = Arc::new(zoo_tree());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let path = format!("/zoo/animals/{}", i % 2);
                let m = tree.match_route(&Method::GET, &path).unwrap();
                (path, m.get_path_param("id").map(str::to_string))
            })
        })
        .collect();
    for handle in handles {
        let (path, id) = handle.join().unwrap();
        assert_eq!(Some(path.trim_start_matches("/zoo/animals/").to_string()), id);
    }
    assert_eq!(tree.cache_len(), 2);
}

#[test]
fn test_different_variable_names_at_same_depth() {
    let mut builder = RouteTreeBuilder::new();
    builder.add_route("/users/{user_id}/posts", Method::GET, "posts").unwrap();
    builder.add_route("/users/{id}/comments", Method::GET, "comments").unwrap();
    let tree = builder.build(&test_runtime_config());

    let posts = tree.match_route(&Method::GET, "/users/5/posts").unwrap();
    assert_eq!(posts.get_path_param("user_id"), Some("5"));
    let comments = tree.match_route(&Method::GET, "/users/6/comments").unwrap();
    assert_eq!(comments.get_path_param("id"), Some("6"));
    assert_eq!(comments.get_path_param("user_id"), None);
}

#[test]
fn test_invalid_registrations_are_rejected() {
    let mut builder: RouteTreeBuilder<&'static str> = RouteTreeBuilder::new();
    assert!(matches!(
        builder.add_route("/items/{}", Method::GET, "x"),
        Err(ConfigError::InvalidPattern { .. })
    ));
    assert!(matches!(
        builder.add_route("/items/id{id}", Method::GET, "x"),
        Err(ConfigError::InvalidPattern { .. })
    ));
    assert!(matches!(
        builder.add_exact_route("/items", Method::CONNECT, "x"),
        Err(ConfigError::UnsupportedMethod { .. })
    ));
    assert_eq!(builder.build(&test_runtime_config()).route_count(), 0);
}
