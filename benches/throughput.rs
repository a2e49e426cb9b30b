use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use std::hint::black_box;
use waypoint::dispatcher::{Dispatcher, Request, Response};
use waypoint::router::{RouteTree, RouteTreeBuilder};
use waypoint::runtime_config::RuntimeConfig;

fn routes() -> Vec<(Method, &'static str, &'static str)> {
    vec![
        (Method::GET, "/", "root_handler"),
        (Method::GET, "/zoo/animals", "get_animals"),
        (Method::POST, "/zoo/animals", "create_animal"),
        (Method::GET, "/zoo/animals/{id}", "get_animal"),
        (Method::PUT, "/zoo/animals/{id}", "update_animal"),
        (Method::DELETE, "/zoo/animals/{id}", "delete_animal"),
        (Method::GET, "/zoo/animals/{id}/toys/{toy_id}", "animal_toy"),
        (
            Method::GET,
            "/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
            "habitat_section",
        ),
        (
            Method::POST,
            "/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}",
            "post_item_batch",
        ),
        (Method::GET, "/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}", "complex_many_params"),
        (Method::HEAD, "/zoo/health", "health_check"),
    ]
}

fn test_paths() -> Vec<(Method, &'static str)> {
    vec![
        (Method::GET, "/zoo/animals/123"),
        (Method::GET, "/zoo/animals/123/toys/456"),
        (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
        (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
        (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
    ]
}

fn build_tree(config: &RuntimeConfig) -> RouteTree<&'static str> {
    let mut builder = RouteTreeBuilder::new();
    for (method, pattern, handler) in routes() {
        builder
            .add_route(pattern, method, handler)
            .expect("valid route");
    }
    builder.add_prefix_route("/static/", Method::GET, "assets").expect("valid route");
    builder.build(config)
}

fn bench_route_throughput(c: &mut Criterion) {
    let paths = test_paths();
    let cached = build_tree(&RuntimeConfig::default());
    c.bench_function("route_match_cached", |b| {
        b.iter(|| {
            for (method, path) in &paths {
                black_box(cached.match_route(method, path));
            }
        })
    });

    let uncached = build_tree(&RuntimeConfig {
        match_cache_enabled: false,
        ..RuntimeConfig::default()
    });
    c.bench_function("route_match_uncached", |b| {
        b.iter(|| {
            for (method, path) in &paths {
                black_box(uncached.match_route(method, path));
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = Dispatcher::builder()
        .route("/zoo/animals/{id}", Method::GET, |req: &Request| {
            Ok(Response::json(
                200,
                serde_json::json!({ "id": req.get_path_param("id") }),
            ))
        })
        .build()
        .expect("valid dispatcher");

    c.bench_function("dispatch_template_route", |b| {
        b.iter(|| {
            let req = Request::from_url(Method::GET, "/zoo/animals/123").expect("valid url");
            black_box(dispatcher.handle(req))
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_dispatch);
criterion_main!(benches);
