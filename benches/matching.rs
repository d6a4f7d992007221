use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use nestrouter::router::{PathPattern, RouteTable};
use nestrouter::server::Request;
use std::hint::black_box;

fn example_routes() -> &'static [&'static str] {
    &[
        "/",
        "/zoo/animals",
        "/zoo/animals/:id",
        "/zoo/animals/:id/toys/:toyId",
        "/zoo/:category/animals/:id/habitats/:habitatId/sections/:sectionId",
        "/inventory/:warehouseId/feeds/:feedId/items/:itemId/batches/:batchId",
        "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i",
        "/zoo/health",
    ]
}

fn build_table() -> RouteTable {
    let mut table = RouteTable::new();
    for pattern in example_routes() {
        table
            .get(pattern, |_req: &Request| "")
            .expect("benchmark route registers");
    }
    table
}

fn bench_pattern_match(c: &mut Criterion) {
    let pattern =
        PathPattern::parse("/zoo/:category/animals/:id/habitats/:habitatId/sections/:sectionId")
            .expect("valid pattern");
    c.bench_function("pattern_match", |b| {
        b.iter(|| black_box(pattern.matches(black_box("/zoo/cats/animals/123/habitats/88/sections/5"))))
    });
}

fn bench_route_throughput(c: &mut Criterion) {
    let table = build_table();
    c.bench_function("route_find", |b| {
        let test_paths = [
            (Method::GET, "/zoo/animals/123"),
            (Method::GET, "/zoo/animals/123/toys/456"),
            (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (Method::GET, "/inventory/1/feeds/2/items/3/batches/4"),
            (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
            (Method::GET, "/does/not/exist"),
        ];
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = table.find(method, path);
                black_box(&res);
            }
        })
    });
}

criterion_group!(benches, bench_pattern_match, bench_route_throughput);
criterion_main!(benches);
