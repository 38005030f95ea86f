//! Benchmarks for script evaluation
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use script_node::{Bindings, NodeHost, ScriptEngine, ScriptNode, ScriptNodeConfig};

const SCRIPTS: [(&str, &str); 3] = [
    ("sum", "output = a + b"),
    ("polynomial", "output = a * a * a + b * a * a + c * a + d"),
    (
        "loop",
        "let acc = 0.0; let i = 0; while i < 100 { acc += a * i; i += 1; } output = acc;",
    ),
];

fn bench_compile_and_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_and_run");
    let engine = ScriptEngine::new();
    let bindings = Bindings::new(1.5, 2.0, 3.0, 4.0);

    for (name, script) in SCRIPTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), script, |b, script| {
            b.iter(|| engine.evaluate(black_box(script), black_box(bindings)))
        });
    }

    group.finish();
}

fn bench_cached_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_run");
    let engine = ScriptEngine::new();
    let bindings = Bindings::new(1.5, 2.0, 3.0, 4.0);

    for (name, script) in SCRIPTS {
        let compiled = engine.compile(script).expect("benchmark script compiles");
        group.bench_with_input(BenchmarkId::from_parameter(name), &compiled, |b, compiled| {
            b.iter(|| engine.run(compiled, black_box(bindings)))
        });
    }

    group.finish();
}

fn bench_host_request(c: &mut Criterion) {
    let mut host = NodeHost::default();
    let config = ScriptNodeConfig::default();
    ScriptNode::register(&mut host, &config).expect("register");
    let id = host.create_node(&config.type_name).expect("instance");
    host.set_value(id, "script", SCRIPTS[1].1).expect("script");

    c.bench_function("host_set_and_request", |b| {
        let mut x = 0.0;
        b.iter(|| {
            x += 0.25;
            host.set_value(id, "variable_a", x).expect("input");
            black_box(host.request_value(id, "output").expect("output"))
        })
    });
}

criterion_group!(
    benches,
    bench_compile_and_run,
    bench_cached_run,
    bench_host_request
);
criterion_main!(benches);
