use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowpath::config::EngineConfig;
use flowpath::flow::FlowKey;
use flowpath::pipeline::FlowPipeline;
use flowpath::table::FlowTable;

fn bench_pipeline_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_throughput");

    for key_space in [64u32, 4_096, 65_536] {
        group.bench_with_input(
            BenchmarkId::new("unique_keys", key_space),
            &key_space,
            |b, &key_space| {
                let mut engine = FlowPipeline::new(EngineConfig::default());
                let mut next = 0u32;
                b.iter(|| {
                    let outcome = engine.process(black_box(FlowKey(next % key_space)));
                    next = next.wrapping_add(1);
                    black_box(outcome)
                })
            },
        );
    }

    group.bench_function("single_key_hammer", |b| {
        let mut engine = FlowPipeline::new(EngineConfig::default());
        b.iter(|| black_box(engine.process(black_box(FlowKey(42)))))
    });

    group.finish();
}

fn bench_table_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_lookup");

    for size in [1_000usize, 10_000, 50_000] {
        let mut table = FlowTable::new(size + 1);
        for k in 0..size as u32 {
            table.insert(flowpath::flow::FlowRecord::new(FlowKey(k), 0.0));
        }
        group.bench_with_input(BenchmarkId::new("hit", size), &size, |b, &size| {
            b.iter(|| black_box(table.lookup(black_box(FlowKey((size / 2) as u32)))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline_throughput, bench_table_lookup);
criterion_main!(benches);
