//! Criterion benchmarks for the conveyor line.
//!
//! Benchmark groups:
//! - `short_belt`: 10 slots, 2-timeslot assemblies -- per-timeslot overhead
//! - `long_belt`: 10 000 slots -- worker loop throughput
//! - `snapshot`: encode and decode a 1 000-slot line
//! - `replicate`: 32 seeds of a 50-slot line

use conveyor_core::config::LineConfig;
use conveyor_core::line::ProductionLine;
use conveyor_core::replicate::replicate;
use conveyor_core::rng::SimRng;
use conveyor_core::snapshot;
use conveyor_core::source::UniformSource;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

type Line = ProductionLine<UniformSource, SimRng>;

/// Build a line and run it until the belt is in steady state.
fn warmed_line(capacity: usize, duration: u32) -> Line {
    let mut line = Line::from_config(&LineConfig::new(capacity, duration).with_seed(42))
        .expect("bench config is valid");
    line.try_run(capacity * 2).expect("warmup run");
    line
}

fn bench_short_belt(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_belt");
    group.sample_size(50);

    let mut line = warmed_line(10, 2);

    group.bench_function("10_slots_step", |b| {
        b.iter(|| {
            black_box(line.step().expect("step"));
        });
    });

    group.finish();
}

fn bench_long_belt(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_belt");
    group.sample_size(20);

    let mut line = warmed_line(10_000, 4);

    group.bench_function("10000_slots_step", |b| {
        b.iter(|| {
            black_box(line.step().expect("step"));
        });
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    group.sample_size(30);

    let line = warmed_line(1_000, 3);
    let bytes = snapshot::save(&line).expect("save");

    group.bench_function("save_1000_slots", |b| {
        b.iter(|| black_box(snapshot::save(&line).expect("save")));
    });

    group.bench_function("load_1000_slots", |b| {
        b.iter(|| {
            let restored: Line = snapshot::load(black_box(&bytes)).expect("load");
            black_box(restored)
        });
    });

    group.finish();
}

fn bench_replicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("replicate");
    group.sample_size(10);

    let config = LineConfig::new(50, 2);

    group.bench_function("32_seeds_1000_timeslots", |b| {
        b.iter(|| black_box(replicate(&config, 0..32, 1_000).expect("replicate")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_short_belt,
    bench_long_belt,
    bench_snapshot,
    bench_replicate
);
criterion_main!(benches);
