//! Criterion benchmarks for the three solvers on seeded random scenes.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use resound_arena::ArrayPool;
use resound_bench::{centered_source, reference_scene, stress_scene};
use resound_core::PassabilityView;
use resound_propagators::{BestFirst, ChunkedWavefront, Respread};

fn bench_best_first(c: &mut Criterion) {
    let solver = BestFirst::builder().attenuation(0.9).build().unwrap();
    let mut group = c.benchmark_group("best_first");
    for (name, scene) in [("32", reference_scene(1)), ("64", stress_scene(1))] {
        let seeded = centered_source(scene.size(), 1.0);
        group.bench_with_input(BenchmarkId::from_parameter(name), &scene, |b, scene| {
            b.iter(|| {
                let mut volume = seeded.clone();
                black_box(solver.propagate(&mut volume, scene).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_chunked(c: &mut Criterion) {
    let scene = reference_scene(2);
    let seeded = centered_source(scene.size(), 1.0);
    let pool = ArrayPool::new();
    let cores = std::thread::available_parallelism().map_or(4, |n| n.get());

    let mut group = c.benchmark_group("chunked_wavefront_32");
    for threads in [1, cores] {
        let solver = ChunkedWavefront::builder()
            .attenuation(0.9)
            .chunk_size(8)
            .threads(threads)
            .build()
            .unwrap();
        group.bench_with_input(BenchmarkId::new("threads", threads), &solver, |b, solver| {
            b.iter(|| {
                let mut volume = seeded.clone();
                black_box(solver.propagate(&mut volume, &scene, &pool).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_respread_after_edit(c: &mut Criterion) {
    let mut scene = reference_scene(3);
    let size = scene.size();
    let mut settled = centered_source(size, 1.0);
    BestFirst::builder()
        .attenuation(0.9)
        .build()
        .unwrap()
        .propagate(&mut settled, &scene)
        .unwrap();

    // Open a small hole next to the source.
    let (cx, cy, cz) = (size.width / 2, size.height / 2, size.depth / 2);
    let edits: Vec<_> = (0..3).map(|d| (cx + 2 + d, cy, cz)).collect();
    for &(x, y, z) in &edits {
        scene.set(x, y, z, 1.0);
    }

    let respread = Respread::builder().attenuation(0.9).build().unwrap();
    let pool = ArrayPool::new();
    c.bench_function("respread_3_cells_32", |b| {
        b.iter(|| {
            let mut volume = settled.clone();
            black_box(respread.run(&mut volume, &scene, &pool, &edits).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_best_first,
    bench_chunked,
    bench_respread_after_edit
);
criterion_main!(benches);
