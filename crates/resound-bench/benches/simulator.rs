//! End-to-end request latency through the simulator facade.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use resound_arena::ArrayPool;
use resound_bench::{bank_center, reference_bank, BENCH_WORLD};
use resound_engine::{AcousticSimulator, SimulatorConfig, SolverKind};

fn bench_single_source(c: &mut Criterion) {
    let bank = reference_bank(7);
    let mut group = c.benchmark_group("simulate_single_source_32");
    for (name, solver) in [("best_first", SolverKind::BestFirst), ("chunked", SolverKind::Chunked)] {
        let config = SimulatorConfig {
            range: 16,
            chunk_size: 8,
            solver,
            worker_threads: Some(1),
            ..Default::default()
        };
        let sim = AcousticSimulator::new(bank.clone(), Arc::new(ArrayPool::new()), config).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let result = sim
                    .simulate_single_source(BENCH_WORLD, bank_center(), 1.0, 1.0, 0.9)
                    .wait()
                    .unwrap();
                black_box(result.get_volume(bank_center()));
                result.finish();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_source);
criterion_main!(benches);
