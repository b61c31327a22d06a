//! Criterion benchmarks for the packing backends.
//!
//! Uses small synthetic instances so each backend proves optimality well
//! inside the sample; the numbers compare search overhead, not scaling.
//! Only backends compiled in (`--features all-backends`) are measured.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_floorplan::backend::{BackendChoice, SolverConfig};
use u_floorplan::instance::Instance;
use u_floorplan::lowering::{LinearModel, SmtFormula};
use u_floorplan::model::{encode, PackingConfig};

// ===========================================================================
// Instances
// ===========================================================================

fn random_instance(seed: u64, count: usize, plate_width: i64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let dims: Vec<(i64, i64)> = (0..count)
        .map(|_| (rng.random_range(1..=plate_width / 2), rng.random_range(1..=5)))
        .collect();
    // dims are drawn within the plate, so construction cannot fail
    Instance::from_dims(plate_width, &dims).unwrap()
}

fn solver() -> SolverConfig {
    SolverConfig::default().with_time_limit(Duration::from_secs(30))
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    group.sample_size(10);

    for count in [4usize, 6] {
        let instance = random_instance(count as u64, count, 8);
        let model = encode(&instance, &PackingConfig::default()).unwrap();
        for choice in BackendChoice::available() {
            let backend = choice.backend();
            group.bench_with_input(
                BenchmarkId::new(choice.to_string(), count),
                &model,
                |b, m| b.iter(|| backend.solve(black_box(m), &solver()).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_rotation");
    group.sample_size(10);

    let instance = random_instance(11, 5, 8);
    let config = PackingConfig::default().with_rotation(true);
    let model = encode(&instance, &config).unwrap();
    for choice in BackendChoice::available() {
        let backend = choice.backend();
        group.bench_with_input(
            BenchmarkId::from_parameter(choice),
            &model,
            |b, m| b.iter(|| backend.solve(black_box(m), &solver()).unwrap()),
        );
    }
    group.finish();
}

fn bench_lowering(c: &mut Criterion) {
    let mut group = c.benchmark_group("lowering");

    for count in [10usize, 40] {
        let instance = random_instance(count as u64, count, 20);
        let config = PackingConfig::default()
            .with_rotation(true)
            .with_symmetry_breaking(true);
        let model = encode(&instance, &config).unwrap();
        group.bench_with_input(BenchmarkId::new("big_m", count), &model, |b, m| {
            b.iter(|| LinearModel::lower(black_box(m)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("disjunctive", count), &model, |b, m| {
            b.iter(|| SmtFormula::lower(black_box(m)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_backends, bench_rotation, bench_lowering);
criterion_main!(benches);
