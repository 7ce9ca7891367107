use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rcoreset_lib::config::OptimizerConfig;
use rcoreset_lib::coreset::{Coreset, SamplingCoreset, SamplingScheme, VectorL1Coreset};

fn shifted_data(n: usize, d: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    Array2::from_shape_fn((n, d), |(_, j)| rng.gen_range(-1.0..1.0) + if j == 0 { 1.0 } else { 0.0 })
}

fn bench_l1_sweep(c: &mut Criterion) {
    let data = shifted_data(200, 10);
    let config = OptimizerConfig { opt_itrs: 200, ..OptimizerConfig::default() };
    c.bench_function("l1_sweep_200x10", |b| {
        b.iter(|| {
            let mut coreset = VectorL1Coreset::new(data.view(), config.clone()).unwrap();
            for m in [5, 10, 20, 40] {
                black_box(coreset.build(m).unwrap());
            }
            black_box(coreset.error())
        })
    });
}

fn bench_cached_rebuild(c: &mut Criterion) {
    let data = shifted_data(200, 10);
    let config = OptimizerConfig { opt_itrs: 200, ..OptimizerConfig::default() };
    let mut coreset = VectorL1Coreset::new(data.view(), config).unwrap();
    coreset.build(20).unwrap();
    c.bench_function("l1_cached_rebuild", |b| b.iter(|| black_box(coreset.build(20).unwrap())));
}

fn bench_sampling(c: &mut Criterion) {
    let data = shifted_data(10_000, 10);
    c.bench_function("sampling_10000x10", |b| {
        b.iter(|| {
            let mut coreset = SamplingCoreset::new(data.view(), SamplingScheme::Norms, 1).unwrap();
            black_box(coreset.build(500).unwrap())
        })
    });
}

criterion_group!(benches, bench_l1_sweep, bench_cached_rebuild, bench_sampling);
criterion_main!(benches);
