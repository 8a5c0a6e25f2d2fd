use criterion::{criterion_group, criterion_main, Criterion};
use pcd_simp::prelude::{GridSampler, PointCloud, SimpParams};

fn criterion_benchmark(c: &mut Criterion) {
    let sampler = GridSampler::new((0., 100.), (0., 100.), 0.1);

    c.bench_function("grid", |b| {
        b.iter(|| {
            let mut cloud = PointCloud::<f64>::default();
            sampler.sample(&mut cloud).unwrap();
        })
    });

    c.bench_function("triangulated grid", |b| {
        let sampler = sampler.with_indices(true);
        b.iter(|| {
            let mut cloud = PointCloud::<f64>::default();
            sampler.sample(&mut cloud).unwrap();
        })
    });

    c.bench_function("single core grid", |b| {
        let pool = SimpParams::<f64>::default().thread_pool().unwrap();
        b.iter(|| {
            let mut cloud = PointCloud::<f64>::default();
            pool.install(|| sampler.sample(&mut cloud)).unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
