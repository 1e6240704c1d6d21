use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use bbhash::Bbhash;

fn build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in [10_000u64, 100_000, 1_000_000].iter() {
        let keys: Vec<u64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &keys, |b, keys| {
            b.iter(|| {
                let mut mphf = Bbhash::new(keys.len() as u64, 2.0, 0.03);
                mphf.build(keys, 4, &mut ());
                mphf
            })
        });
    }
    group.finish();
}

fn get(c: &mut Criterion) {
    let keys: Vec<u64> = (0..200_000).collect();
    let mut mphf = Bbhash::new(keys.len() as u64, 2.0, 0.03);
    mphf.build(&keys, 4, &mut ());

    let mut group = c.benchmark_group("get");
    for key in [2u64, 103_200, 199_999].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(key), key, |b, &key| {
            b.iter(|| mphf.lookup(&key))
        });
    }
    group.finish();
}

criterion_group!(build_and_query, build, get);
criterion_main!(build_and_query);
