use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_reconstruct::geometry::matrix::{SquareMatrix3, det, eigen, inv, solve};

fn random_matrices(n: usize, symmetric: bool, seed: u64) -> Vec<SquareMatrix3> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut m = SquareMatrix3::zeros();
            for i in 0..3 {
                for j in 0..3 {
                    m[(i, j)] = rng.gen_range(-1.0..1.0);
                }
                m[(i, i)] += 4.0;
            }
            if symmetric { (m + m.transpose()) * 0.5 } else { m }
        })
        .collect()
}

fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix3");
    for &n in &[1_000usize, 100_000] {
        let general = random_matrices(n, false, 42);
        let symmetric = random_matrices(n, true, 43);

        group.bench_with_input(BenchmarkId::new("det", n), &general, |b, ms| {
            b.iter(|| ms.iter().map(|m| det(black_box(m))).sum::<f64>())
        });
        group.bench_with_input(BenchmarkId::new("inv", n), &general, |b, ms| {
            b.iter(|| ms.iter().map(|m| inv(black_box(m)).trace()).sum::<f64>())
        });
        group.bench_with_input(BenchmarkId::new("solve", n), &general, |b, ms| {
            b.iter(|| {
                ms.iter()
                    .map(|m| solve(black_box(m), [1.0, 2.0, 3.0])[0])
                    .sum::<f64>()
            })
        });
        group.bench_with_input(BenchmarkId::new("eigen", n), &symmetric, |b, ms| {
            b.iter(|| ms.iter().map(|m| eigen(black_box(m)).sum()).sum::<f64>())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernel);
criterion_main!(benches);
