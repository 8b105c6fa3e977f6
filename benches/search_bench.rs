use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use patch_glue::prelude::*;

// A row of `n` bilinear unit squares, each with a `k x k` control grid.
fn row_of_squares(n: usize, k: usize) -> (Vec<NdArray<f64>>, Vec<BSpline>) {
    let step = 1.0 / (k - 1) as f64;
    let ctrl = (0..n)
        .map(|p| {
            NdArray::from_shape_fn(vec![2, k, k], |i| {
                [p as f64 + i[1] as f64 * step, i[2] as f64 * step][i[0]]
            })
        })
        .collect();
    // uniform degree-1 knots with k functions
    let knots: Vec<f64> = std::iter::once(0.0)
        .chain((0..k).map(|j| j as f64 * step))
        .chain(std::iter::once(1.0))
        .collect();
    let spline =
        BSpline::new(&[1, 1], vec![knots.clone(), knots]).unwrap_or_else(|e| panic!("{e}"));
    (ctrl, vec![spline; n])
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("border-search");

    for &(n, k) in &[(4, 8), (16, 8), (16, 32)] {
        let (ctrl, splines) = row_of_squares(n, k);
        let label = format!("{n}x{k}x{k}");

        group.bench_with_input(BenchmarkId::new("geometric", &label), &ctrl, |b, ctrl| {
            b.iter(|| {
                let epsilon = DEFAULT_COINCIDENCE_EPSILON;
                MultiPatchConnectivity::from_patch_geometry(black_box(ctrl), epsilon)
                    .unwrap_or_else(|e| panic!("{e}"))
            })
        });

        group.bench_with_input(BenchmarkId::new("combinatorial", &label), &ctrl, |b, ctrl| {
            b.iter(|| {
                let config = MatchConfig::default();
                BorderCorrespondences::from_patches(black_box(ctrl), &splines, &config)
                    .unwrap_or_else(|e| panic!("{e}"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
