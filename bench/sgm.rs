use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sgm_disparity::aggregate::PathAggregator;
use sgm_disparity::cost::{BoundaryPolicy, CostVolume};
use sgm_disparity::prelude::*;

const HEIGHT: usize = 60;
const WIDTH: usize = 80;
const FEATURES: usize = 16;
const RANGE: usize = 32;

/// Smoothly varying descriptors, with the right image shifted by 5 pixels.
fn descriptors(shift: usize) -> DescriptorMap {
    DescriptorMap::from_fn(HEIGHT, WIDTH, FEATURES, |x, y| {
        (0..FEATURES)
            .map(|k| (((x + shift) * (k + 1)) as f32 * 0.13 + y as f32 * 0.07).sin())
            .collect()
    }).unwrap()
}

fn sgm_bench(c: &mut Criterion) {
    let left = descriptors(0);
    let right = descriptors(5);

    // Build disparity alg
    let mut sgm = SgmStereo::new(Params {
        disparity_range: RANGE,
        ..Default::default()
    }).unwrap();

    let cost = CostVolume::build_left(&left, &right, RANGE, BoundaryPolicy::Clamp).unwrap();

    c.bench_function("cost volume 80x60x32", |b| {
        b.iter(|| CostVolume::build_left(black_box(&left), black_box(&right), RANGE, BoundaryPolicy::Clamp))
    });

    c.bench_function("aggregation 80x60x32", |b| {
        let mut aggregator = PathAggregator::new(WIDTH, RANGE, 3.0, 40.0);
        b.iter(|| aggregator.aggregate(black_box(&cost)))
    });

    // Benchmark compute function
    c.bench_function("sgm 80x60x32", |b| b.iter(|| sgm.compute(&left, &right)));
}

criterion_group!(benches, sgm_bench);
criterion_main!(benches);
