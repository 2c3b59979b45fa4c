//! Shared helpers for the integration tests.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sgm_disparity::prelude::*;

/// A stereo pair in which right column `x` shows left column `x + shift`.
///
/// Every left column gets its own one-hot descriptor, so a left pixel matches exactly one right
/// pixel with cost 0 and every other right pixel with cost `sqrt(2)`.
pub fn shifted_pair(height: usize, width: usize, shift: usize) -> (DescriptorMap, DescriptorMap) {
    let len = width + shift;
    let one_hot = |i: usize| {
        let mut v = vec![0.0; len];
        v[i] = 1.0;
        v
    };

    let left = DescriptorMap::from_fn(height, width, len, |x, _| one_hot(x)).unwrap();
    let right = DescriptorMap::from_fn(height, width, len, |x, _| one_hot(x + shift)).unwrap();
    (left, right)
}

/// Descriptor map of uniform noise in `[0, 1)`.
pub fn noise_map(height: usize, width: usize, len: usize, seed: u64) -> DescriptorMap {
    let mut rng = StdRng::seed_from_u64(seed);
    DescriptorMap::from_fn(height, width, len, |_, _| {
        (0..len).map(|_| rng.random::<f32>()).collect()
    })
    .unwrap()
}

/// Variance of the differences between horizontally and vertically adjacent disparities.
pub fn neighbour_variance(map: &DisparityMap) -> f64 {
    let mut diffs = Vec::new();
    for y in 0..map.height() {
        for x in 0..map.width() {
            let v = map.get(x, y) as f64;
            if x + 1 < map.width() {
                diffs.push(v - map.get(x + 1, y) as f64);
            }
            if y + 1 < map.height() {
                diffs.push(v - map.get(x, y + 1) as f64);
            }
        }
    }

    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / n
}
