//! Path aggregation and disparity selection over synthetic cost volumes.

mod common;

use common::neighbour_variance;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sgm_disparity::aggregate::{PathAggregator, NUM_PASSES, NUM_PATHS};
use sgm_disparity::cost::CostVolume;
use sgm_disparity::select::{select, select_pixel};

/// Costs of 20 everywhere except two competing noisy minima at disparities 3 and 4.
fn two_minima_volume(height: usize, width: usize, range: usize, seed: u64) -> CostVolume {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(height * width * range);
    for _ in 0..height * width {
        for d in 0..range {
            data.push(match d {
                3 | 4 => 2.0 * rng.random::<f32>(),
                _ => 20.0
            });
        }
    }
    CostVolume::from_vec(height, width, range, data).unwrap()
}

fn noise_volume(height: usize, width: usize, range: usize, seed: u64) -> CostVolume {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..height * width * range).map(|_| 50.0 * rng.random::<f32>()).collect();
    CostVolume::from_vec(height, width, range, data).unwrap()
}

#[test]
fn summed_cost_stays_bounded() -> Result<(), Box<dyn std::error::Error>> {
    let (p1, p2) = (3.0, 40.0);
    let cost = noise_volume(40, 60, 16, 11);
    let c_max = cost.as_slice().iter().copied().fold(0.0f32, f32::max);

    let sum = PathAggregator::new(60, 16, p1, p2).aggregate(&cost)?;
    let bound = (NUM_PATHS * NUM_PASSES) as f32 * (c_max + p2);

    for &s in sum.as_slice() {
        assert!(s.is_finite());
        assert!(s >= 0.0);
        assert!(s <= bound * (1.0 + 1e-6), "summed cost {} exceeds {}", s, bound);
    }
    Ok(())
}

#[test]
fn single_pixel_sums_every_path_start() -> Result<(), Box<dyn std::error::Error>> {
    let cost = CostVolume::from_vec(1, 1, 4, vec![3.0, 1.0, 2.0, 5.0])?;
    let sum = PathAggregator::new(1, 4, 1.0, 2.0).aggregate(&cost)?;

    // Every path starts at the only pixel, so each contributes the raw cost
    let paths = (NUM_PATHS * NUM_PASSES) as f32;
    assert_eq!(sum.pixel(0, 0), &[3.0f32 * paths, paths, 2.0 * paths, 5.0 * paths][..]);
    Ok(())
}

#[test]
fn single_row_propagates_horizontally() -> Result<(), Box<dyn std::error::Error>> {
    // Two pixels, two disparities. The first pixel strongly prefers disparity 0.
    let cost = CostVolume::from_vec(1, 2, 2, vec![0.0, 10.0, 1.0, 1.0])?;
    let sum = PathAggregator::new(2, 2, 1.0, 5.0).aggregate(&cost)?;

    // Forward: pixel 0 starts every path, pixel 1 reaches it horizontally and starts
    // the three paths from the previous row.
    //   pixel 1, d = 0: 1 + min(0, 10 + 1) - 0 = 1
    //   pixel 1, d = 1: 1 + min(10, 0 + 1, 0 + 5) - 0 = 2
    // Reverse: pixel 1 starts every path, pixel 0 reaches it horizontally.
    //   pixel 0, d = 0: 0 + min(1, 1 + 1) - 1 = 0
    //   pixel 0, d = 1: 10 + min(1, 1 + 1) - 1 = 10
    assert_eq!(sum.pixel(0, 0), &[0.0f32, 8.0 * 10.0][..]);
    assert_eq!(sum.pixel(1, 0), &[1.0f32 + 7.0, 2.0 + 7.0][..]);
    Ok(())
}

#[test]
fn mismatched_volume_is_rejected() {
    let cost = noise_volume(3, 5, 4, 2);
    assert!(PathAggregator::new(6, 4, 1.0, 2.0).aggregate(&cost).is_err());
    assert!(PathAggregator::new(5, 8, 1.0, 2.0).aggregate(&cost).is_err());
}

#[test]
fn aggregator_is_reusable() -> Result<(), Box<dyn std::error::Error>> {
    let cost = noise_volume(8, 10, 6, 5);
    let mut aggregator = PathAggregator::new(10, 6, 3.0, 40.0);

    let first = aggregator.aggregate(&cost)?;
    let second = aggregator.aggregate(&cost)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn larger_penalties_give_smoother_maps() -> Result<(), Box<dyn std::error::Error>> {
    let cost = two_minima_volume(32, 32, 8, 42);

    // A factor of 1 rounds the refined disparity to the winning minimum
    let smooth = select(&PathAggregator::new(32, 8, 3.0, 40.0).aggregate(&cost)?, 1);
    let rough = select(&PathAggregator::new(32, 8, 1.0, 2.0).aggregate(&cost)?, 1);

    let smooth_var = neighbour_variance(&smooth);
    let rough_var = neighbour_variance(&rough);
    assert!(
        smooth_var < rough_var,
        "expected a smoother map with larger penalties ({} >= {})",
        smooth_var,
        rough_var
    );
    Ok(())
}

#[test]
fn selection_takes_lowest_disparity_on_ties() {
    assert_eq!(select_pixel(&[1.0, 1.0, 3.0], 256), 0);
    assert_eq!(select_pixel(&[5.0, 2.0, 2.0, 4.0], 4), 6);
}

#[test]
fn range_ends_are_not_refined() {
    assert_eq!(select_pixel(&[0.5, 1.0, 3.0, 4.0], 256), 0);
    assert_eq!(select_pixel(&[4.0, 3.0, 1.0, 0.5], 256), 3 * 256);
    assert_eq!(select_pixel(&[7.0], 256), 0);
}

#[test]
fn refinement_moves_towards_cheaper_neighbour() {
    // Symmetric neighbours keep the integer disparity
    assert_eq!(select_pixel(&[3.0, 1.0, 3.0], 256), 256);

    // offset = (2 - 4) / (1 - 4) / 2 = 1/3
    assert_eq!(select_pixel(&[4.0, 1.0, 2.0], 256), 341);

    // offset = (4 - 2) / (1 - 4) / 2 = -1/3
    assert_eq!(select_pixel(&[2.0, 1.0, 4.0], 256), 171);

    // Equal to a neighbour gives half a disparity
    assert_eq!(select_pixel(&[9.0, 5.0, 1.0, 1.0, 9.0], 256), 2 * 256 + 128);
}
