//! Speckle removal.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sgm_disparity::prelude::*;
use sgm_disparity::speckle::filter_speckles;

fn map_with(width: usize, height: usize, pixels: &[(usize, usize, u16)]) -> DisparityMap {
    let mut map = DisparityMap::new(width, height, 256);
    for &(x, y, v) in pixels {
        map.put(x, y, v);
    }
    map
}

#[test]
fn small_isolated_region_is_removed() {
    let region = [(4, 3, 1280), (5, 3, 1290), (5, 4, 1300)];

    let mut map = map_with(10, 8, &region);
    filter_speckles(&mut map, 5, 512);
    assert_eq!(map.valid_count(), 0);

    let mut map = map_with(10, 8, &region);
    filter_speckles(&mut map, 2, 512);
    assert_eq!(map.valid_count(), 3);
    for &(x, y, v) in &region {
        assert_eq!(map.get(x, y), v);
    }
}

#[test]
fn regions_are_split_by_large_steps() {
    // A 2x3 block whose left column differs from the rest by more than the allowed step
    let mut map = DisparityMap::new(6, 6, 256);
    for y in 1..4 {
        map.put(1, y, 256);
        map.put(2, y, 2048);
        map.put(3, y, 2048);
    }

    filter_speckles(&mut map, 3, 512);

    for y in 1..4 {
        assert_eq!(map.get(1, y), 0, "three pixel column should be removed");
        assert_eq!(map.get(2, y), 2048);
        assert_eq!(map.get(3, y), 2048);
    }
}

#[test]
fn diagonal_pixels_are_not_connected() {
    let mut map = map_with(4, 4, &[(0, 0, 500), (1, 1, 500), (2, 2, 500)]);
    filter_speckles(&mut map, 1, 512);
    assert_eq!(map.valid_count(), 0);
}

#[test]
fn step_equal_to_difference_connects() {
    let mut map = map_with(3, 1, &[(0, 0, 100), (1, 0, 612), (2, 0, 1124)]);
    filter_speckles(&mut map, 2, 512);
    assert_eq!(map.valid_count(), 3);
}

#[test]
fn filter_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(99);
    let data = (0..40 * 30)
        .map(|_| match rng.random_range(0..4) {
            0 => 0,
            _ => rng.random_range(0..6u16) * 256
        })
        .collect();
    let mut once = DisparityMap::from_vec(40, 30, 256, data).unwrap();
    filter_speckles(&mut once, 6, 256);

    let mut twice = once.clone();
    filter_speckles(&mut twice, 6, 256);

    assert!(once.valid_count() > 0);
    assert_eq!(once, twice);
}

#[test]
fn zero_size_keeps_everything() {
    let mut map = map_with(5, 5, &[(2, 2, 700)]);
    filter_speckles(&mut map, 0, 512);
    assert_eq!(map.get(2, 2), 700);
}
