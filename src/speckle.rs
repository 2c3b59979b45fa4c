//! # Speckle filter
//!
//! Removes small connected regions of similar disparity from a disparity map. Two 4-connected
//! valid pixels belong to the same region when their values differ by at most the given
//! difference.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;

use crate::disparity::DisparityMap;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Invalidate every region of at most `max_size` pixels.
///
/// `max_difference` is in the map's fixed-point units. Every pixel is labelled once, so the
/// filter runs in `O(width * height)`.
pub fn filter_speckles(map: &mut DisparityMap, max_size: usize, max_difference: u32) {
    let (width, height) = (map.width(), map.height());
    let data = map.as_mut_slice();

    let mut visited = vec![false; data.len()];
    let mut wavefront: Vec<usize> = Vec::new();
    let mut region: Vec<usize> = Vec::new();
    let mut removed = 0usize;

    for seed in 0..data.len() {
        if visited[seed] || data[seed] == 0 {
            continue;
        }

        visited[seed] = true;
        wavefront.push(seed);
        region.clear();

        while let Some(idx) = wavefront.pop() {
            region.push(idx);
            let value = data[idx];
            let (x, y) = (idx % width, idx / width);

            let neighbours = [
                if x + 1 < width { Some(idx + 1) } else { None },
                if x > 0 { Some(idx - 1) } else { None },
                if y + 1 < height { Some(idx + width) } else { None },
                if y > 0 { Some(idx - width) } else { None }
            ];

            for &n in neighbours.iter().flatten() {
                if !visited[n]
                    && data[n] != 0
                    && (value as i32 - data[n] as i32).unsigned_abs() <= max_difference
                {
                    visited[n] = true;
                    wavefront.push(n);
                }
            }
        }

        if region.len() <= max_size {
            for &idx in &region {
                data[idx] = 0;
            }
            removed += region.len();
        }
    }

    debug!("Speckle filter removed {} pixels", removed);
}
