//! # Disparity selection
//!
//! Winner-take-all selection over a summed cost volume, with sub-pixel refinement that fits a
//! symmetric V through the minimum and its two neighbours. Disparities at either end of the range
//! are not refined.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use rayon::prelude::*;

use crate::aggregate::SummedCost;
use crate::disparity::DisparityMap;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Select a disparity for every pixel of `sum`, in units of `1 / factor` disparities.
pub fn select(sum: &SummedCost, factor: u16) -> DisparityMap {
    let (width, range) = (sum.width(), sum.range());
    let mut map = DisparityMap::new(width, sum.height(), factor);

    if width > 0 && range > 0 {
        map.as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, out)| select_row(sum.row(y), range, factor, out));
    }

    map
}

/// Select disparities for one row of summed costs, `range` costs per pixel.
pub fn select_row(costs: &[f32], range: usize, factor: u16, out: &mut [u16]) {
    for (px, disp) in costs.chunks(range).zip(out.iter_mut()) {
        *disp = select_pixel(px, factor);
    }
}

/// Select the disparity of a single pixel given its costs for every disparity.
///
/// Ties go to the lowest disparity.
pub fn select_pixel(costs: &[f32], factor: u16) -> u16 {
    let mut best = 0;
    for d in 1..costs.len() {
        if costs[d] < costs[best] {
            best = d;
        }
    }

    let factor = factor as f64;
    if best == 0 || best + 1 >= costs.len() {
        return (best as f64 * factor) as u16;
    }

    let center = costs[best] as f64;
    let left = costs[best - 1] as f64;
    let right = costs[best + 1] as f64;

    // Offset towards the cheaper neighbour, at most half a disparity
    let offset = if right < left {
        (right - left) / (center - left) / 2.0
    }
    else {
        (right - left) / (center - right) / 2.0
    };

    (best as f64 * factor + offset * factor).round().max(0.0) as u16
}
