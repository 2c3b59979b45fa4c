//! # Left-right consistency
//!
//! Cross-checks the left and right disparity maps. A left pixel at `(x, y)` with disparity `dl`
//! survives only if the right pixel `(x - dl, y)` exists, is valid and its disparity is within the
//! threshold of `dl`, and the mirrored rule applies to right pixels through `(x + dr, y)`.
//! Disparities are compared in whole pixels, rounded to nearest.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;

use crate::disparity::DisparityMap;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Invalidate every pixel of either map that disagrees with the other map.
///
/// Both checks are repeated until neither clears a pixel, so no surviving pixel of one map
/// refers to an invalid or disagreeing pixel of the other.
pub fn enforce_consistency(
    left: &mut DisparityMap,
    right: &mut DisparityMap,
    threshold: u32
) -> Result<()> {
    if left.width() != right.width() || left.height() != right.height() {
        return Err(Error::DimensionMismatch {
            left: (left.width(), left.height()),
            right: (right.width(), right.height())
        });
    }

    let mut rounds = 0;
    loop {
        let cleared = check(left, right, threshold, Side::Left)
            + check(right, left, threshold, Side::Right);
        rounds += 1;

        debug!("Consistency round {} cleared {} pixels", rounds, cleared);
        if cleared == 0 {
            break;
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right
}

/// Clear the pixels of `target` inconsistent with `other`, returning how many were cleared.
fn check(target: &mut DisparityMap, other: &DisparityMap, threshold: u32, side: Side) -> usize {
    let width = target.width() as i64;
    let mut cleared = 0;

    for y in 0..target.height() {
        for x in 0..target.width() {
            let value = target.get(x, y);
            if value == 0 {
                continue;
            }

            let d = whole_disparity(value, target.factor());
            let matched = match side {
                Side::Left => x as i64 - d,
                Side::Right => x as i64 + d
            };

            let consistent = if matched < 0 || matched >= width {
                false
            }
            else {
                let other_d = whole_disparity(other.get(matched as usize, y), other.factor());
                other_d != 0 && (d - other_d).unsigned_abs() <= threshold as u64
            };

            if !consistent {
                target.put(x, y, 0);
                cleared += 1;
            }
        }
    }

    cleared
}

fn whole_disparity(value: u16, factor: u16) -> i64 {
    (value as f64 / factor as f64 + 0.5) as i64
}
