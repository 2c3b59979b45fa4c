//! # Matching cost volumes
//!
//! This module builds the left-referenced matching cost volume from two descriptor maps, and
//! derives the right-referenced volume from it.
//!
//! `cost[y][x][d]` of the left volume is the Euclidean distance between the left descriptor at
//! `(x, y)` and the right descriptor at `(x - d, y)`. The right volume is its mirror,
//! `right[y][x][d] = left[y][x + d][d]`, so both volumes agree by construction.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::descriptor::{l2_distance, DescriptorMap};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Ceiling of a single matching cost.
pub const MAX_COST: f32 = 1000.0;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Cost given to disparities whose correspondent lies outside the other image.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Repeat the cost of the nearest disparity that has a correspondent.
    Clamp,

    /// Use `MAX_COST`, making such disparities effectively unreachable.
    MaxCost
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A height by width by disparity range volume of matching costs.
#[derive(Debug, Clone, PartialEq)]
pub struct CostVolume {
    height: usize,
    width: usize,
    range: usize,
    boundary: BoundaryPolicy,
    data: Vec<f32>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for BoundaryPolicy {
    fn default() -> Self {
        BoundaryPolicy::Clamp
    }
}

impl BoundaryPolicy {
    /// Cost of an unmatched disparity given the cost of its nearest matched one.
    fn fill(self, nearest: f32) -> f32 {
        match self {
            BoundaryPolicy::Clamp => nearest,
            BoundaryPolicy::MaxCost => MAX_COST
        }
    }
}

impl CostVolume {
    /// Wrap externally computed costs laid out as `[y][x][d]`.
    pub fn from_vec(height: usize, width: usize, range: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != height * width * range {
            return Err(Error::InvalidParameter(format!(
                "cost volume of {}x{}x{} needs {} values, got {}",
                height,
                width,
                range,
                height * width * range,
                data.len()
            )));
        }

        Ok(Self {
            height,
            width,
            range,
            boundary: BoundaryPolicy::Clamp,
            data
        })
    }

    /// Build the left-referenced cost volume for disparities `0..range`.
    pub fn build_left(
        left: &DescriptorMap,
        right: &DescriptorMap,
        range: usize,
        boundary: BoundaryPolicy
    ) -> Result<Self> {
        check_dimensions(left, right)?;

        let height = left.height();
        let width = left.width();
        let mut data = vec![0.0f32; height * width * range];

        if !data.is_empty() {
            data.par_chunks_mut(width * range)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, pixel) in row.chunks_mut(range).enumerate() {
                        let desc = left.pixel(x, y);
                        for d in 0..range {
                            pixel[d] = if x >= d {
                                let cost = l2_distance(desc, right.pixel(x - d, y));
                                debug_assert!(
                                    cost >= 0.0 && cost < MAX_COST,
                                    "matching cost {} at ({}, {}, {}) is out of bounds",
                                    cost, x, y, d
                                );
                                cost
                            }
                            else {
                                boundary.fill(pixel[d - 1])
                            };
                        }
                    }
                });
        }

        Ok(Self {
            height,
            width,
            range,
            boundary,
            data
        })
    }

    /// Derive the right-referenced volume from this left-referenced one.
    ///
    /// Disparities that would reach past the right border of the left image are filled using the
    /// volume's boundary policy, from the last disparity that stays inside.
    pub fn mirror(&self) -> Self {
        let (width, range, boundary) = (self.width, self.range, self.boundary);
        let mut data = vec![0.0f32; self.data.len()];

        if !data.is_empty() {
            data.par_chunks_mut(width * range)
                .enumerate()
                .for_each(|(y, row)| {
                    let src = self.row(y);
                    for (x, pixel) in row.chunks_mut(range).enumerate() {
                        let valid = (width - x).min(range);
                        for d in 0..valid {
                            pixel[d] = src[(x + d) * range + d];
                        }
                        let last = pixel[valid - 1];
                        for cost in pixel[valid..].iter_mut() {
                            *cost = boundary.fill(last);
                        }
                    }
                });
        }

        Self {
            height: self.height,
            width,
            range,
            boundary,
            data
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of candidate disparities.
    pub fn range(&self) -> usize {
        self.range
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// All costs of row `y`, `width * range` values.
    pub fn row(&self, y: usize) -> &[f32] {
        let stride = self.width * self.range;
        &self.data[y * stride..(y + 1) * stride]
    }

    /// Costs of every disparity at pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let start = (y * self.width + x) * self.range;
        &self.data[start..start + self.range]
    }

    pub fn get(&self, x: usize, y: usize, d: usize) -> f32 {
        self.data[(y * self.width + x) * self.range + d]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Fail if the two descriptor maps differ in height, width or feature length.
pub fn check_dimensions(left: &DescriptorMap, right: &DescriptorMap) -> Result<()> {
    if left.width() != right.width() || left.height() != right.height() {
        return Err(Error::DimensionMismatch {
            left: (left.width(), left.height()),
            right: (right.width(), right.height())
        });
    }
    if left.feature_len() != right.feature_len() {
        return Err(Error::Format(format!(
            "left descriptors have {} features, right descriptors have {}",
            left.feature_len(),
            right.feature_len()
        )));
    }
    Ok(())
}
