//! # Matcher parameters
//!
//! This module provides the tunable parameters of the SGM matcher, their validation and loading
//! from TOML files.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cost::BoundaryPolicy;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

pub const DEFAULT_DISPARITY_RANGE: usize = 256;
pub const DEFAULT_DISPARITY_FACTOR: u16 = 256;
pub const DEFAULT_P1: i32 = 3;
pub const DEFAULT_P2: i32 = 40;
pub const DEFAULT_CONSISTENCY_THRESHOLD: i32 = 1;
pub const DEFAULT_SPECKLE_SIZE: i32 = 100;
pub const DEFAULT_SPECKLE_DIFFERENCE: i32 = 2;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Number of candidate disparities, `0..disparity_range`.
    pub disparity_range: usize,

    /// Fixed-point scale of the output map, one disparity is `disparity_factor` units.
    pub disparity_factor: u16,

    /// Penalty for a disparity change of one between neighbouring pixels.
    pub p1: i32,

    /// Penalty for any larger disparity change.
    pub p2: i32,

    /// Largest accepted left/right disagreement, in whole disparities.
    pub consistency_threshold: i32,

    /// Regions of at most this many pixels are removed as speckles.
    pub speckle_size: i32,

    /// Largest step between neighbours of one speckle region, in whole disparities.
    pub speckle_difference: i32,

    /// Cost assigned to disparities that have no correspondent inside the image.
    pub boundary: BoundaryPolicy
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            disparity_range: DEFAULT_DISPARITY_RANGE,
            disparity_factor: DEFAULT_DISPARITY_FACTOR,
            p1: DEFAULT_P1,
            p2: DEFAULT_P2,
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            speckle_size: DEFAULT_SPECKLE_SIZE,
            speckle_difference: DEFAULT_SPECKLE_DIFFERENCE,
            boundary: BoundaryPolicy::default()
        }
    }
}

impl Params {
    /// Parse and validate parameters from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Params = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Read, parse and validate parameters from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check every invariant of the parameter set.
    pub fn validate(&self) -> Result<()> {
        validate_smoothness(self.p1, self.p2)?;
        validate_consistency_threshold(self.consistency_threshold)?;
        validate_speckle(self.speckle_size, self.speckle_difference)?;

        if self.disparity_range == 0 {
            return Err(Error::InvalidParameter(
                "disparity range must contain at least one disparity".into()
            ));
        }
        if self.disparity_factor == 0 {
            return Err(Error::InvalidParameter("disparity factor must be positive".into()));
        }

        let max_fixed = (self.disparity_range as u64 - 1).checked_mul(self.disparity_factor as u64);
        if max_fixed.map_or(true, |m| m > u16::MAX as u64) {
            return Err(Error::InvalidParameter(format!(
                "disparity range {} with factor {} does not fit a 16 bit disparity map",
                self.disparity_range, self.disparity_factor
            )));
        }

        Ok(())
    }

    /// Largest neighbour step inside a speckle region, in fixed-point units.
    pub fn speckle_difference_fixed(&self) -> u32 {
        self.speckle_difference.max(0) as u32 * self.disparity_factor as u32
    }
}

pub(crate) fn validate_smoothness(p1: i32, p2: i32) -> Result<()> {
    if p1 < 0 || p2 < 0 {
        return Err(Error::InvalidParameter(format!(
            "smoothness penalties must not be negative (p1 = {}, p2 = {})",
            p1, p2
        )));
    }
    if p1 >= p2 {
        return Err(Error::InvalidParameter(format!(
            "small smoothness penalty must be smaller than the large one (p1 = {}, p2 = {})",
            p1, p2
        )));
    }
    Ok(())
}

pub(crate) fn validate_consistency_threshold(threshold: i32) -> Result<()> {
    if threshold < 0 {
        return Err(Error::InvalidParameter(format!(
            "consistency threshold must not be negative (got {})",
            threshold
        )));
    }
    Ok(())
}

pub(crate) fn validate_speckle(size: i32, difference: i32) -> Result<()> {
    if size < 0 || difference < 0 {
        return Err(Error::InvalidParameter(format!(
            "speckle size and difference must not be negative (size = {}, difference = {})",
            size, difference
        )));
    }
    Ok(())
}
