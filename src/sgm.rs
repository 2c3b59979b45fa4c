//! # Semi-global matching
//!
//! This module provides a semi-global matching stereo algorithm operating on per-pixel feature
//! descriptors rather than intensities, following Hirschmüller's "Stereo Processing by
//! Semiglobal Matching and Mutual Information".
//!
//! The pipeline is:
//!
//! 1. build the left-referenced cost volume and mirror it into the right-referenced one,
//! 2. aggregate each volume over 8 directions in two sweeps,
//! 3. select a sub-pixel disparity per pixel and remove speckles, for each side,
//! 4. keep only left pixels consistent with the right map.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::aggregate::PathAggregator;
use crate::consistency::enforce_consistency;
use crate::cost::{check_dimensions, CostVolume};
use crate::descriptor::DescriptorMap;
use crate::disparity::{DisparityAlgorithm, DisparityMap};
use crate::error::Result;
use crate::params::{validate_consistency_threshold, validate_smoothness, validate_speckle, Params};
use crate::select::select;
use crate::speckle::filter_speckles;

#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Semi-global matcher. Only the parameters persist between computations.
#[derive(Debug, Clone)]
pub struct SgmStereo {
    params: Params
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for SgmStereo {
    fn default() -> Self {
        Self {
            params: Params::default()
        }
    }
}

impl SgmStereo {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Set the smoothness penalties, requiring `0 <= p1 < p2`.
    pub fn set_smoothness(&mut self, p1: i32, p2: i32) -> Result<()> {
        validate_smoothness(p1, p2)?;
        self.params.p1 = p1;
        self.params.p2 = p2;
        Ok(())
    }

    /// Set the left-right consistency threshold in whole disparities.
    pub fn set_consistency_threshold(&mut self, threshold: i32) -> Result<()> {
        validate_consistency_threshold(threshold)?;
        self.params.consistency_threshold = threshold;
        Ok(())
    }

    /// Set the largest speckle size in pixels and the speckle difference in whole disparities.
    pub fn set_speckle(&mut self, size: i32, difference: i32) -> Result<()> {
        validate_speckle(size, difference)?;
        self.params.speckle_size = size;
        self.params.speckle_difference = difference;
        Ok(())
    }

    /// Load both descriptor maps from disk and compute the disparity map.
    pub fn compute_from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        left_path: P,
        right_path: Q
    ) -> Result<DisparityMap> {
        let left = DescriptorMap::from_file(left_path)?;
        let right = DescriptorMap::from_file(right_path)?;
        self.compute(&left, &right)
    }

    /// Aggregate, select and despeckle the disparity map of one side.
    fn disparity_for(&self, cost: &CostVolume) -> Result<DisparityMap> {
        let t0 = Instant::now();

        let mut aggregator = PathAggregator::new(
            cost.width(),
            cost.range(),
            self.params.p1 as f32,
            self.params.p2 as f32
        );
        let sum = aggregator.aggregate(cost)?;
        let mut map = select(&sum, self.params.disparity_factor);

        filter_speckles(
            &mut map,
            self.params.speckle_size as usize,
            self.params.speckle_difference_fixed()
        );

        debug!("Side disparity computed in {:.3} s", t0.elapsed().as_secs_f64());
        Ok(map)
    }
}

impl DisparityAlgorithm for SgmStereo {
    /// Compute the validated left disparity map.
    fn compute(&mut self, left: &DescriptorMap, right: &DescriptorMap) -> Result<DisparityMap> {
        check_dimensions(left, right)?;

        let (width, height) = (left.width(), left.height());
        if left.is_empty() {
            return Ok(DisparityMap::new(width, height, self.params.disparity_factor));
        }

        debug!(
            "Matching {}x{} descriptors of length {} over {} disparities",
            width,
            height,
            left.feature_len(),
            self.params.disparity_range
        );

        info!("Computing data costs...");
        let t0 = Instant::now();
        let left_cost =
            CostVolume::build_left(left, right, self.params.disparity_range, self.params.boundary)?;
        let right_cost = left_cost.mirror();
        debug!("Cost volumes built in {:.3} s", t0.elapsed().as_secs_f64());

        info!("Computing left to right and right to left SGM...");
        let this: &Self = self;
        let (left_disp, right_disp) = rayon::join(
            || this.disparity_for(&left_cost),
            || this.disparity_for(&right_cost)
        );
        let (mut left_disp, mut right_disp) = (left_disp?, right_disp?);

        info!("Computing disparity image...");
        enforce_consistency(
            &mut left_disp,
            &mut right_disp,
            self.params.consistency_threshold as u32
        )?;

        debug!(
            "{} of {} pixels hold a valid disparity",
            left_disp.valid_count(),
            width * height
        );

        #[cfg(feature = "statistics")]
        plot_valid_pixels(&left_disp)?;

        Ok(left_disp)
    }
}

// -----------------------------------------------------------------------------------------------
// STATISTICS
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "statistics")]
fn plot_valid_pixels(map: &DisparityMap) -> Result<()> {
    std::fs::create_dir_all("plots/sgm")?;

    let valid_per_row: Vec<(usize, usize)> = (0..map.height())
        .map(|y| (y, map.row(y).iter().filter(|&&v| v != 0).count()))
        .collect();

    let valid_pixels = BitMapBackend::new(
        "plots/sgm/valid_pixels.png",
        (800, 600)
    ).into_drawing_area();
    valid_pixels.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&valid_pixels)
        .caption("Valid pixels per row", ("sans-serif", 20).into_font())
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_ranged(0..map.height(), 0..map.width() + 1)
        .map_err(plot_error)?;

    chart.configure_mesh().draw().map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(valid_per_row, &RED))
        .map_err(plot_error)?;

    info!("Stats plotting complete");
    Ok(())
}

#[cfg(feature = "statistics")]
fn plot_error<E: std::fmt::Debug>(e: E) -> crate::error::Error {
    crate::error::Error::Plot(format!("{:?}", e))
}
