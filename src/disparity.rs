//! # General disparity objects
//!
//! This module provides the fixed-point disparity map and the trait implemented by disparity
//! algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, ImageBuffer, Luma};

use crate::descriptor::DescriptorMap;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// 16-bit grayscale image holding fixed-point disparities.
pub type GrayImage16 = ImageBuffer<Luma<u16>, Vec<u16>>;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A fixed-point disparity map.
///
/// Each value is a disparity multiplied by `factor` and rounded, 0 marks a pixel without a valid
/// disparity.
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityMap {
    width: usize,
    height: usize,
    factor: u16,
    data: Vec<u16>
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the left image from both descriptor maps.
    fn compute(&mut self, left: &DescriptorMap, right: &DescriptorMap) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    /// Create an all-invalid map.
    pub fn new(width: usize, height: usize, factor: u16) -> Self {
        DisparityMap {
            width,
            height,
            factor,
            data: vec![0; width * height]
        }
    }

    /// Wrap row-major fixed-point values.
    pub fn from_vec(width: usize, height: usize, factor: u16, data: Vec<u16>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidParameter(format!(
                "disparity map of {}x{} needs {} values, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }

        Ok(DisparityMap {
            width,
            height,
            factor,
            data
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Fixed-point units per disparity.
    pub fn factor(&self) -> u16 {
        self.factor
    }

    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.data[y * self.width + x]
    }

    pub fn put(&mut self, x: usize, y: usize, val: u16) {
        self.data[y * self.width + x] = val
    }

    /// Disparity at `(x, y)` in pixels, or `None` if the pixel is invalid.
    pub fn disparity(&self, x: usize, y: usize) -> Option<f32> {
        match self.get(x, y) {
            0 => None,
            v => Some(v as f32 / self.factor as f32)
        }
    }

    /// Number of pixels holding a valid disparity.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Row `y` of the map.
    pub fn row(&self, y: usize) -> &[u16] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Converts the map into an 8-bit image of whole disparities, saturating at 255.
    pub fn to_luma(&self) -> GrayImage {
        let factor = self.factor as f32;
        self.luma_with(|v| v as f32 / factor)
    }

    /// Converts the map into an 8-bit image normalised by the largest disparity in the map.
    ///
    /// An all-invalid map gives an all-black image.
    pub fn to_luma_normalised(&self) -> GrayImage {
        let max = self.data.iter().copied().max().unwrap_or(0);
        let mult = match max {
            0 => 0.0,
            m => 255.0 / m as f32
        };

        self.luma_with(|v| v as f32 * mult)
    }

    /// Converts the map into a 16-bit image holding the raw fixed-point values.
    pub fn to_image16(&self) -> GrayImage16 {
        ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
            Luma([self.get(x as usize, y as usize)])
        })
    }

    fn luma_with<F: Fn(u16) -> f32>(&self, f: F) -> GrayImage {
        let mut new = GrayImage::new(self.width as u32, self.height as u32);

        for y in 0..new.height() {
            for x in 0..new.width() {
                let val = f(self.get(x as usize, y as usize)).max(0.0).min(255.0);
                *new.get_pixel_mut(x, y) = Luma([val as u8]);
            }
        }

        new
    }
}
