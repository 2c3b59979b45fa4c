//! # Disparity Computation
//!
//! This crate provides semi-global matching disparity computation for rectified stereo pairs
//! described by per-pixel feature descriptors.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
pub mod aggregate;
pub mod consistency;
pub mod cost;
pub mod descriptor;
pub mod params;
pub mod select;
pub mod sgm;
pub mod speckle;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::disparity::GrayImage16;
pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap};
    pub use crate::descriptor::DescriptorMap;
    pub use crate::params::Params;
    pub use crate::sgm::SgmStereo;
}
