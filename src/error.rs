//! # Error standards
//! 
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A configuration value was rejected. The previous configuration is kept.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Left and right inputs do not share the same image size, given as (width, height).
    #[error("Dimension mismatch: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize)
    },

    /// Serialised descriptor data is malformed.
    #[error("Malformed descriptor data: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse parameters: {0}")]
    Config(#[from] toml::de::Error),

    #[cfg(feature = "statistics")]
    #[error("Statistics plotting failed: {0}")]
    Plot(String)
}
