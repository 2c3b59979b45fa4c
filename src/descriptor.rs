//! # Descriptor maps
//!
//! This module provides the per-pixel feature descriptor map consumed by the matcher, along with
//! reading and writing of the binary descriptor tensor layout:
//!
//! - `i32` number of dimensions, which must be 3
//! - three `u64` extents: height, width and feature length
//! - `height * width * len` values of `f32`, row-major then by feature
//!
//! All values are little-endian.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const TENSOR_DIMS: i32 = 3;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A height by width grid of fixed-length feature vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorMap {
    height: usize,
    width: usize,
    len: usize,
    data: Vec<f32>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DescriptorMap {
    /// Wrap a row-major buffer of `height * width * len` values.
    pub fn new(height: usize, width: usize, len: usize, data: Vec<f32>) -> Result<Self> {
        let expected = element_count(height, width, len)?;
        if data.len() != expected {
            return Err(Error::Format(format!(
                "expected {} descriptor values for a {}x{}x{} map, got {}",
                expected,
                height,
                width,
                len,
                data.len()
            )));
        }

        Ok(Self {
            height,
            width,
            len,
            data
        })
    }

    /// Build a map by evaluating `f(x, y)` for every pixel.
    ///
    /// Fails if `f` returns a feature vector whose length is not `len`.
    pub fn from_fn<F>(height: usize, width: usize, len: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> Vec<f32>
    {
        let mut data = Vec::with_capacity(element_count(height, width, len)?);
        for y in 0..height {
            for x in 0..width {
                let v = f(x, y);
                if v.len() != len {
                    return Err(Error::Format(format!(
                        "descriptor at ({}, {}) has {} features, expected {}",
                        x,
                        y,
                        v.len(),
                        len
                    )));
                }
                data.extend_from_slice(&v);
            }
        }

        Ok(Self {
            height,
            width,
            len,
            data
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Length of every feature vector.
    pub fn feature_len(&self) -> usize {
        self.len
    }

    /// True if the map has no pixels.
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// The feature vector of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let start = (y * self.width + x) * self.len;
        &self.data[start..start + self.len]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Read a descriptor tensor from the given reader.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let dims = i32::from_le_bytes(read_array(&mut reader)?);
        if dims != TENSOR_DIMS {
            return Err(Error::Format(format!(
                "descriptor tensor must have {} dimensions, header declares {}",
                TENSOR_DIMS, dims
            )));
        }

        let mut extents = [0usize; 3];
        for e in extents.iter_mut() {
            let raw = u64::from_le_bytes(read_array(&mut reader)?);
            *e = raw as usize;
            if *e as u64 != raw {
                return Err(Error::Format(format!("extent {} does not fit in memory", raw)));
            }
        }
        let [height, width, len] = extents;
        let count = element_count(height, width, len)?;

        debug!("Reading {}x{}x{} descriptor tensor", height, width, len);

        // The header is untrusted, so the up-front capacity is capped.
        let mut data = Vec::with_capacity(count.min(1 << 20));
        for _ in 0..count {
            data.push(f32::from_le_bytes(read_array(&mut reader)?));
        }

        Ok(Self {
            height,
            width,
            len,
            data
        })
    }

    /// Load a descriptor tensor from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Write the map in the descriptor tensor layout.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&TENSOR_DIMS.to_le_bytes())?;
        for e in [self.height, self.width, self.len].iter() {
            writer.write_all(&(*e as u64).to_le_bytes())?;
        }
        for v in &self.data {
            writer.write_all(&v.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Save the map to a file in the descriptor tensor layout.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}

/// Euclidean distance between two feature vectors of equal length.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (p - q) * (p - q))
        .sum::<f32>()
        .sqrt()
}

fn element_count(height: usize, width: usize, len: usize) -> Result<usize> {
    height
        .checked_mul(width)
        .and_then(|n| n.checked_mul(len))
        .ok_or_else(|| {
            Error::Format(format!("descriptor extents {}x{}x{} overflow", height, width, len))
        })
}

/// Read exactly `N` bytes, reporting a short read as truncated data.
fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Format("descriptor data is truncated".into()),
        _ => Error::Io(e)
    })?;
    Ok(buf)
}
