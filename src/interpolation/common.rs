//! Common utilities for interpolation algorithms.
//!
//! Resampling is separable: every destination row and column is mapped to an
//! interval of continuous source coordinates, and each axis interpolator turns
//! that interval into a short list of weighted source indices.

/// Weighted source indices contributing to one destination index
pub type Weights = Vec<(usize, f64)>;

/// Linear mapping from destination indices to source cell coordinates.
///
/// Source coordinates are edge based: cell `i` spans `[i, i + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    /// Source coordinate of the leading edge of destination cell 0
    pub offset: f64,
    /// Number of source cells per destination cell
    pub scale: f64,
    /// Number of cells along this axis in the source
    pub source_len: usize,
}

impl AxisMapping {
    pub fn new(offset: f64, scale: f64, source_len: usize) -> Self {
        Self {
            offset,
            scale,
            source_len,
        }
    }

    /// Source interval covered by a destination cell
    pub fn source_interval(&self, dest_index: usize) -> (f64, f64) {
        let start = self.offset + dest_index as f64 * self.scale;
        (start, start + self.scale)
    }

    /// Destination coordinate of a source cell edge
    pub fn dest_coordinate(&self, source_edge: usize) -> f64 {
        (source_edge as f64 - self.offset) / self.scale
    }

    /// Whether the source is finer than the destination along this axis
    pub fn is_downsampling(&self) -> bool {
        self.scale > 1.0
    }
}

/// Clamp an index to valid bounds
pub fn clamp_index(index: f64, size: usize) -> f64 {
    index.max(0.0).min((size - 1) as f64)
}

/// Get the weight for linear interpolation
pub fn linear_weight(fraction: f64) -> (f64, f64) {
    (1.0 - fraction, fraction)
}
