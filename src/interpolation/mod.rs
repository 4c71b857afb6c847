//! Interpolation kernels for the chunked resampler.
//!
//! Each kernel works along a single axis. The resampler combines a row kernel
//! and a column kernel, picking them per axis from the resolution ratio.

pub mod area;
pub mod bilinear;
pub mod common;
pub mod nearest;

pub use common::{AxisMapping, Weights};

use crate::error::{CubeSourceError, Result};

/// Trait for one-dimensional interpolation kernels
pub trait AxisInterpolator: Send + Sync {
    /// Weighted source indices for the source interval `[start, end)` covered
    /// by one destination cell. Weights are non-negative and sum to one.
    fn weights(&self, interval: (f64, f64), source_len: usize) -> Weights;

    /// Get the name of this interpolation method
    fn name(&self) -> &str;
}

/// Get an interpolator by name
pub fn get_interpolator(name: &str) -> Result<Box<dyn AxisInterpolator>> {
    match name.to_lowercase().as_str() {
        "nearest" => Ok(Box::new(nearest::NearestInterpolator)),
        "bilinear" => Ok(Box::new(bilinear::BilinearInterpolator)),
        "area" | "mean" => Ok(Box::new(area::AreaInterpolator)),
        _ => Err(CubeSourceError::InvalidParameter {
            param: "interpolation".to_string(),
            message: format!("Unknown interpolation method: {}", name),
        }),
    }
}
