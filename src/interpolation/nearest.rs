//! Nearest neighbor interpolation.
//!
//! This method selects the source cell containing the centre of the
//! destination cell. It preserves exact values, which makes it the kernel of
//! choice for categorical layers such as land/water classifications.

use super::common::{clamp_index, Weights};
use super::AxisInterpolator;

/// Nearest neighbor interpolator
pub struct NearestInterpolator;

impl AxisInterpolator for NearestInterpolator {
    fn weights(&self, interval: (f64, f64), source_len: usize) -> Weights {
        let centre = (interval.0 + interval.1) / 2.0;
        let index = clamp_index(centre.floor(), source_len) as usize;
        vec![(index, 1.0)]
    }

    fn name(&self) -> &str {
        "nearest"
    }
}
