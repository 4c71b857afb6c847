//! Bilinear interpolation.
//!
//! Along one axis this is linear interpolation between the two source cell
//! centres bracketing the destination cell centre. Applied to rows and
//! columns it yields bilinear interpolation from the four nearest cells.

use super::common::{clamp_index, linear_weight, Weights};
use super::AxisInterpolator;

/// Bilinear interpolator
pub struct BilinearInterpolator;

impl AxisInterpolator for BilinearInterpolator {
    fn weights(&self, interval: (f64, f64), source_len: usize) -> Weights {
        // Cell centres sit at i + 0.5
        let position = clamp_index((interval.0 + interval.1) / 2.0 - 0.5, source_len);
        let lower = position.floor() as usize;
        let fraction = position - lower as f64;

        if fraction == 0.0 || lower + 1 >= source_len {
            return vec![(lower, 1.0)];
        }

        let (w0, w1) = linear_weight(fraction);
        vec![(lower, w0), (lower + 1, w1)]
    }

    fn name(&self) -> &str {
        "bilinear"
    }
}
