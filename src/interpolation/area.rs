//! Area-weighted averaging.
//!
//! Every source cell overlapping the destination cell contributes in
//! proportion to the overlap length. This is the conservative kernel used
//! when the source is finer than the destination.

use super::common::{clamp_index, Weights};
use super::AxisInterpolator;

/// Area-weighted interpolator
pub struct AreaInterpolator;

impl AxisInterpolator for AreaInterpolator {
    fn weights(&self, interval: (f64, f64), source_len: usize) -> Weights {
        let start = interval.0.max(0.0);
        let end = interval.1.min(source_len as f64);
        let width = end - start;

        if width <= 0.0 {
            // Interval lies outside the source; fall back to the closest cell
            let centre = (interval.0 + interval.1) / 2.0;
            return vec![(clamp_index(centre.floor(), source_len) as usize, 1.0)];
        }

        let first = start.floor() as usize;
        let last = (end.ceil() as usize).min(source_len);

        (first..last)
            .filter_map(|i| {
                let overlap = end.min((i + 1) as f64) - start.max(i as f64);
                (overlap > 0.0).then_some((i, overlap / width))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "area"
    }
}
