//! Assertion utilities for testing.
//!
//! This module provides helper functions for making assertions in tests,
//! particularly for floating-point images and source indices.

use cubesource::SourceTimeRange;
use ndarray::Array2;

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f32 = 1e-5;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f32, expected: f32, epsilon: Option<f32>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that every cell of `image` is approximately `expected`.
pub fn assert_image_constant(image: &Array2<f32>, expected: f32) {
    for ((row, col), value) in image.indexed_iter() {
        assert!(
            (value - expected).abs() <= DEFAULT_EPSILON,
            "Cell ({}, {}) = {}, expected {}",
            row,
            col,
            value,
            expected
        );
    }
}

/// Assert that every cell of row `row` is approximately `expected`.
pub fn assert_row_approx_eq(image: &Array2<f32>, row: usize, expected: f32) {
    for (col, value) in image.row(row).iter().enumerate() {
        assert!(
            (value - expected).abs() <= DEFAULT_EPSILON,
            "Cell ({}, {}) = {}, expected {}",
            row,
            col,
            value,
            expected
        );
    }
}

/// Assert that an index is sorted and that consecutive entries touch.
pub fn assert_contiguous(entries: &[SourceTimeRange]) {
    for (i, pair) in entries.windows(2).enumerate() {
        assert!(
            pair[0].start < pair[0].end,
            "Entry {} is empty: {:?}",
            i,
            pair[0]
        );
        assert_eq!(
            pair[0].end, pair[1].start,
            "Gap or overlap between entries {} and {}",
            i,
            i + 1
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0, None);
        assert_approx_eq(1.0, 1.000001, None);
        assert_approx_eq(1.0, 1.001, Some(0.01));
    }

    #[test]
    fn test_assert_image_constant() {
        assert_image_constant(&arr2(&[[2.0f32, 2.0], [2.0, 2.000001]]), 2.0);
        assert_row_approx_eq(&arr2(&[[1.0f32, 1.0], [2.0, 3.0]]), 0, 1.0);
    }
}
