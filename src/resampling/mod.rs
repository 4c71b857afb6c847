//! Chunked spatial resampling onto the canonical cube grid.
//!
//! Resampling is separable. Along each axis the ratio between destination and
//! source cell size decides the kernel:
//!
//! - source finer than destination (downsampling): the method's downsampling
//!   kernel, area-weighted mean for [`ResampleMethod::Mean`] or nearest
//!   neighbour for [`ResampleMethod::Nearest`];
//! - source coarser than or equal to destination (upsampling): bilinear.
//!
//! The source is processed in tiles (see [`tiling`]) which run in parallel and
//! write disjoint destination blocks. Kernel weights are computed once per
//! destination row and column for the whole grid, so the result does not
//! depend on the tile size. NaN source cells are left out of every weighted
//! sum; a destination cell without any valid contribution is NaN.
//!
//! [`resample_windowed`] never needs the whole source: each tile requests the
//! source windows its weights refer to, at most `tile_size` cells per axis,
//! and accumulates them one at a time.

pub mod tiling;

use ndarray::{s, Array2, ArrayView2, CowArray, Ix2, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Instant;
use tracing::debug;

use crate::error::{CubeSourceError, Result};
use crate::interpolation::{get_interpolator, AxisInterpolator, AxisMapping, Weights};
use crate::logging::log_resample_stats;
pub use tiling::{plan_tiles, Tile};

/// Geographic bounds of a grid in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoExtent {
    pub const GLOBAL: GeoExtent = GeoExtent {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Whether `other` lies inside this extent, up to `tolerance` degrees
    pub fn contains(&self, other: &GeoExtent, tolerance: f64) -> bool {
        other.west >= self.west - tolerance
            && other.east <= self.east + tolerance
            && other.south >= self.south - tolerance
            && other.north <= self.north + tolerance
    }
}

/// A north-up regular grid: row 0 is the northernmost row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub width: usize,
    pub height: usize,
    pub extent: GeoExtent,
}

impl GridSpec {
    pub fn new(width: usize, height: usize, extent: GeoExtent) -> Self {
        Self {
            width,
            height,
            extent,
        }
    }

    /// A grid spanning the whole globe
    pub fn global(width: usize, height: usize) -> Self {
        Self::new(width, height, GeoExtent::GLOBAL)
    }

    /// Cell width in degrees
    pub fn res_x(&self) -> f64 {
        self.extent.width() / self.width as f64
    }

    /// Cell height in degrees
    pub fn res_y(&self) -> f64 {
        self.extent.height() / self.height as f64
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

/// Method used on axes where the source is finer than the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Area-weighted average - good for continuous data
    #[default]
    Mean,
    /// Value of the cell under the destination centre - preserves classes
    Nearest,
}

impl ResampleMethod {
    fn downsampling_kernel(&self) -> &'static str {
        match self {
            ResampleMethod::Mean => "area",
            ResampleMethod::Nearest => "nearest",
        }
    }

    /// Kernel applied along an axis with the given mapping
    pub fn kernel_for(&self, mapping: &AxisMapping) -> Result<Box<dyn AxisInterpolator>> {
        if mapping.is_downsampling() {
            get_interpolator(self.downsampling_kernel())
        } else {
            get_interpolator("bilinear")
        }
    }
}

/// Resample `source` (laid out on `source_grid`) onto `dest_grid`.
///
/// The returned array always has shape `(dest_grid.height, dest_grid.width)`.
pub fn resample(
    source: ArrayView2<f32>,
    source_grid: &GridSpec,
    dest_grid: &GridSpec,
    method: ResampleMethod,
    tile_size: usize,
) -> Result<Array2<f32>> {
    if source.dim() != source_grid.shape() {
        return Err(CubeSourceError::ResampleShape {
            message: format!(
                "Source array has shape {:?} but its grid is {}x{}",
                source.dim(),
                source_grid.height,
                source_grid.width
            ),
        });
    }

    resample_windowed(source_grid, dest_grid, method, tile_size, |rows, cols| {
        Ok(CowArray::from(source.clone().slice_move(s![rows, cols])))
    })
}

/// Resample a source that is read window by window.
///
/// `read_window(rows, cols)` must return the source cells `rows x cols` of
/// the grid described by `source_grid`. Every requested window spans at most
/// `tile_size` rows and `tile_size` columns.
pub fn resample_windowed<'a, F>(
    source_grid: &GridSpec,
    dest_grid: &GridSpec,
    method: ResampleMethod,
    tile_size: usize,
    read_window: F,
) -> Result<Array2<f32>>
where
    F: Fn(Range<usize>, Range<usize>) -> Result<CowArray<'a, f32, Ix2>> + Sync,
{
    validate_grids(source_grid, dest_grid, tile_size)?;
    let start = Instant::now();

    let rows = AxisMapping::new(
        (source_grid.extent.north - dest_grid.extent.north) / source_grid.res_y(),
        dest_grid.res_y() / source_grid.res_y(),
        source_grid.height,
    );
    let cols = AxisMapping::new(
        (dest_grid.extent.west - source_grid.extent.west) / source_grid.res_x(),
        dest_grid.res_x() / source_grid.res_x(),
        source_grid.width,
    );

    let row_kernel = method.kernel_for(&rows)?;
    let col_kernel = method.kernel_for(&cols)?;
    let row_weights = axis_weights(row_kernel.as_ref(), &rows, dest_grid.height);
    let col_weights = axis_weights(col_kernel.as_ref(), &cols, dest_grid.width);

    let tiles = plan_tiles(&rows, &cols, dest_grid.shape(), tile_size);
    debug!(
        tiles = tiles.len(),
        row_kernel = row_kernel.name(),
        col_kernel = col_kernel.name(),
        "Planned resample tiles"
    );

    let blocks = tiles
        .par_iter()
        .map(|tile| resample_tile(&read_window, tile, &row_weights, &col_weights, tile_size))
        .collect::<Result<Vec<Array2<f32>>>>()?;

    let mut dest = Array2::from_elem(dest_grid.shape(), f32::NAN);
    for (tile, block) in tiles.iter().zip(blocks) {
        dest.slice_mut(s![tile.dest_rows.clone(), tile.dest_cols.clone()])
            .assign(&block);
    }

    log_resample_stats(
        source_grid.shape(),
        dest_grid.shape(),
        tiles.len(),
        row_kernel.name(),
        col_kernel.name(),
        start,
    );

    Ok(dest)
}

fn validate_grids(source_grid: &GridSpec, dest_grid: &GridSpec, tile_size: usize) -> Result<()> {
    for (label, grid) in [("source", source_grid), ("destination", dest_grid)] {
        if grid.width == 0 || grid.height == 0 {
            return Err(CubeSourceError::ResampleShape {
                message: format!("Empty {} grid: {}x{}", label, grid.height, grid.width),
            });
        }
        if !(grid.extent.width() > 0.0 && grid.extent.height() > 0.0) {
            return Err(CubeSourceError::ResampleShape {
                message: format!("Degenerate {} extent: {:?}", label, grid.extent),
            });
        }
    }

    let tolerance = 1e-6 * source_grid.res_x().min(source_grid.res_y());
    if !source_grid.extent.contains(&dest_grid.extent, tolerance) {
        return Err(CubeSourceError::ResampleShape {
            message: format!(
                "Destination extent {:?} is not contained in source extent {:?}",
                dest_grid.extent, source_grid.extent
            ),
        });
    }

    if tile_size == 0 {
        return Err(CubeSourceError::ResampleShape {
            message: "Tile size cannot be 0".to_string(),
        });
    }

    Ok(())
}

fn axis_weights(kernel: &dyn AxisInterpolator, mapping: &AxisMapping, dest_len: usize) -> Vec<Weights> {
    (0..dest_len)
        .map(|d| kernel.weights(mapping.source_interval(d), mapping.source_len))
        .collect()
}

/// Source index range referenced by a set of destination weights
fn referenced_range(weights: &[Weights]) -> (usize, usize) {
    let indices = weights.iter().flatten().map(|&(i, _)| i);
    let lo = indices.clone().min().unwrap_or(0);
    let hi = indices.max().map_or(0, |i| i + 1);
    (lo, hi)
}

/// The part of `weights` whose source indices fall in `range`.
///
/// Kernels emit indices in ascending order.
fn weights_within<'w>(weights: &'w [(usize, f64)], range: &Range<usize>) -> &'w [(usize, f64)] {
    let lo = weights.partition_point(|&(i, _)| i < range.start);
    let hi = weights.partition_point(|&(i, _)| i < range.end);
    &weights[lo..hi]
}

/// Source chunks of at most `size` cells that at least one weight refers to
fn referenced_chunks(weights: &[Weights], size: usize) -> Vec<Range<usize>> {
    let (lo, hi) = referenced_range(weights);
    (lo..hi)
        .step_by(size)
        .map(|start| start..(start + size).min(hi))
        .filter(|chunk| weights.iter().any(|w| !weights_within(w, chunk).is_empty()))
        .collect()
}

/// Fill the destination block of one tile from its source windows
fn resample_tile<'a, F>(
    read_window: &F,
    tile: &Tile,
    row_weights: &[Weights],
    col_weights: &[Weights],
    chunk_size: usize,
) -> Result<Array2<f32>>
where
    F: Fn(Range<usize>, Range<usize>) -> Result<CowArray<'a, f32, Ix2>>,
{
    let tile_rows = &row_weights[tile.dest_rows.clone()];
    let tile_cols = &col_weights[tile.dest_cols.clone()];
    let shape = (tile_rows.len(), tile_cols.len());
    let mut sum = Array2::<f64>::zeros(shape);
    let mut weight_sum = Array2::<f64>::zeros(shape);

    let col_chunks = referenced_chunks(tile_cols, chunk_size);
    for rows in referenced_chunks(tile_rows, chunk_size) {
        for cols in &col_chunks {
            let window = read_window(rows.clone(), cols.clone())?;
            if window.dim() != (rows.len(), cols.len()) {
                return Err(CubeSourceError::ResampleShape {
                    message: format!(
                        "Source window rows {:?}, cols {:?} has shape {:?}",
                        rows,
                        cols,
                        window.dim()
                    ),
                });
            }

            for (i, weights) in tile_rows.iter().enumerate() {
                let row_part = weights_within(weights, &rows);
                if row_part.is_empty() {
                    continue;
                }
                for (j, weights) in tile_cols.iter().enumerate() {
                    for &(r, wr) in row_part {
                        for &(c, wc) in weights_within(weights, cols) {
                            let value = window[[r - rows.start, c - cols.start]];
                            if !value.is_nan() {
                                let w = wr * wc;
                                sum[[i, j]] += w * value as f64;
                                weight_sum[[i, j]] += w;
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(Zip::from(&sum)
        .and(&weight_sum)
        .map_collect(|&sum, &weight| {
            if weight > 0.0 {
                (sum / weight) as f32
            } else {
                f32::NAN
            }
        }))
}
