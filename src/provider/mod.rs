//! Cube source providers.
//!
//! A provider turns one source dataset into canonical cube images. Two
//! generic implementations exist:
//!
//! - [`TimeVaryingCubeSourceProvider`] indexes a year-directory tree and
//!   combines the entries overlapping a requested window;
//! - [`StaticCubeSourceProvider`] serves a single file regardless of time.
//!
//! Dataset families plug into them through the [`TimeVaryingSource`] and
//! [`StaticSource`] traits.

pub mod state;
pub mod static_source;
pub mod time_varying;

use chrono::NaiveDateTime;
use ndarray::{s, Array2, ArrayView2, CowArray};
use std::collections::HashMap;
use std::ops::Range;

use crate::config::CubeConfig;
use crate::dataset::Dataset;
use crate::error::{CoverageError, Result};
use crate::indexer::SourceTimeRange;
use crate::resampling::{resample, resample_windowed, GeoExtent, GridSpec, ResampleMethod};
use crate::variable::VariableDescriptor;

pub use state::ProviderState;
pub use static_source::{StaticCubeSourceProvider, StaticSource};
pub use time_varying::{TimeVaryingCubeSourceProvider, TimeVaryingSource};

/// Vertical order of the rows stored in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// Row 0 is the northernmost row, as on the cube grid
    #[default]
    NorthUp,
    /// Row 0 is the southernmost row
    SouthUp,
}

impl RowOrder {
    /// Bring a stored image or window into north-up order
    pub fn to_north_up(self, image: Array2<f32>) -> Array2<f32> {
        match self {
            RowOrder::NorthUp => image,
            RowOrder::SouthUp => image.slice_move(s![..;-1, ..]),
        }
    }

    /// Stored rows holding the north-up rows `rows` of an image `height` rows tall
    pub fn stored_rows(self, rows: Range<usize>, height: usize) -> Range<usize> {
        match self {
            RowOrder::NorthUp => rows,
            RowOrder::SouthUp => height - rows.end..height - rows.start,
        }
    }
}

/// Images computed for one requested window
#[derive(Debug, Clone, Default)]
pub struct VariableImages {
    /// Canonical variable name to image on the cube grid
    pub images: HashMap<String, Array2<f32>>,
    /// Set when no source data overlaps the window; `images` is then empty
    pub coverage_error: Option<CoverageError>,
}

impl VariableImages {
    pub fn new(images: HashMap<String, Array2<f32>>) -> Self {
        Self {
            images,
            coverage_error: None,
        }
    }

    /// An empty result flagging a coverage gap
    pub fn gap(error: CoverageError) -> Self {
        Self {
            images: HashMap::new(),
            coverage_error: Some(error),
        }
    }

    pub fn get(&self, canonical_name: &str) -> Option<&Array2<f32>> {
        self.images.get(canonical_name)
    }

    pub fn is_gap(&self) -> bool {
        self.coverage_error.is_some()
    }
}

/// A source of cube images
pub trait CubeSourceProvider: Send {
    fn name(&self) -> &str;

    fn variable_descriptors(&self) -> &[VariableDescriptor];

    /// Build the time-range index, or validate the static source file.
    ///
    /// Legal in every state; always rebuilds from scratch.
    fn prepare(&mut self) -> Result<()>;

    fn state(&self) -> ProviderState;

    /// Overall `[start, end)` of the available source data
    fn temporal_coverage(&self) -> Option<(NaiveDateTime, NaiveDateTime)>;

    /// The index built by the last `prepare`
    fn source_time_ranges(&self) -> &[SourceTimeRange];

    /// Compute one image per variable for the window `[t0, t1)`
    fn compute_variable_images(&mut self, t0: NaiveDateTime, t1: NaiveDateTime) -> Result<VariableImages>;

    /// Release cached datasets. Images cannot be computed until the next `prepare`.
    fn close(&mut self);
}

/// Replace fill values with NaN so resampling skips them
pub(crate) fn mask_fill_values(mut image: Array2<f32>, descriptor: &VariableDescriptor) -> Array2<f32> {
    image.mapv_inplace(|v| if descriptor.is_fill(v) { f32::NAN } else { v });
    image
}

/// Write cells without valid data back as the fill value
pub(crate) fn restore_fill_values(mut image: Array2<f32>, descriptor: &VariableDescriptor) -> Array2<f32> {
    let fill = descriptor.fill_value as f32;
    let integer = descriptor.numeric_type.is_integer();
    image.mapv_inplace(|v| {
        if v.is_nan() {
            fill
        } else if integer {
            v.round()
        } else {
            v
        }
    });
    image
}

/// Resample a source image spanning `extent` onto the cube grid
pub(crate) fn resample_to_cube(
    image: ArrayView2<f32>,
    extent: GeoExtent,
    cube_config: &CubeConfig,
    method: ResampleMethod,
    tile_size: usize,
) -> Result<Array2<f32>> {
    let (height, width) = image.dim();
    let source_grid = GridSpec::new(width, height, extent);
    resample(image, &source_grid, &cube_config.grid_spec(), method, tile_size)
}

/// North-up, fill-masked windows of one band of one source variable
pub(crate) struct VariableWindows<'d> {
    dataset: &'d dyn Dataset,
    descriptor: &'d VariableDescriptor,
    band: usize,
    row_order: RowOrder,
    height: usize,
    width: usize,
}

impl<'d> VariableWindows<'d> {
    pub(crate) fn new(
        dataset: &'d dyn Dataset,
        descriptor: &'d VariableDescriptor,
        band: usize,
        row_order: RowOrder,
    ) -> Result<Self> {
        let (height, width) = dataset.image_dim(&descriptor.source_name)?;
        Ok(Self {
            dataset,
            descriptor,
            band,
            row_order,
            height,
            width,
        })
    }

    fn read(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f32>> {
        let stored = self.row_order.stored_rows(rows, self.height);
        let window = self
            .dataset
            .read_window(&self.descriptor.source_name, self.band, stored, cols)?;
        Ok(mask_fill_values(self.row_order.to_north_up(window), self.descriptor))
    }

    /// Resample onto the cube grid, reading one tile window at a time
    pub(crate) fn resample_to_cube(
        &self,
        extent: GeoExtent,
        cube_config: &CubeConfig,
        method: ResampleMethod,
        tile_size: usize,
    ) -> Result<Array2<f32>> {
        let source_grid = GridSpec::new(self.width, self.height, extent);
        resample_windowed(&source_grid, &cube_config.grid_spec(), method, tile_size, |rows, cols| {
            self.read(rows, cols).map(CowArray::from)
        })
    }
}
