//! Generic provider for sources indexed by time.

use chrono::NaiveDateTime;
use ndarray::{Array2, Zip};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::{
    mask_fill_values, resample_to_cube, restore_fill_values, CubeSourceProvider, ProviderState,
    RowOrder, VariableImages, VariableWindows,
};
use crate::config::{CubeConfig, ResamplingOrder, SourceConfig};
use crate::dataset::{Dataset, DatasetCache, DatasetOpener};
use crate::error::{CoverageError, CubeSourceError, Result};
use crate::indexer::{
    temporal_coverage, BandLayout, Cadence, FileNaming, SourceTimeRange, TimeRangeIndexer,
};
use crate::logging::{log_error, log_index_stats, log_operation_end, log_operation_start};
use crate::resampling::{GeoExtent, ResampleMethod};
use crate::variable::VariableDescriptor;

/// Family hooks of a time-varying source
pub trait TimeVaryingSource: Send + Sync {
    fn name(&self) -> &str;

    fn variable_descriptors(&self) -> Vec<VariableDescriptor>;

    /// How source file names encode their dates
    fn file_naming(&self) -> FileNaming;

    /// Period covered by one band
    fn cadence(&self) -> Cadence;

    fn band_layout(&self) -> BandLayout {
        BandLayout::Single
    }

    /// Geographic extent of the source images
    fn source_extent(&self) -> GeoExtent {
        GeoExtent::GLOBAL
    }

    fn resample_method(&self) -> ResampleMethod {
        ResampleMethod::Mean
    }

    /// Row order of the images stored in source files
    fn row_order(&self) -> RowOrder {
        RowOrder::NorthUp
    }

    /// Build the index. Families with unusual layouts may override this.
    fn compute_source_time_ranges(
        &self,
        indexer: &TimeRangeIndexer,
        cache: &DatasetCache,
    ) -> Result<Vec<SourceTimeRange>> {
        indexer.compute_source_time_ranges(cache)
    }
}

/// NaN-aware weighted mean of equally shaped images
struct WeightedMean {
    sum: Array2<f64>,
    weight: Array2<f64>,
}

impl WeightedMean {
    fn new(shape: (usize, usize)) -> Self {
        Self {
            sum: Array2::zeros(shape),
            weight: Array2::zeros(shape),
        }
    }

    fn add(&mut self, image: &Array2<f32>, weight: f64) -> Result<()> {
        if image.dim() != self.sum.dim() {
            return Err(CubeSourceError::ResampleShape {
                message: format!(
                    "cannot combine images of shape {:?} and {:?}",
                    image.dim(),
                    self.sum.dim()
                ),
            });
        }

        Zip::from(&mut self.sum)
            .and(&mut self.weight)
            .and(image)
            .for_each(|sum, total, &value| {
                if !value.is_nan() {
                    *sum += value as f64 * weight;
                    *total += weight;
                }
            });
        Ok(())
    }

    fn finish(self) -> Array2<f32> {
        Zip::from(&self.sum)
            .and(&self.weight)
            .map_collect(|&sum, &weight| {
                if weight > 0.0 {
                    (sum / weight) as f32
                } else {
                    f32::NAN
                }
            })
    }
}

/// Provider over a year-directory tree of dated source files
pub struct TimeVaryingCubeSourceProvider {
    source: Box<dyn TimeVaryingSource>,
    cube_config: Arc<CubeConfig>,
    dir: PathBuf,
    tile_size: usize,
    resampling_order: ResamplingOrder,
    descriptors: Vec<VariableDescriptor>,
    cache: DatasetCache,
    index: Vec<SourceTimeRange>,
    state: ProviderState,
}

impl TimeVaryingCubeSourceProvider {
    /// Create a provider reading `dir`, resolved against the sources root
    pub fn new(
        source: Box<dyn TimeVaryingSource>,
        cube_config: Arc<CubeConfig>,
        source_config: &SourceConfig,
        dir: &Path,
        opener: Arc<dyn DatasetOpener>,
    ) -> Self {
        let descriptors = source.variable_descriptors();
        Self {
            source,
            cube_config,
            dir: source_config.resolve_source_path(dir),
            tile_size: source_config.tile_size,
            resampling_order: source_config.resampling_order,
            descriptors,
            cache: DatasetCache::new(opener, source_config.dataset_cache_capacity),
            index: Vec::new(),
            state: ProviderState::Uninitialized,
        }
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir
    }

    pub fn cube_config(&self) -> &CubeConfig {
        &self.cube_config
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Open a source file through the dataset cache
    pub fn open_dataset(&self, path: &Path) -> Result<Arc<dyn Dataset>> {
        self.cache.open_dataset(path)
    }

    /// Read one whole band of a variable, in north-up order
    pub fn get_dataset_image(&self, dataset: &dyn Dataset, var_name: &str, band_index: usize) -> Result<Array2<f32>> {
        let image = dataset.read_image(var_name, band_index)?;
        Ok(self.transform_source_image(image))
    }

    /// Bring an image read from a source file into north-up order
    pub fn transform_source_image(&self, image: Array2<f32>) -> Array2<f32> {
        self.source.row_order().to_north_up(image)
    }

    pub fn close_dataset(&self, path: &Path) {
        self.cache.close_dataset(path)
    }

    fn indexer(&self) -> TimeRangeIndexer {
        TimeRangeIndexer::new(
            &self.dir,
            self.source.file_naming(),
            self.source.cadence(),
            self.source.band_layout(),
            self.cube_config.start_time,
            self.cube_config.end_time,
        )
    }

    /// Images of every variable of one entry, on the grid they are combined on.
    ///
    /// Time-first combination needs whole source images; space-first
    /// resamples each entry straight from tile-sized windows.
    fn read_entry_images(&self, entry: &SourceTimeRange) -> Result<Vec<Array2<f32>>> {
        let dataset = self.open_dataset(&entry.file_path)?;
        let images = self
            .descriptors
            .iter()
            .map(|descriptor| match self.resampling_order {
                ResamplingOrder::TimeFirst => {
                    let image =
                        self.get_dataset_image(dataset.as_ref(), &descriptor.source_name, entry.band_index)?;
                    Ok(mask_fill_values(image, descriptor))
                }
                ResamplingOrder::SpaceFirst => {
                    VariableWindows::new(dataset.as_ref(), descriptor, entry.band_index, self.source.row_order())?
                        .resample_to_cube(
                            self.source.source_extent(),
                            &self.cube_config,
                            self.source.resample_method(),
                            self.tile_size,
                        )
                }
            })
            .collect::<Result<Vec<_>>>();
        self.close_dataset(&entry.file_path);
        images
    }

    fn resample(&self, image: &Array2<f32>) -> Result<Array2<f32>> {
        resample_to_cube(
            image.view(),
            self.source.source_extent(),
            &self.cube_config,
            self.source.resample_method(),
            self.tile_size,
        )
    }

    fn combine_entries(
        &self,
        entries: &[&SourceTimeRange],
        t0: NaiveDateTime,
        t1: NaiveDateTime,
    ) -> Result<HashMap<String, Array2<f32>>> {
        let mut accumulators: Vec<Option<WeightedMean>> =
            self.descriptors.iter().map(|_| None).collect();

        for entry in entries {
            let weight = entry.overlap(t0, t1).num_seconds() as f64;
            debug!(
                file = %entry.file_path.display(),
                band = entry.band_index,
                weight = weight,
                "Reading source entry"
            );

            for (slot, image) in accumulators.iter_mut().zip(self.read_entry_images(entry)?) {
                slot.get_or_insert_with(|| WeightedMean::new(image.dim()))
                    .add(&image, weight)?;
            }
        }

        let mut images = HashMap::with_capacity(self.descriptors.len());
        for (descriptor, slot) in self.descriptors.iter().zip(accumulators) {
            let Some(mean) = slot else { continue };
            let combined = mean.finish();
            let image = match self.resampling_order {
                ResamplingOrder::TimeFirst => self.resample(&combined)?,
                ResamplingOrder::SpaceFirst => combined,
            };
            images.insert(
                descriptor.canonical_name.clone(),
                restore_fill_values(image, descriptor),
            );
        }
        Ok(images)
    }
}

impl CubeSourceProvider for TimeVaryingCubeSourceProvider {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn variable_descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    fn prepare(&mut self) -> Result<()> {
        let start = Instant::now();
        log_operation_start("prepare", Some(self.source.name()));

        self.index.clear();
        self.state = ProviderState::Uninitialized;

        let indexer = self.indexer();
        match self.source.compute_source_time_ranges(&indexer, &self.cache) {
            Ok(index) => {
                let files = index
                    .iter()
                    .map(|entry| &entry.file_path)
                    .collect::<std::collections::HashSet<_>>()
                    .len();
                log_index_stats(self.source.name(), files, index.len(), temporal_coverage(&index));
                self.index = index;
                self.state = ProviderState::Prepared;
                log_operation_end("prepare", start, true);
                Ok(())
            }
            Err(e) => {
                log_error(&e, &format!("prepare {}", self.source.name()));
                log_operation_end("prepare", start, false);
                Err(e)
            }
        }
    }

    fn state(&self) -> ProviderState {
        self.state
    }

    fn temporal_coverage(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        temporal_coverage(&self.index)
    }

    fn source_time_ranges(&self) -> &[SourceTimeRange] {
        &self.index
    }

    fn compute_variable_images(&mut self, t0: NaiveDateTime, t1: NaiveDateTime) -> Result<VariableImages> {
        self.state.ensure_ready(self.source.name())?;
        if t0 >= t1 {
            return Err(CubeSourceError::InvalidParameter {
                param: "time_window".to_string(),
                message: format!("start {} must be before end {}", t0, t1),
            });
        }

        let entries: Vec<&SourceTimeRange> =
            self.index.iter().filter(|entry| entry.overlaps(t0, t1)).collect();

        let result = if entries.is_empty() {
            info!(
                provider = self.source.name(),
                t0 = %t0,
                t1 = %t1,
                "No source data for requested window"
            );
            VariableImages::gap(CoverageError {
                provider: self.source.name().to_string(),
                requested_start: t0,
                requested_end: t1,
                coverage: temporal_coverage(&self.index),
            })
        } else {
            let start = Instant::now();
            let images = self.combine_entries(&entries, t0, t1)?;
            info!(
                provider = self.source.name(),
                t0 = %t0,
                t1 = %t1,
                entries = entries.len(),
                variables = images.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Computed variable images"
            );
            VariableImages::new(images)
        };

        self.state = ProviderState::Serving;
        Ok(result)
    }

    fn close(&mut self) {
        self.cache.clear_idle();
        self.state = ProviderState::Closed;
        debug!(provider = self.source.name(), "Closed provider");
    }
}
