//! Generic provider for time-invariant sources.
//!
//! A static source is a flat directory holding one data file; the first file
//! with the family's extension, in file-name order, is used. Its image is
//! computed once and then served for every requested window. Static layers
//! can be very large, so they are resampled from tile-sized windows and
//! never loaded whole.

use chrono::NaiveDateTime;
use ndarray::Array2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{restore_fill_values, CubeSourceProvider, ProviderState, RowOrder, VariableImages, VariableWindows};
use crate::config::{CubeConfig, SourceConfig};
use crate::dataset::{Dataset, DatasetCache, DatasetOpener};
use crate::error::{CubeSourceError, Result};
use crate::indexer::SourceTimeRange;
use crate::logging::{log_error, log_operation_end, log_operation_start};
use crate::resampling::{GeoExtent, ResampleMethod};
use crate::variable::VariableDescriptor;

/// Family hooks of a static source
pub trait StaticSource: Send + Sync {
    fn name(&self) -> &str;

    fn variable_descriptors(&self) -> Vec<VariableDescriptor>;

    /// Extension of the source file, without the leading dot
    fn extension(&self) -> &str {
        "nc"
    }

    fn source_extent(&self) -> GeoExtent {
        GeoExtent::GLOBAL
    }

    fn resample_method(&self) -> ResampleMethod {
        ResampleMethod::Mean
    }

    fn row_order(&self) -> RowOrder {
        RowOrder::NorthUp
    }
}

/// Provider over a single time-invariant source file
pub struct StaticCubeSourceProvider {
    source: Box<dyn StaticSource>,
    cube_config: Arc<CubeConfig>,
    dir: PathBuf,
    tile_size: usize,
    descriptors: Vec<VariableDescriptor>,
    cache: DatasetCache,
    /// Single entry spanning the cube window, set by `prepare`
    index: Vec<SourceTimeRange>,
    images: Option<HashMap<String, Array2<f32>>>,
    state: ProviderState,
}

impl StaticCubeSourceProvider {
    pub fn new(
        source: Box<dyn StaticSource>,
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
            descriptors,
            cache: DatasetCache::new(opener, source_config.dataset_cache_capacity),
            index: Vec::new(),
            images: None,
            state: ProviderState::Uninitialized,
        }
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// The source file selected by the last `prepare`
    pub fn source_file(&self) -> Option<&Path> {
        self.index.first().map(|entry| entry.file_path.as_path())
    }

    /// First file with the family's extension, in file-name order
    fn find_source_file(&self) -> Result<PathBuf> {
        let extension = self.source.extension();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let matches = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == extension);
            if entry.file_type().is_file() && matches {
                return Ok(entry.into_path());
            }
        }

        Err(CubeSourceError::MissingSourceFile {
            dir: self.dir.clone(),
            extension: extension.to_string(),
        })
    }

    /// Open the source file through the dataset cache
    pub fn open_dataset(&self) -> Result<Arc<dyn Dataset>> {
        let path = self.source_file().ok_or_else(|| CubeSourceError::NotPrepared {
            provider: self.source.name().to_string(),
            state: self.state.to_string(),
        })?;
        self.cache.open_dataset(path)
    }

    /// Read a variable's whole first band, in north-up order
    pub fn get_dataset_image(&self, dataset: &dyn Dataset, var_name: &str) -> Result<Array2<f32>> {
        let image = dataset.read_image(var_name, 0)?;
        Ok(self.transform_source_image(image))
    }

    /// Bring an image read from the source file into north-up order
    pub fn transform_source_image(&self, image: Array2<f32>) -> Array2<f32> {
        self.source.row_order().to_north_up(image)
    }

    pub fn close_dataset(&self) {
        if let Some(path) = self.source_file() {
            self.cache.close_dataset(path);
        }
    }

    fn compute_images(&self) -> Result<HashMap<String, Array2<f32>>> {
        let dataset = self.open_dataset()?;
        let images = self
            .descriptors
            .iter()
            .map(|descriptor| {
                let image = VariableWindows::new(dataset.as_ref(), descriptor, 0, self.source.row_order())?
                    .resample_to_cube(
                        self.source.source_extent(),
                        &self.cube_config,
                        self.source.resample_method(),
                        self.tile_size,
                    )?;
                Ok((
                    descriptor.canonical_name.clone(),
                    restore_fill_values(image, descriptor),
                ))
            })
            .collect::<Result<HashMap<_, _>>>();
        self.close_dataset();
        images
    }
}

impl CubeSourceProvider for StaticCubeSourceProvider {
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
        self.images = None;
        self.state = ProviderState::Uninitialized;

        let validated = self.find_source_file().and_then(|path| {
            self.cache.open_dataset(&path)?;
            self.cache.close_dataset(&path);
            Ok(path)
        });

        match validated {
            Ok(path) => {
                info!(
                    provider = self.source.name(),
                    file = %path.display(),
                    "Selected static source file"
                );
                self.index.push(SourceTimeRange {
                    start: self.cube_config.start_time,
                    end: self.cube_config.end_time,
                    file_path: path,
                    band_index: 0,
                });
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
        Some((self.cube_config.start_time, self.cube_config.end_time))
    }

    fn source_time_ranges(&self) -> &[SourceTimeRange] {
        &self.index
    }

    /// The window is ignored: every call returns the same images
    fn compute_variable_images(&mut self, _t0: NaiveDateTime, _t1: NaiveDateTime) -> Result<VariableImages> {
        self.state.ensure_ready(self.source.name())?;

        let images = match &self.images {
            Some(images) => images.clone(),
            None => {
                let images = self.compute_images()?;
                debug!(
                    provider = self.source.name(),
                    variables = images.len(),
                    "Cached static images"
                );
                self.images = Some(images.clone());
                images
            }
        };

        self.state = ProviderState::Serving;
        Ok(VariableImages::new(images))
    }

    fn close(&mut self) {
        self.images = None;
        self.cache.clear_idle();
        self.state = ProviderState::Closed;
        debug!(provider = self.source.name(), "Closed provider");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{MemoryDataset, MemoryOpener};
    use crate::variable::NumericType;
    use ndarray::{ArrayD, IxDyn};
    use std::fs;
    use tempfile::tempdir;

    struct Mask;

    impl StaticSource for Mask {
        fn name(&self) -> &str {
            "mask"
        }

        fn variable_descriptors(&self) -> Vec<VariableDescriptor> {
            vec![VariableDescriptor::new("mask", "m", NumericType::Int8, 0.0)]
        }

        fn resample_method(&self) -> ResampleMethod {
            ResampleMethod::Nearest
        }
    }

    fn cube_config() -> Arc<CubeConfig> {
        Arc::new(CubeConfig {
            grid_width: 4,
            grid_height: 2,
            spatial_res: 90.0,
            ..CubeConfig::default()
        })
    }

    #[test]
    fn test_missing_source_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        let mut provider = StaticCubeSourceProvider::new(
            Box::new(Mask),
            cube_config(),
            &SourceConfig::default(),
            dir.path(),
            Arc::new(MemoryOpener::new()),
        );

        let result = provider.prepare();
        assert!(matches!(result, Err(CubeSourceError::MissingSourceFile { .. })));
        assert_eq!(provider.state(), ProviderState::Uninitialized);
    }

    #[test]
    fn test_first_file_by_name_and_cached_images() {
        let dir = tempdir().unwrap();
        let opener = Arc::new(MemoryOpener::new());
        for name in ["b.nc", "a.nc"] {
            let path = dir.path().join(name);
            fs::write(&path, b"").unwrap();
            opener.register(MemoryDataset::new(&path).with_variable("m", ArrayD::from_elem(IxDyn(&[8, 16]), 2.0)));
        }

        let config = cube_config();
        let mut provider = StaticCubeSourceProvider::new(
            Box::new(Mask),
            config.clone(),
            &SourceConfig::default(),
            dir.path(),
            opener.clone(),
        );
        provider.prepare().unwrap();
        assert_eq!(provider.source_file(), Some(dir.path().join("a.nc").as_path()));
        assert_eq!(
            provider.temporal_coverage(),
            Some((config.start_time, config.end_time))
        );

        let first = provider.compute_variable_images(config.start_time, config.end_time).unwrap();
        let opens = opener.open_calls();
        let second = provider.compute_variable_images(config.end_time, config.end_time).unwrap();
        assert_eq!(opener.open_calls(), opens);

        let image = first.get("mask").unwrap();
        assert_eq!(image.dim(), (2, 4));
        assert!(image.iter().all(|&v| v == 2.0));
        assert_eq!(second.get("mask"), Some(image));

        let dataset = provider.open_dataset().unwrap();
        let whole = provider.get_dataset_image(dataset.as_ref(), "m").unwrap();
        provider.close_dataset();
        assert_eq!(whole.dim(), (8, 16));
    }
}
