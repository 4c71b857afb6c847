//! # cubesource
//!
//! Time-indexed, resampled source images for regular space-time data cubes.
//!
//! Geoscientific source datasets come with their own temporal cadence and
//! their own grid. This library indexes them by time and resamples their
//! images onto one canonical cube grid, so that a cube writer only ever sees
//! uniform images for uniform time steps.
//!
//! ## Key Features
//!
//! - **Time-range indexing**: Walks year-directory trees and decodes per-file (and per-band) coverage from file names
//! - **Chunked resampling**: Tiled, parallel, NaN-aware resampling with area-mean, nearest and bilinear kernels
//! - **Bounded dataset cache**: Reference-counted open handles with LRU eviction of idle files
//! - **Provider facade**: One trait for time-varying and static sources, with concrete dataset families
//!
//! ## Architecture
//!
//! - **Dataset Layer**: [`dataset`] opens NetCDF or in-memory datasets behind a shared cache
//! - **Index Layer**: [`indexer`] builds the sorted list of source time ranges
//! - **Processing**: [`resampling`] and [`interpolation`] map source images onto the cube grid
//! - **Providers**: [`provider`] composes the layers; [`providers`] holds the concrete families

pub mod config;
pub mod dataset;
pub mod error;
pub mod indexer;
pub mod interpolation;
pub mod logging;
pub mod provider;
pub mod providers;
pub mod resampling;
pub mod variable;

pub use config::{Config, CubeConfig, ResamplingOrder, SourceConfig};
pub use dataset::{CacheStats, Dataset, DatasetCache, DatasetOpener, MemoryDataset, MemoryOpener};
#[cfg(feature = "netcdf")]
pub use dataset::NetCdfOpener;
pub use error::{CoverageError, CubeSourceError, Result};
pub use indexer::{BandLayout, Cadence, DateEncoding, FileNaming, SourceTimeRange, TimeRangeIndexer};
pub use logging::{
    init_tracing, log_error, log_index_stats, log_operation_end, log_operation_start,
    log_resample_stats, log_timed_operation,
};
pub use provider::{
    CubeSourceProvider, ProviderState, RowOrder, StaticCubeSourceProvider, StaticSource,
    TimeVaryingCubeSourceProvider, TimeVaryingSource, VariableImages,
};
#[cfg(feature = "netcdf")]
pub use providers::create_provider;
pub use providers::{create_provider_with_opener, PROVIDER_NAMES};
pub use resampling::{resample, resample_windowed, GeoExtent, GridSpec, ResampleMethod};
pub use variable::{NumericType, Provenance, VariableDescriptor};
