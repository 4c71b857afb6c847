//! Configuration management for cubesource.
//!
//! Configuration is layered with the following precedence:
//! 1. Explicit overrides applied by the caller (highest priority)
//! 2. JSON config file
//! 3. Default values (lowest priority)
//!
//! There is no process-wide configuration: providers receive the cube
//! configuration and the source configuration at construction time.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CubeSourceError, Result};
use crate::resampling::{GeoExtent, GridSpec};

/// Global longitude span in degrees
const GLOBE_WIDTH_DEG: f64 = 360.0;
/// Global latitude span in degrees
const GLOBE_HEIGHT_DEG: f64 = 180.0;

/// Command-line arguments of the `inspect_sources` tool
#[derive(Parser, Debug)]
#[command(name = "inspect_sources")]
#[command(author, version, about = "Prepare a cube source provider and print its time-range index", long_about = None)]
pub struct Args {
    /// Provider name (aerosols, air_temperature, burnt_area, water_mask)
    pub provider: String,

    /// Source directory, relative to the sources root unless absolute
    pub dir: PathBuf,

    /// Directory relative source directories are resolved against
    #[arg(short = 'r', long, env = "CUBE_SOURCES_ROOT")]
    pub sources_root: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(short, long, env = "CUBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// First instant of the cube, e.g. 2001-01-01T00:00:00
    #[arg(long)]
    pub start_time: Option<NaiveDateTime>,

    /// Last instant of the cube
    #[arg(long)]
    pub end_time: Option<NaiveDateTime>,

    /// Print at most this many index entries
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CUBE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Defines the canonical cube grid and the temporal window of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeConfig {
    /// First instant of the cube (inclusive)
    #[serde(default = "default_start_time")]
    pub start_time: NaiveDateTime,

    /// Last instant of the cube
    #[serde(default = "default_end_time")]
    pub end_time: NaiveDateTime,

    /// Number of grid columns
    #[serde(default = "default_grid_width")]
    pub grid_width: usize,

    /// Number of grid rows
    #[serde(default = "default_grid_height")]
    pub grid_height: usize,

    /// Cell size in degrees
    #[serde(default = "default_spatial_res")]
    pub spatial_res: f64,

    /// Column offset of the grid from 180°W, in cells
    #[serde(default)]
    pub grid_x0: usize,

    /// Row offset of the grid from 90°N, in cells
    #[serde(default)]
    pub grid_y0: usize,

    /// Length of one cube time step in days
    #[serde(default = "default_temporal_res")]
    pub temporal_res: u32,

    /// Whether the cube only holds static layers
    #[serde(default)]
    pub static_data: bool,
}

impl CubeConfig {
    /// Destination grid of every resample performed for this cube
    pub fn grid_spec(&self) -> GridSpec {
        let west = -180.0 + self.grid_x0 as f64 * self.spatial_res;
        let north = 90.0 - self.grid_y0 as f64 * self.spatial_res;
        GridSpec::new(
            self.grid_width,
            self.grid_height,
            GeoExtent {
                west,
                south: north - self.grid_height as f64 * self.spatial_res,
                east: west + self.grid_width as f64 * self.spatial_res,
                north,
            },
        )
    }

    /// Consecutive `temporal_res`-day windows `[t0, t1)` covering the cube.
    ///
    /// The last window is cut at `end_time`.
    pub fn time_steps(&self) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        let step = Duration::days(i64::from(self.temporal_res.max(1)));
        let mut steps = Vec::new();
        let mut t0 = self.start_time;
        while t0 < self.end_time {
            let t1 = t0
                .checked_add_signed(step)
                .map_or(self.end_time, |t1| t1.min(self.end_time));
            steps.push((t0, t1));
            t0 = t1;
        }
        steps
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.start_time >= self.end_time {
            return Err(CubeSourceError::Config {
                message: format!(
                    "start_time {} must be before end_time {}",
                    self.start_time, self.end_time
                ),
            });
        }

        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(CubeSourceError::Config {
                message: format!(
                    "Grid must not be empty: {}x{}",
                    self.grid_width, self.grid_height
                ),
            });
        }

        if !(self.spatial_res > 0.0) {
            return Err(CubeSourceError::Config {
                message: format!("Invalid spatial resolution: {}", self.spatial_res),
            });
        }

        let eps = self.spatial_res * 1e-6;
        let span_x = (self.grid_x0 + self.grid_width) as f64 * self.spatial_res;
        let span_y = (self.grid_y0 + self.grid_height) as f64 * self.spatial_res;
        if span_x > GLOBE_WIDTH_DEG + eps || span_y > GLOBE_HEIGHT_DEG + eps {
            return Err(CubeSourceError::Config {
                message: format!(
                    "Grid of {}x{} cells at offset ({}, {}) exceeds the globe at resolution {}",
                    self.grid_width, self.grid_height, self.grid_x0, self.grid_y0, self.spatial_res
                ),
            });
        }

        if self.temporal_res == 0 {
            return Err(CubeSourceError::Config {
                message: "temporal_res cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            end_time: default_end_time(),
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            spatial_res: default_spatial_res(),
            grid_x0: 0,
            grid_y0: 0,
            temporal_res: default_temporal_res(),
            static_data: false,
        }
    }
}

/// Order in which temporal combination and spatial resampling are applied
/// when several source entries fall into one requested window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingOrder {
    /// Combine the source images first, then resample once
    #[default]
    TimeFirst,
    /// Resample every source image, then combine
    SpaceFirst,
}

/// Source-side configuration shared by all providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory relative provider directories are resolved against
    #[serde(default)]
    pub sources_root: Option<PathBuf>,

    /// Maximum number of simultaneously open dataset handles per provider
    #[serde(default = "default_cache_capacity")]
    pub dataset_cache_capacity: usize,

    /// Maximum tile edge, in source cells, used by the chunked resampler
    #[serde(default = "default_tile_size")]
    pub tile_size: usize,

    #[serde(default)]
    pub resampling_order: ResamplingOrder,
}

impl SourceConfig {
    /// Resolve a provider directory: absolute paths are kept, relative ones
    /// are joined to `sources_root` when it is set
    pub fn resolve_source_path(&self, dir: &Path) -> PathBuf {
        match &self.sources_root {
            Some(root) if dir.is_relative() => root.join(dir),
            _ => dir.to_path_buf(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.dataset_cache_capacity == 0 {
            return Err(CubeSourceError::Config {
                message: "dataset_cache_capacity cannot be 0".to_string(),
            });
        }

        if self.tile_size == 0 {
            return Err(CubeSourceError::Config {
                message: "tile_size cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sources_root: None,
            dataset_cache_capacity: default_cache_capacity(),
            tile_size: default_tile_size(),
            resampling_order: ResamplingOrder::default(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cube grid and time window
    #[serde(default)]
    pub cube: CubeConfig,

    /// Source resolution, caching and resampling
    #[serde(default)]
    pub sources: SourceConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from a JSON file on top of the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = path {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        Ok(config)
    }

    /// Load configuration from the file named in `args`, then apply the
    /// explicit overrides of `args`
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = Self::load(args.config.as_deref())?;

        if let Some(root) = &args.sources_root {
            config.sources.sources_root = Some(root.clone());
        }
        if let Some(start_time) = args.start_time {
            config.cube.start_time = start_time;
        }
        if let Some(end_time) = args.end_time {
            config.cube.end_time = end_time;
        }
        if let Some(log_level) = &args.log_level {
            config.log_level = log_level.clone();
        }

        Ok(config)
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        self.cube = other.cube;
        if other.sources.sources_root.is_some() {
            self.sources.sources_root = other.sources.sources_root;
        }
        self.sources.dataset_cache_capacity = other.sources.dataset_cache_capacity;
        self.sources.tile_size = other.sources.tile_size;
        self.sources.resampling_order = other.sources.resampling_order;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.cube.validate()?;
        self.sources.validate()?;

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(CubeSourceError::Config {
                message: format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.log_level
                ),
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cube: CubeConfig::default(),
            sources: SourceConfig::default(),
            log_level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn default_start_time() -> NaiveDateTime {
    midnight(2001, 1, 1)
}

fn default_end_time() -> NaiveDateTime {
    midnight(2012, 1, 1)
}

fn default_grid_width() -> usize {
    1440
}

fn default_grid_height() -> usize {
    720
}

fn default_spatial_res() -> f64 {
    0.25
}

fn default_temporal_res() -> u32 {
    8
}

fn default_cache_capacity() -> usize {
    32
}

fn default_tile_size() -> usize {
    180
}

fn default_log_level() -> String {
    "info".to_string()
}
