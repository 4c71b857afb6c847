//! Providers read large sources in tile-sized windows.
//!
//! The datasets here generate their cells on demand, so a source can report
//! the shape of a full-resolution global raster without holding it.

use chrono::{NaiveDate, NaiveDateTime};
use cubesource::{
    create_provider_with_opener, CubeConfig, CubeSourceError, Dataset, DatasetOpener, ResamplingOrder,
    Result, SourceConfig,
};
use ndarray::Array2;
use parking_lot::Mutex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

/// Value of stored cell (band, row, col)
type CellFn = fn(usize, usize, usize) -> f32;

/// A generated dataset that records the shape of every window it serves
struct RecordingDataset {
    path: PathBuf,
    variables: Vec<String>,
    shape: Vec<usize>,
    cell: CellFn,
    reads: Mutex<Vec<(usize, usize)>>,
}

impl RecordingDataset {
    fn new(variables: &[&str], shape: &[usize], cell: CellFn) -> Arc<Self> {
        Arc::new(Self {
            path: PathBuf::from("generated.nc"),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            shape: shape.to_vec(),
            cell,
            reads: Mutex::new(Vec::new()),
        })
    }

    fn reads(&self) -> Vec<(usize, usize)> {
        self.reads.lock().clone()
    }
}

impl Dataset for RecordingDataset {
    fn path(&self) -> &Path {
        &self.path
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<usize>> {
        if self.variables.iter().any(|v| v == name) {
            Ok(self.shape.clone())
        } else {
            Err(CubeSourceError::DataNotFound {
                message: format!("Variable '{}' not found", name),
            })
        }
    }

    fn read_window(&self, name: &str, band: usize, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f32>> {
        self.variable_shape(name)?;
        self.reads.lock().push((rows.len(), cols.len()));
        Ok(Array2::from_shape_fn((rows.len(), cols.len()), |(r, c)| {
            (self.cell)(band, rows.start + r, cols.start + c)
        }))
    }
}

/// Serves the same dataset for every path
struct RecordingOpener(Arc<RecordingDataset>);

impl DatasetOpener for RecordingOpener {
    fn open(&self, _path: &Path) -> Result<Arc<dyn Dataset>> {
        Ok(self.0.clone() as Arc<dyn Dataset>)
    }
}

fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// A 36x18 cube at 10 degrees over 2003
fn cube_config() -> Arc<CubeConfig> {
    Arc::new(CubeConfig {
        start_time: midnight(2003, 1, 1),
        end_time: midnight(2003, 12, 31),
        grid_width: 36,
        grid_height: 18,
        spatial_res: 10.0,
        ..CubeConfig::default()
    })
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

#[test]
fn test_global_water_mask_is_never_read_whole() {
    // 1/720 degree global raster: land west of the meridian, water east of it
    const HEIGHT: usize = 129_600;
    const WIDTH: usize = 259_200;
    let dataset = RecordingDataset::new(&["wb_class"], &[HEIGHT, WIDTH], |_, _, col| {
        if col < WIDTH / 2 {
            1.0
        } else {
            2.0
        }
    });

    let dir = tempdir().unwrap();
    touch(&dir.path().join("ESACCI-LC-L4-WB-Map-150m-P13Y-2000-v4.0.nc"));

    let config = cube_config();
    let source_config = SourceConfig::default();
    let mut provider = create_provider_with_opener(
        "water_mask",
        config.clone(),
        &source_config,
        dir.path(),
        Arc::new(RecordingOpener(dataset.clone())),
    )
    .unwrap();
    provider.prepare().unwrap();

    let images = provider
        .compute_variable_images(config.start_time, config.end_time)
        .unwrap();
    let image = images.get("water_mask").unwrap();
    assert_eq!(image.dim(), (18, 36));
    for ((_, col), &value) in image.indexed_iter() {
        assert_eq!(value, if col < 18 { 1.0 } else { 2.0 }, "column {}", col);
    }

    let reads = dataset.reads();
    let tile = source_config.tile_size;
    assert!(!reads.is_empty());
    assert!(
        reads.iter().all(|&(h, w)| h <= tile && w <= tile),
        "window larger than {}x{}: {:?}",
        tile,
        tile,
        reads.iter().max_by_key(|&&(h, w)| h * w)
    );
    let cells: usize = reads.iter().map(|&(h, w)| h * w).sum();
    assert!(cells < HEIGHT * WIDTH / 1000, "read {} cells", cells);
}

#[test]
fn test_space_first_reads_tile_windows_south_up() {
    const VARIABLES: [&str; 5] = [
        "AOD1610_mean",
        "AOD550_mean",
        "AOD555_mean",
        "AOD659_mean",
        "AOD865_mean",
    ];
    // 1 degree source stored south first: stored row r holds r
    let dataset = RecordingDataset::new(&VARIABLES, &[180, 360], |_, row, _| row as f32);

    let dir = tempdir().unwrap();
    touch(&dir.path().join("2003/20030101-ESACCI-L3C_AEROSOL-AOD-AATSR_ENVISAT-SU_DAILY-fv4.1.nc"));

    let config = cube_config();
    let source_config = SourceConfig {
        tile_size: 20,
        resampling_order: ResamplingOrder::SpaceFirst,
        ..SourceConfig::default()
    };
    let mut provider = create_provider_with_opener(
        "aerosols",
        config.clone(),
        &source_config,
        dir.path(),
        Arc::new(RecordingOpener(dataset.clone())),
    )
    .unwrap();
    provider.prepare().unwrap();
    assert_eq!(provider.source_time_ranges().len(), 1);

    let images = provider
        .compute_variable_images(midnight(2003, 1, 1), midnight(2003, 1, 2))
        .unwrap();
    let image = images.get("aerosol_optical_thickness_550").unwrap();
    assert_eq!(image.dim(), (18, 36));
    // Cube row i averages north-up rows 10i..10i+10, stored as 179 - row
    for ((row, _), &value) in image.indexed_iter() {
        let expected = 174.5 - 10.0 * row as f32;
        assert!((value - expected).abs() < 1e-4, "row {}: {} != {}", row, value, expected);
    }

    let reads = dataset.reads();
    assert!(reads.iter().all(|&(h, w)| h <= 20 && w <= 20), "{:?}", reads);
    // Each variable is read exactly once, window by window
    let cells: usize = reads.iter().map(|&(h, w)| h * w).sum();
    assert_eq!(cells, VARIABLES.len() * 180 * 360);
}
