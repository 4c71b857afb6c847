//! Test data generation utilities.
//!
//! This module writes small NetCDF source trees laid out the way each
//! dataset family expects them, with known data patterns.

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

// Fixture builders surface the netcdf crate's error type directly
use netcdf::Error;
type Result<T> = std::result::Result<T, Error>;

/// Source variables of the aerosols family
pub const AOD_VARIABLES: [&str; 5] = [
    "AOD1610_mean",
    "AOD550_mean",
    "AOD555_mean",
    "AOD659_mean",
    "AOD865_mean",
];

/// Midnight-based timestamp helper
pub fn datetime(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid test timestamp")
}

/// Create `path`'s parent directories and return the path
fn prepare_path(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    path.to_path_buf()
}

/// Creates a daily aerosols file.
///
/// Rows are stored south first: stored row `r` of every AOD variable holds
/// `r + offset`. The first variable carries the fill value -999 in its first
/// stored column.
pub fn create_aerosols_nc(path: &Path, size: (usize, usize), offset: f32) -> Result<()> {
    let path = prepare_path(path);
    let (height, width) = size;
    let mut file = netcdf::create(&path)?;

    file.add_dimension("latitude", height)?;
    file.add_dimension("longitude", width)?;
    file.add_attribute("title", "Aerosol CCI daily test data")?;

    for (i, name) in AOD_VARIABLES.iter().enumerate() {
        let values: Vec<f32> = (0..height * width)
            .map(|k| {
                let (row, col) = (k / width, k % width);
                if i == 0 && col == 0 {
                    -999.0
                } else {
                    row as f32 + offset
                }
            })
            .collect();

        let mut var = file.add_variable::<f32>(name, &["latitude", "longitude"])?;
        var.put_attribute("units", "1")?;
        var.put_values(&values, ..)?;
    }

    Ok(())
}

/// Creates a multi-band file of one variable where band `b` is constant `b + offset`.
pub fn create_banded_nc(
    path: &Path,
    variable: &str,
    bands: usize,
    size: (usize, usize),
    offset: f32,
) -> Result<()> {
    let path = prepare_path(path);
    let (height, width) = size;
    let mut file = netcdf::create(&path)?;

    file.add_unlimited_dimension("time")?;
    file.add_dimension("lat", height)?;
    file.add_dimension("lon", width)?;

    let values: Vec<f32> = (0..bands)
        .flat_map(|b| std::iter::repeat(b as f32 + offset).take(height * width))
        .collect();

    let mut var = file.add_variable::<f32>(variable, &["time", "lat", "lon"])?;
    var.put_attribute("units", "K")?;
    var.put_values(&values, (0..bands, .., ..))?;

    Ok(())
}

/// Creates a static water mask: class 1 (land) in the western half and
/// class 2 (water) in the eastern half, with a row of fill values at the top.
pub fn create_water_mask_nc(path: &Path, size: (usize, usize)) -> Result<()> {
    let path = prepare_path(path);
    let (height, width) = size;
    let mut file = netcdf::create(&path)?;

    file.add_dimension("lat", height)?;
    file.add_dimension("lon", width)?;

    let values: Vec<i8> = (0..height * width)
        .map(|k| {
            let (row, col) = (k / width, k % width);
            if row == 0 {
                0
            } else if col < width / 2 {
                1
            } else {
                2
            }
        })
        .collect();

    let mut var = file.add_variable::<i8>("wb_class", &["lat", "lon"])?;
    var.put_values(&values, ..)?;

    Ok(())
}

/// Writes a file that has a NetCDF extension but is not a NetCDF file
pub fn create_corrupt_file(path: &Path) {
    let path = prepare_path(path);
    fs::write(path, b"this is not a netcdf file").expect("write corrupt fixture");
}

/// Writes an arbitrary non-NetCDF file
pub fn create_stray_file(path: &Path) {
    let path = prepare_path(path);
    fs::write(path, b"notes").expect("write stray fixture");
}

/// Number of days in a month of a year
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => panic!("invalid month {}-{}", year, month),
    }
}

/// Creates one monthly file of twelve-hourly `t2m` bands per month of `year`
pub fn create_air_temperature_year(root: &Path, year: i32, size: (usize, usize)) -> Result<()> {
    for month in 1..=12 {
        let bands = 2 * days_in_month(year, month) as usize;
        let path = root
            .join(year.to_string())
            .join(format!("{:04}{:02}01_t2m.nc", year, month));
        create_banded_nc(&path, "t2m", bands, size, 250.0)?;
    }
    Ok(())
}
