//! Integration tests for time-range indexing over NetCDF source trees.

#![cfg(feature = "netcdf")]

mod common;

use common::assertions::assert_contiguous;
use common::test_data::{
    create_aerosols_nc, create_air_temperature_year, create_banded_nc, create_corrupt_file,
    create_stray_file, datetime,
};
use cubesource::{
    create_provider, CubeConfig, CubeSourceError, DatasetCache, NetCdfOpener, SourceConfig,
    SourceTimeRange,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn prepared_index(name: &str, cube_config: CubeConfig, dir: &Path) -> cubesource::Result<Vec<SourceTimeRange>> {
    let mut provider = create_provider(name, Arc::new(cube_config), &SourceConfig::default(), dir)?;
    provider.prepare()?;
    Ok(provider.source_time_ranges().to_vec())
}

#[test]
fn test_air_temperature_full_year() {
    let dir = tempdir().unwrap();
    create_air_temperature_year(dir.path(), 2001, (2, 4)).unwrap();

    let cube_config = CubeConfig {
        end_time: datetime(2001, 12, 31, 23),
        ..CubeConfig::default()
    };
    let mut provider = create_provider(
        "air_temperature",
        Arc::new(cube_config),
        &SourceConfig::default(),
        dir.path(),
    )
    .unwrap();
    provider.prepare().unwrap();

    let ranges = provider.source_time_ranges();
    assert_eq!(ranges.len(), 730);
    assert_contiguous(ranges);

    let january = dir.path().join("2001/20010101_t2m.nc");
    let december = dir.path().join("2001/20011201_t2m.nc");
    assert_eq!(
        ranges[0],
        SourceTimeRange {
            start: datetime(2001, 1, 1, 0),
            end: datetime(2001, 1, 1, 12),
            file_path: january.clone(),
            band_index: 0,
        }
    );
    assert_eq!(
        ranges[6],
        SourceTimeRange {
            start: datetime(2001, 1, 4, 0),
            end: datetime(2001, 1, 4, 12),
            file_path: january,
            band_index: 6,
        }
    );
    assert_eq!(
        ranges[729],
        SourceTimeRange {
            start: datetime(2001, 12, 31, 12),
            end: datetime(2002, 1, 1, 0),
            file_path: december,
            band_index: 61,
        }
    );
    assert_eq!(
        provider.temporal_coverage(),
        Some((datetime(2001, 1, 1, 0), datetime(2002, 1, 1, 0)))
    );
}

#[test]
fn test_burnt_area_monthly_bands() {
    let dir = tempdir().unwrap();
    create_banded_nc(&dir.path().join("1995/1995006_BurntArea.nc"), "BurntArea", 12, (2, 4), 0.0).unwrap();
    create_banded_nc(&dir.path().join("2014/2014001_BurntArea.nc"), "BurntArea", 3, (2, 4), 0.0).unwrap();

    let cube_config = CubeConfig {
        start_time: datetime(1995, 1, 1, 0),
        end_time: datetime(2014, 2, 15, 0),
        ..CubeConfig::default()
    };
    let ranges = prepared_index("burnt_area", cube_config, dir.path()).unwrap();

    assert_eq!(ranges.len(), 14);
    assert_eq!((ranges[0].start, ranges[0].end), (datetime(1995, 1, 6, 0), datetime(1995, 2, 6, 0)));
    assert_eq!((ranges[1].start, ranges[1].end), (datetime(1995, 2, 6, 0), datetime(1995, 3, 6, 0)));
    assert_eq!((ranges[6].start, ranges[6].end), (datetime(1995, 7, 6, 0), datetime(1995, 8, 6, 0)));
    assert_eq!(ranges[6].band_index, 6);

    let last = &ranges[13];
    assert_eq!((last.start, last.end), (datetime(2014, 2, 1, 0), datetime(2014, 3, 1, 0)));
    assert_eq!(last.band_index, 1);
}

#[test]
fn test_index_is_deterministic() {
    let dir = tempdir().unwrap();
    for day in [3, 1, 2] {
        let path = dir.path().join(format!("2003/200301{:02}-AEROSOL.nc", day));
        create_aerosols_nc(&path, (2, 4), 0.0).unwrap();
    }
    let cube_config = CubeConfig {
        start_time: datetime(2003, 1, 1, 0),
        end_time: datetime(2003, 12, 31, 0),
        ..CubeConfig::default()
    };

    let first = prepared_index("aerosols", cube_config.clone(), dir.path()).unwrap();
    let second = prepared_index("aerosols", cube_config, dir.path()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_contiguous(&first);
}

#[test]
fn test_tolerated_anomalies() {
    let dir = tempdir().unwrap();
    create_aerosols_nc(&dir.path().join("2003/20030101-AEROSOL.nc"), (2, 4), 0.0).unwrap();
    create_stray_file(&dir.path().join("docs/README.md"));
    create_stray_file(&dir.path().join("2003/checksums.md5"));
    create_stray_file(&dir.path().join("index.nc"));

    let cube_config = CubeConfig {
        start_time: datetime(2003, 1, 1, 0),
        end_time: datetime(2003, 12, 31, 0),
        ..CubeConfig::default()
    };
    let ranges = prepared_index("aerosols", cube_config, dir.path()).unwrap();
    assert_eq!(ranges.len(), 1);
}

#[test]
fn test_empty_tree_yields_empty_index() {
    let dir = tempdir().unwrap();
    let ranges = prepared_index("aerosols", CubeConfig::default(), dir.path()).unwrap();
    assert!(ranges.is_empty());
}

#[test]
fn test_corrupt_file_fails_prepare() {
    let dir = tempdir().unwrap();
    create_aerosols_nc(&dir.path().join("2003/20030101-AEROSOL.nc"), (2, 4), 0.0).unwrap();
    create_corrupt_file(&dir.path().join("2003/20030102-AEROSOL.nc"));

    let cube_config = CubeConfig {
        start_time: datetime(2003, 1, 1, 0),
        end_time: datetime(2003, 12, 31, 0),
        ..CubeConfig::default()
    };
    let result = prepared_index("aerosols", cube_config, dir.path());
    assert!(matches!(result, Err(CubeSourceError::DatasetOpen { .. })));
}

#[test]
fn test_malformed_date_fails_prepare() {
    let dir = tempdir().unwrap();
    create_aerosols_nc(&dir.path().join("2003/2003011-AEROSOL.nc"), (2, 4), 0.0).unwrap();

    let cube_config = CubeConfig {
        start_time: datetime(2003, 1, 1, 0),
        end_time: datetime(2003, 12, 31, 0),
        ..CubeConfig::default()
    };
    let result = prepared_index("aerosols", cube_config, dir.path());
    assert!(matches!(result, Err(CubeSourceError::DateParse { .. })));
}

#[test]
fn test_cache_reference_counting_with_netcdf_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("2003/20030101-AEROSOL.nc");
    create_aerosols_nc(&path, (2, 4), 0.0).unwrap();

    let cache = DatasetCache::new(Arc::new(NetCdfOpener), 1);
    let first = cache.open_dataset(&path).unwrap();
    let second = cache.open_dataset(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    cache.close_dataset(&path);
    assert_eq!(cache.open_count(&path), Some(1));
    cache.close_dataset(&path);
    assert_eq!(cache.open_count(&path), Some(0));

    cache.close_dataset(&dir.path().join("never-opened.nc"));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().hits, 1);
}
