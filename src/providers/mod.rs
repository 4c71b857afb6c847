//! Concrete dataset families and a name-based registry.

pub mod aerosols;
pub mod air_temperature;
pub mod burnt_area;
pub mod water_mask;

use std::path::Path;
use std::sync::Arc;

use crate::config::{CubeConfig, SourceConfig};
use crate::dataset::DatasetOpener;
use crate::error::{CubeSourceError, Result};
use crate::provider::{CubeSourceProvider, StaticCubeSourceProvider, TimeVaryingCubeSourceProvider};

pub use aerosols::AerosolsSource;
pub use air_temperature::AirTemperatureSource;
pub use burnt_area::BurntAreaSource;
pub use water_mask::WaterMaskSource;

/// Names accepted by [`create_provider`]
pub const PROVIDER_NAMES: [&str; 4] = [
    aerosols::NAME,
    air_temperature::NAME,
    burnt_area::NAME,
    water_mask::NAME,
];

/// Build the provider registered under `name`, reading datasets with `opener`
pub fn create_provider_with_opener(
    name: &str,
    cube_config: Arc<CubeConfig>,
    source_config: &SourceConfig,
    dir: &Path,
    opener: Arc<dyn DatasetOpener>,
) -> Result<Box<dyn CubeSourceProvider>> {
    let provider: Box<dyn CubeSourceProvider> = match name {
        aerosols::NAME => Box::new(TimeVaryingCubeSourceProvider::new(
            Box::new(AerosolsSource),
            cube_config,
            source_config,
            dir,
            opener,
        )),
        air_temperature::NAME => Box::new(TimeVaryingCubeSourceProvider::new(
            Box::new(AirTemperatureSource),
            cube_config,
            source_config,
            dir,
            opener,
        )),
        burnt_area::NAME => Box::new(TimeVaryingCubeSourceProvider::new(
            Box::new(BurntAreaSource),
            cube_config,
            source_config,
            dir,
            opener,
        )),
        water_mask::NAME => Box::new(StaticCubeSourceProvider::new(
            Box::new(WaterMaskSource),
            cube_config,
            source_config,
            dir,
            opener,
        )),
        _ => {
            return Err(CubeSourceError::InvalidParameter {
                param: "provider".to_string(),
                message: format!(
                    "Unknown provider '{}'. Available: {}",
                    name,
                    PROVIDER_NAMES.join(", ")
                ),
            })
        }
    };
    Ok(provider)
}

/// Build the provider registered under `name`, reading NetCDF files
#[cfg(feature = "netcdf")]
pub fn create_provider(
    name: &str,
    cube_config: Arc<CubeConfig>,
    source_config: &SourceConfig,
    dir: &Path,
) -> Result<Box<dyn CubeSourceProvider>> {
    create_provider_with_opener(
        name,
        cube_config,
        source_config,
        dir,
        Arc::new(crate::dataset::NetCdfOpener),
    )
}
