//! 2 m air temperature from ECMWF ERA-Interim.
//!
//! One file per month, `YYYYMMDD_t2m.nc`, holding twelve-hourly bands of the
//! `t2m` variable.

use crate::indexer::{BandLayout, Cadence, DateEncoding, FileNaming};
use crate::provider::TimeVaryingSource;
use crate::variable::{NumericType, Provenance, VariableDescriptor};

pub const NAME: &str = "air_temperature";

const SOURCE_VARIABLE: &str = "t2m";

#[derive(Debug, Default, Clone, Copy)]
pub struct AirTemperatureSource;

impl TimeVaryingSource for AirTemperatureSource {
    fn name(&self) -> &str {
        NAME
    }

    fn variable_descriptors(&self) -> Vec<VariableDescriptor> {
        vec![
            VariableDescriptor::new("air_temperature_2m", SOURCE_VARIABLE, NumericType::Float32, -9999.0)
                .with_units("K")
                .with_names("air_temperature", "2 metre air temperature")
                .with_provenance(Provenance {
                    references: Some(
                        "Dee, D. P., et al. (2011). The ERA-Interim reanalysis: configuration and \
                         performance of the data assimilation system. Quarterly Journal of the \
                         Royal Meteorological Society, 137, 553-597. doi:10.1002/qj.828."
                            .to_string(),
                    ),
                    comment: Some("Air temperature at 2 m from the ERA-Interim reanalysis.".to_string()),
                    url: Some("http://www.ecmwf.int/en/research/climate-reanalysis/era-interim".to_string()),
                    project_name: Some("ERA-Interim".to_string()),
                }),
        ]
    }

    fn file_naming(&self) -> FileNaming {
        FileNaming::new('_', DateEncoding::YearMonthDay, "nc")
    }

    fn cadence(&self) -> Cadence {
        Cadence::Hours(12)
    }

    fn band_layout(&self) -> BandLayout {
        BandLayout::PerBand(SOURCE_VARIABLE.to_string())
    }
}
