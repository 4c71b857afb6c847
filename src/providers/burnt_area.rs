//! Monthly burnt area from GFED4.
//!
//! One file per year, `YYYYDDD_BurntArea.nc`, with one band per month
//! counted from the file's date.

use crate::indexer::{BandLayout, Cadence, DateEncoding, FileNaming};
use crate::provider::TimeVaryingSource;
use crate::variable::{NumericType, Provenance, VariableDescriptor};

pub const NAME: &str = "burnt_area";

const SOURCE_VARIABLE: &str = "BurntArea";

#[derive(Debug, Default, Clone, Copy)]
pub struct BurntAreaSource;

impl TimeVaryingSource for BurntAreaSource {
    fn name(&self) -> &str {
        NAME
    }

    fn variable_descriptors(&self) -> Vec<VariableDescriptor> {
        vec![
            VariableDescriptor::new("burnt_area", SOURCE_VARIABLE, NumericType::Float32, -9999.0)
                .with_units("hectares")
                .with_names("burnt_area", "Monthly Burnt Area")
                .with_provenance(Provenance {
                    references: Some(
                        "Giglio, L., Randerson, J. T., and van der Werf, G. R. (2013). Analysis of \
                         daily, monthly, and annual burned area using the fourth-generation global \
                         fire emissions database (GFED4). Journal of Geophysical Research: \
                         Biogeosciences, 118, 317-328. doi:10.1002/jgrg.20042."
                            .to_string(),
                    ),
                    comment: Some("Burnt area derived from GFED4.".to_string()),
                    url: Some("http://www.globalfiredata.org/".to_string()),
                    project_name: Some("Global Fire Emissions Database".to_string()),
                }),
        ]
    }

    fn file_naming(&self) -> FileNaming {
        FileNaming::new('_', DateEncoding::YearDayOfYear, "nc")
    }

    fn cadence(&self) -> Cadence {
        Cadence::Months(1)
    }

    fn band_layout(&self) -> BandLayout {
        BandLayout::PerBand(SOURCE_VARIABLE.to_string())
    }
}
