//! Daily aerosol optical thickness from the ESA Aerosol CCI project.
//!
//! Files are named `YYYYMMDD-<product>.nc` and stored upside down (row 0 is
//! the southernmost row).

use crate::indexer::{Cadence, DateEncoding, FileNaming};
use crate::provider::{RowOrder, TimeVaryingSource};
use crate::variable::{NumericType, Provenance, VariableDescriptor};

pub const NAME: &str = "aerosols";

const FILL_VALUE: f64 = -999.0;

/// Wavelengths in nm of the published optical thickness bands
const WAVELENGTHS: [u32; 5] = [1610, 550, 555, 659, 865];

#[derive(Debug, Default, Clone, Copy)]
pub struct AerosolsSource;

impl TimeVaryingSource for AerosolsSource {
    fn name(&self) -> &str {
        NAME
    }

    fn variable_descriptors(&self) -> Vec<VariableDescriptor> {
        let provenance = Provenance {
            references: Some(
                "Holzer-Popp, T., de Leeuw, G., Griesfeller, J., Martynenko, D., Klueser, L., \
                 Bevan, S., et al. (2013). Aerosol retrieval experiments in the ESA Aerosol_cci \
                 project. Atmospheric Measurement Techniques, 6, 1919-1957. \
                 doi:10.5194/amt-6-1919-2013."
                    .to_string(),
            ),
            comment: Some(
                "Aerosol optical thickness derived from the dataset produced by the Aerosol CCI project."
                    .to_string(),
            ),
            url: Some("http://www.esa-aerosol-cci.org/".to_string()),
            project_name: Some("ESA Aerosol CCI".to_string()),
        };

        WAVELENGTHS
            .iter()
            .map(|nm| {
                VariableDescriptor::new(
                    &format!("aerosol_optical_thickness_{}", nm),
                    &format!("AOD{}_mean", nm),
                    NumericType::Float32,
                    FILL_VALUE,
                )
                .with_units("1")
                .with_names(
                    &format!("atmosphere_optical_thickness_due_to_aerosol_at_{}nm", nm),
                    &format!("aerosol optical thickness at {} nm", nm),
                )
                .with_provenance(provenance.clone())
            })
            .collect()
    }

    fn file_naming(&self) -> FileNaming {
        FileNaming::new('-', DateEncoding::YearMonthDay, "nc")
    }

    fn cadence(&self) -> Cadence {
        Cadence::Days(1)
    }

    fn row_order(&self) -> RowOrder {
        RowOrder::SouthUp
    }
}
