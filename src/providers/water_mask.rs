//! Static land/water classification.
//!
//! Classes are resampled with nearest neighbour so that no mixed classes
//! appear in the cube.

use crate::provider::StaticSource;
use crate::resampling::ResampleMethod;
use crate::variable::{NumericType, VariableDescriptor};

pub const NAME: &str = "water_mask";

#[derive(Debug, Default, Clone, Copy)]
pub struct WaterMaskSource;

impl StaticSource for WaterMaskSource {
    fn name(&self) -> &str {
        NAME
    }

    fn variable_descriptors(&self) -> Vec<VariableDescriptor> {
        vec![
            VariableDescriptor::new("water_mask", "wb_class", NumericType::Int8, 0.0)
                .with_units("-")
                .with_names("land_cover_lccs", "terrestrial or water pixel classification"),
        ]
    }

    fn resample_method(&self) -> ResampleMethod {
        ResampleMethod::Nearest
    }
}
