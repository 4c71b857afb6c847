//! Per-variable metadata supplied by each source family.
//!
//! Descriptors are read-only: providers hand them to the cube writer and use
//! `source_name` and `fill_value` during image extraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric type a variable is stored with in the cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericType {
    Int8,
    Uint8,
    Int16,
    Int32,
    Float32,
    Float64,
}

impl NumericType {
    /// Name of this type as used in descriptor tables
    pub fn name(&self) -> &'static str {
        match self {
            NumericType::Int8 => "int8",
            NumericType::Uint8 => "uint8",
            NumericType::Int16 => "int16",
            NumericType::Int32 => "int32",
            NumericType::Float32 => "float32",
            NumericType::Float64 => "float64",
        }
    }

    /// Whether values of this type are categorical rather than continuous
    pub fn is_integer(&self) -> bool {
        !matches!(self, NumericType::Float32 | NumericType::Float64)
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a variable's data comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// Static metadata of one cube variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Name of the variable in the cube
    pub canonical_name: String,
    /// Name of the variable in the source files
    pub source_name: String,
    pub numeric_type: NumericType,
    /// Sentinel marking missing data, both in the source and in produced images
    pub fill_value: f64,
    pub units: String,
    pub standard_name: String,
    pub long_name: String,
    #[serde(default)]
    pub provenance: Provenance,
}

impl VariableDescriptor {
    pub fn new(
        canonical_name: &str,
        source_name: &str,
        numeric_type: NumericType,
        fill_value: f64,
    ) -> Self {
        Self {
            canonical_name: canonical_name.to_string(),
            source_name: source_name.to_string(),
            numeric_type,
            fill_value,
            units: String::new(),
            standard_name: String::new(),
            long_name: String::new(),
            provenance: Provenance::default(),
        }
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    pub fn with_names(mut self, standard_name: &str, long_name: &str) -> Self {
        self.standard_name = standard_name.to_string();
        self.long_name = long_name.to_string();
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Whether a raw source value marks missing data
    pub fn is_fill(&self, value: f32) -> bool {
        value.is_nan() || (value as f64) == self.fill_value
    }
}
