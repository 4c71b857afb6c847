//! Error types for cubesource.
//!
//! Every fatal condition of indexing, caching, resampling and image
//! extraction is a variant of [`CubeSourceError`]. A requested window with no
//! source data is not fatal: it is reported as a [`CoverageError`] value
//! inside an otherwise successful result.

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cubesource operations.
#[derive(Error, Debug)]
pub enum CubeSourceError {
    /// A dataset file is missing, unreadable or corrupt
    #[error("Cannot open dataset {}: {message}", .path.display())]
    DatasetOpen { path: PathBuf, message: String },

    /// A file name carries a malformed date token
    #[error("Malformed date token '{token}' in file name '{file_name}': {message}")]
    DateParse {
        file_name: String,
        token: String,
        message: String,
    },

    /// A static provider found no matching source file
    #[error("No *.{extension} file found in {}", .dir.display())]
    MissingSourceFile { dir: PathBuf, extension: String },

    /// Source/destination shape or extent are inconsistent
    #[error("Resample shape error: {message}")]
    ResampleShape { message: String },

    /// A variable or descriptor uses a numeric type that cannot be resampled
    #[error("Unsupported type: {message}")]
    UnsupportedType { message: String },

    /// Images were requested from a provider that is not prepared
    #[error("Provider '{provider}' is not prepared ({state})")]
    NotPrepared { provider: String, state: String },

    /// A variable is missing from a dataset
    #[error("Data not found: {message}")]
    DataNotFound { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// NetCDF library errors not tied to opening a file
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk errors
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Array construction errors
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results with CubeSourceError
pub type Result<T> = std::result::Result<T, CubeSourceError>;

/// A requested time window that no index entry overlaps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No source data for [{requested_start}, {requested_end}) in '{provider}'{}", coverage_suffix(.coverage))]
pub struct CoverageError {
    pub provider: String,
    pub requested_start: NaiveDateTime,
    pub requested_end: NaiveDateTime,
    /// Temporal coverage of the provider, if it has any entries at all
    pub coverage: Option<(NaiveDateTime, NaiveDateTime)>,
}

fn coverage_suffix(coverage: &Option<(NaiveDateTime, NaiveDateTime)>) -> String {
    match coverage {
        Some((start, end)) => format!(" (coverage is [{}, {}))", start, end),
        None => " (provider has no entries)".to_string(),
    }
}
