//! NetCDF dataset backend.
//!
//! Variables are read with their native type and converted to `f32` images.
//! Windows are read as hyperslabs, so only the requested cells are loaded.
//! 64-bit integers, characters and strings are reported as unsupported types.

use ndarray::Array2;
use netcdf::types::{BasicType, VariableType};
use netcdf::Variable as NetCDFVariable;
use parking_lot::Mutex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{window_shape, Dataset, DatasetOpener};
use crate::error::{CubeSourceError, Result};

/// Opens NetCDF files from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct NetCdfOpener;

impl DatasetOpener for NetCdfOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn Dataset>> {
        Ok(Arc::new(NetCdfDataset::open(path)?))
    }
}

/// An open NetCDF file
pub struct NetCdfDataset {
    path: PathBuf,
    file: Mutex<netcdf::File>,
}

impl NetCdfDataset {
    /// Open a NetCDF file, failing with `DatasetOpen` when it is missing or corrupt
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CubeSourceError::DatasetOpen {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }

        let file = netcdf::open(path).map_err(|e| CubeSourceError::DatasetOpen {
            path: path.to_path_buf(),
            message: format!("Failed to open NetCDF file: {}", e),
        })?;

        debug!(
            path = %path.display(),
            variables = file.variables().count(),
            dimensions = file.dimensions().count(),
            "Opened NetCDF file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }
}

impl Dataset for NetCdfDataset {
    fn path(&self) -> &Path {
        &self.path
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<usize>> {
        let file = self.file.lock();
        let var = find_variable(&file, &self.path, name)?;
        Ok(var.dimensions().iter().map(|dim| dim.len()).collect())
    }

    fn read_window(&self, name: &str, band: usize, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f32>> {
        let file = self.file.lock();
        let var = find_variable(&file, &self.path, name)?;

        let shape: Vec<usize> = var.dimensions().iter().map(|dim| dim.len()).collect();
        let dim = window_shape(&self.path, name, &shape, band, &rows, &cols)?;
        if dim.0 == 0 || dim.1 == 0 {
            return Ok(Array2::zeros(dim));
        }

        let values = if shape.len() == 3 {
            read_values(&var, &self.path, (band, rows, cols))?
        } else {
            read_values(&var, &self.path, (rows, cols))?
        };

        Ok(Array2::from_shape_vec(dim, values)?)
    }
}

fn find_variable<'f>(file: &'f netcdf::File, path: &Path, name: &str) -> Result<NetCDFVariable<'f>> {
    file.variable(name).ok_or_else(|| CubeSourceError::DataNotFound {
        message: format!("Variable '{}' not found in {}", name, path.display()),
    })
}

/// Read a hyperslab of a variable with its native type, converted to f32.
///
/// Non-numeric variables are reported as `UnsupportedType`.
fn read_values<E>(var: &NetCDFVariable, path: &Path, extents: E) -> Result<Vec<f32>>
where
    E: TryInto<netcdf::Extents>,
    E::Error: Into<netcdf::Error>,
{
    let values = match var.vartype() {
        VariableType::Basic(BasicType::Byte) => var
            .get_values::<i8, _>(extents)?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        VariableType::Basic(BasicType::Ubyte) => var
            .get_values::<u8, _>(extents)?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        VariableType::Basic(BasicType::Short) => var
            .get_values::<i16, _>(extents)?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        VariableType::Basic(BasicType::Ushort) => var
            .get_values::<u16, _>(extents)?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        VariableType::Basic(BasicType::Int) => var
            .get_values::<i32, _>(extents)?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        VariableType::Basic(BasicType::Uint) => var
            .get_values::<u32, _>(extents)?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        VariableType::Basic(BasicType::Float) => var.get_values::<f32, _>(extents)?,
        VariableType::Basic(BasicType::Double) => var
            .get_values::<f64, _>(extents)?
            .into_iter()
            .map(|v| v as f32)
            .collect(),
        other => {
            return Err(CubeSourceError::UnsupportedType {
                message: format!(
                    "variable '{}' in {} has type {:?}",
                    var.name(),
                    path.display(),
                    other
                ),
            })
        }
    };
    Ok(values)
}
