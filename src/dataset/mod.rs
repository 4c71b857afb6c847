//! Dataset access.
//!
//! A [`Dataset`] is an open handle to one source file; a [`DatasetOpener`]
//! produces handles for paths. Providers never open files directly: they go
//! through the reference-counted [`DatasetCache`].

pub mod cache;
pub mod memory;
#[cfg(feature = "netcdf")]
pub mod netcdf;

use ndarray::Array2;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use crate::error::{CubeSourceError, Result};

pub use cache::{CacheStats, DatasetCache};
pub use memory::{MemoryDataset, MemoryOpener};
#[cfg(feature = "netcdf")]
pub use self::netcdf::NetCdfOpener;

/// An open source file
pub trait Dataset: Send + Sync {
    /// Path the dataset was opened from
    fn path(&self) -> &Path;

    /// Dimension sizes of a variable, outermost first
    fn variable_shape(&self, name: &str) -> Result<Vec<usize>>;

    /// Read a rectangular window of one 2-D slice of a variable.
    ///
    /// For 3-D variables `band` selects the slice along the leading axis; 2-D
    /// variables only have band 0. `rows` and `cols` index the stored image.
    fn read_window(&self, name: &str, band: usize, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f32>>;

    /// Read one whole 2-D slice of a variable
    fn read_image(&self, name: &str, band: usize) -> Result<Array2<f32>> {
        let shape = self.variable_shape(name)?;
        let (height, width) = image_shape(self.path(), name, &shape, band)?;
        self.read_window(name, band, 0..height, 0..width)
    }

    /// Height and width of one 2-D slice of a variable
    fn image_dim(&self, name: &str) -> Result<(usize, usize)> {
        let shape = self.variable_shape(name)?;
        image_shape(self.path(), name, &shape, 0)
    }

    /// Number of bands (periods) a variable holds
    fn band_count(&self, name: &str) -> Result<usize> {
        let shape = self.variable_shape(name)?;
        match shape.len() {
            2 => Ok(1),
            3 => Ok(shape[0]),
            _ => Err(CubeSourceError::ResampleShape {
                message: format!(
                    "unexpected shape {:?} for variable '{}' in {}",
                    shape,
                    name,
                    self.path().display()
                ),
            }),
        }
    }
}

/// Opens datasets by path
pub trait DatasetOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Arc<dyn Dataset>>;
}

/// Check a band index against a variable shape and return the image shape
pub(crate) fn image_shape(path: &Path, name: &str, shape: &[usize], band: usize) -> Result<(usize, usize)> {
    let (bands, height, width) = match shape {
        [height, width] => (1, *height, *width),
        [bands, height, width] => (*bands, *height, *width),
        _ => {
            return Err(CubeSourceError::ResampleShape {
                message: format!(
                    "unexpected shape {:?} for variable '{}' in {}",
                    shape,
                    name,
                    path.display()
                ),
            })
        }
    };

    if band >= bands {
        return Err(CubeSourceError::InvalidParameter {
            param: "band_index".to_string(),
            message: format!(
                "band {} out of range for variable '{}' with {} band(s) in {}",
                band,
                name,
                bands,
                path.display()
            ),
        });
    }

    Ok((height, width))
}

/// Check a window against a variable shape and return the window shape
pub(crate) fn window_shape(
    path: &Path,
    name: &str,
    shape: &[usize],
    band: usize,
    rows: &Range<usize>,
    cols: &Range<usize>,
) -> Result<(usize, usize)> {
    let (height, width) = image_shape(path, name, shape, band)?;
    if rows.start > rows.end || rows.end > height || cols.start > cols.end || cols.end > width {
        return Err(CubeSourceError::InvalidParameter {
            param: "window".to_string(),
            message: format!(
                "window rows {:?}, cols {:?} outside the {}x{} image of '{}' in {}",
                rows,
                cols,
                height,
                width,
                name,
                path.display()
            ),
        });
    }
    Ok((rows.len(), cols.len()))
}
