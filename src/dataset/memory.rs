//! In-memory datasets.
//!
//! Useful when arrays are already held by the caller and for exercising
//! providers without NetCDF files. A path only opens once it has been
//! registered with the [`MemoryOpener`].

use ndarray::{s, Array2, ArrayD, Axis, Ix2};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{window_shape, Dataset, DatasetOpener};
use crate::error::{CubeSourceError, Result};

/// A dataset whose variables live in memory
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    path: PathBuf,
    variables: HashMap<String, ArrayD<f32>>,
}

impl MemoryDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            variables: HashMap::new(),
        }
    }

    /// Add a 2-D or 3-D variable
    pub fn with_variable(mut self, name: &str, data: ArrayD<f32>) -> Self {
        self.variables.insert(name.to_string(), data);
        self
    }

    fn variable(&self, name: &str) -> Result<&ArrayD<f32>> {
        self.variables.get(name).ok_or_else(|| CubeSourceError::DataNotFound {
            message: format!("Variable '{}' not found in {}", name, self.path.display()),
        })
    }
}

impl Dataset for MemoryDataset {
    fn path(&self) -> &Path {
        &self.path
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<usize>> {
        Ok(self.variable(name)?.shape().to_vec())
    }

    fn read_window(&self, name: &str, band: usize, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f32>> {
        let data = self.variable(name)?;
        window_shape(&self.path, name, data.shape(), band, &rows, &cols)?;

        let image = if data.ndim() == 3 {
            data.index_axis(Axis(0), band)
        } else {
            data.view()
        };
        let image = image.into_dimensionality::<Ix2>()?;
        Ok(image.slice(s![rows, cols]).to_owned())
    }
}

/// Opens registered in-memory datasets and counts the opens it performed
#[derive(Default)]
pub struct MemoryOpener {
    datasets: RwLock<HashMap<PathBuf, Arc<MemoryDataset>>>,
    open_calls: AtomicUsize,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a dataset available under its path
    pub fn register(&self, dataset: MemoryDataset) {
        self.datasets
            .write()
            .insert(dataset.path.clone(), Arc::new(dataset));
    }

    /// Number of successful and failed `open` calls so far
    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }
}

impl DatasetOpener for MemoryOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn Dataset>> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        match self.datasets.read().get(path) {
            Some(dataset) => Ok(dataset.clone() as Arc<dyn Dataset>),
            None => Err(CubeSourceError::DatasetOpen {
                path: path.to_path_buf(),
                message: "no in-memory dataset registered for this path".to_string(),
            }),
        }
    }
}
