//! Time-range indexing of source directory trees.
//!
//! A time-varying source lives in a tree of year directories:
//!
//! ```text
//! <root>/
//!   2001/
//!     20010101-ESACCI-L3C_AEROSOL-AOD.nc
//!     20010102-ESACCI-L3C_AEROSOL-AOD.nc
//!   2002/
//!     ...
//! ```
//!
//! The [`TimeRangeIndexer`] turns such a tree into a sorted list of
//! [`SourceTimeRange`]s, one per logical period (file band).

pub mod cadence;
pub mod date_token;

use chrono::{Datelike, Duration, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::dataset::DatasetCache;
use crate::error::{CubeSourceError, Result};

pub use cadence::{BandLayout, Cadence};
pub use date_token::{DateEncoding, FileNaming};

/// One logical period of source data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub file_path: PathBuf,
    /// Slice along the leading axis of the file's variables
    pub band_index: usize,
}

impl SourceTimeRange {
    /// Whether the period intersects `[t0, t1)`
    pub fn overlaps(&self, t0: NaiveDateTime, t1: NaiveDateTime) -> bool {
        self.start < t1 && self.end > t0
    }

    /// Length of the intersection with `[t0, t1)`, zero if disjoint
    pub fn overlap(&self, t0: NaiveDateTime, t1: NaiveDateTime) -> Duration {
        let start = self.start.max(t0);
        let end = self.end.min(t1);
        if start < end {
            end - start
        } else {
            Duration::zero()
        }
    }
}

/// Overall `[start, end)` of a sorted index, `None` when it is empty
pub fn temporal_coverage(entries: &[SourceTimeRange]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = entries.first()?;
    let end = entries.iter().map(|entry| entry.end).max()?;
    Some((first.start, end))
}

/// A source file selected for indexing
#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    origin: NaiveDateTime,
}

/// Builds the time-range index of one source tree
#[derive(Debug, Clone)]
pub struct TimeRangeIndexer {
    root: PathBuf,
    naming: FileNaming,
    cadence: Cadence,
    layout: BandLayout,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
}

impl TimeRangeIndexer {
    pub fn new(
        root: &Path,
        naming: FileNaming,
        cadence: Cadence,
        layout: BandLayout,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            naming,
            cadence,
            layout,
            start_time,
            end_time,
        }
    }

    /// Whether a period starting at `start` belongs to the index
    fn in_window(&self, start: NaiveDateTime) -> bool {
        self.start_time <= start && start <= self.end_time
    }

    /// Walk the tree and build the index.
    ///
    /// Every retained file is opened and closed once through `cache`, so a
    /// corrupt file fails the whole build. The result is sorted by start time,
    /// then band index, then path.
    pub fn compute_source_time_ranges(&self, cache: &DatasetCache) -> Result<Vec<SourceTimeRange>> {
        if !self.root.is_dir() {
            return Err(CubeSourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source directory {} does not exist", self.root.display()),
            )));
        }

        let candidates = self.collect_candidates()?;
        debug!(
            root = %self.root.display(),
            candidates = candidates.len(),
            "Collected source files"
        );

        let per_file = candidates
            .par_iter()
            .map(|candidate| self.index_file(candidate, cache))
            .collect::<Result<Vec<_>>>()?;

        let mut entries: Vec<SourceTimeRange> = per_file.into_iter().flatten().collect();
        entries.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(a.band_index.cmp(&b.band_index))
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        Ok(entries)
    }

    fn collect_candidates(&self) -> Result<Vec<Candidate>> {
        let (first_year, last_year) = (self.start_time.year(), self.end_time.year());
        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let year = match name.parse::<i32>() {
                Ok(year) => year,
                Err(_) => {
                    debug!(dir = %entry.path().display(), "Skipping non-year directory");
                    continue;
                }
            };
            if year < first_year || year > last_year {
                continue;
            }

            self.collect_year(entry.path(), &mut candidates)?;
        }

        Ok(candidates)
    }

    fn collect_year(&self, dir: &Path, candidates: &mut Vec<Candidate>) -> Result<()> {
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !self.naming.matches(&name) {
                debug!(file = %entry.path().display(), "Skipping file with foreign extension");
                continue;
            }

            let origin = self.naming.file_date(&name)?;
            if origin > self.end_time {
                continue;
            }
            // Later bands of a multi-band file may still reach into the window
            if self.layout == BandLayout::Single && origin < self.start_time {
                continue;
            }

            candidates.push(Candidate {
                path: entry.into_path(),
                origin,
            });
        }
        Ok(())
    }

    fn index_file(&self, candidate: &Candidate, cache: &DatasetCache) -> Result<Vec<SourceTimeRange>> {
        let dataset = cache.open_dataset(&candidate.path)?;
        let band_count = match &self.layout {
            BandLayout::Single => Ok(1),
            BandLayout::PerBand(variable) => dataset.band_count(variable),
        };
        cache.close_dataset(&candidate.path);
        let band_count = band_count?;

        if band_count == 0 {
            warn!(file = %candidate.path.display(), "Source file holds no bands");
        }

        let mut entries = Vec::with_capacity(band_count);
        for band_index in 0..band_count {
            let (start, end) = self.cadence.period(candidate.origin, band_index)?;
            if start > self.end_time {
                break;
            }
            if self.in_window(start) {
                entries.push(SourceTimeRange {
                    start,
                    end,
                    file_path: candidate.path.clone(),
                    band_index,
                });
            }
        }
        Ok(entries)
    }
}
