use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CubeSourceError, Result};

/// Length of the period each band of a source file covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Hours(u32),
    Days(u32),
    Months(u32),
}

impl Cadence {
    /// Start of the period that is `steps` periods after `origin`
    fn advance(&self, origin: NaiveDateTime, steps: usize) -> Option<NaiveDateTime> {
        let steps = u32::try_from(steps).ok()?;
        match *self {
            Cadence::Hours(n) => origin.checked_add_signed(Duration::hours(i64::from(n) * i64::from(steps))),
            Cadence::Days(n) => origin.checked_add_signed(Duration::days(i64::from(n) * i64::from(steps))),
            Cadence::Months(n) => origin.checked_add_months(Months::new(n.checked_mul(steps)?)),
        }
    }

    /// Period `[start, end)` covered by band `band` of a file starting at `origin`
    pub fn period(&self, origin: NaiveDateTime, band: usize) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let overflow = || CubeSourceError::InvalidParameter {
            param: "band_index".to_string(),
            message: format!("band {} of a file starting at {} is out of range", band, origin),
        };

        let start = self.advance(origin, band).ok_or_else(overflow)?;
        let end = self.advance(origin, band + 1).ok_or_else(overflow)?;
        if start >= end {
            return Err(CubeSourceError::InvalidParameter {
                param: "cadence".to_string(),
                message: format!("{:?} yields an empty period", self),
            });
        }
        Ok((start, end))
    }
}

/// How the periods of a source file are laid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandLayout {
    /// The file covers exactly one period
    Single,
    /// One period per slice along the leading axis of the named variable
    PerBand(String),
}
