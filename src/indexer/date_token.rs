//! Date tokens embedded in source file names.
//!
//! A source file name starts with a date token followed by a family-specific
//! delimiter, e.g. `20020724-ESACCI-L3C_AEROSOL.nc` or `2005021_burnt.nc`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CubeSourceError, Result};

/// How a date token encodes its calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateEncoding {
    /// `YYYYMMDD`
    YearMonthDay,
    /// `YYYYDDD`, where `DDD` is the 1-based day of the year
    YearDayOfYear,
}

impl DateEncoding {
    fn digits(&self) -> usize {
        match self {
            DateEncoding::YearMonthDay => 8,
            DateEncoding::YearDayOfYear => 7,
        }
    }

    /// Decode a token into midnight of the day it names
    pub fn decode(&self, token: &str) -> std::result::Result<NaiveDateTime, String> {
        if token.len() != self.digits() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("expected {} digits", self.digits()));
        }

        // All ASCII digits, so slicing and parsing cannot fail
        let number = |range: std::ops::Range<usize>| token[range].parse::<u32>().unwrap_or(0);
        let year = number(0..4) as i32;

        let date = match self {
            DateEncoding::YearMonthDay => {
                let (month, day) = (number(4..6), number(6..8));
                NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or_else(|| format!("no such date {:04}-{:02}-{:02}", year, month, day))?
            }
            DateEncoding::YearDayOfYear => {
                let ordinal = number(4..7);
                NaiveDate::from_yo_opt(year, ordinal)
                    .ok_or_else(|| format!("no day {} in year {}", ordinal, year))?
            }
        };

        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| "invalid time of day".to_string())
    }
}

/// File naming convention of a source family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNaming {
    /// Character separating the date token from the rest of the name
    pub delimiter: char,
    pub encoding: DateEncoding,
    /// File extension without the leading dot
    pub extension: String,
}

impl FileNaming {
    pub fn new(delimiter: char, encoding: DateEncoding, extension: &str) -> Self {
        Self {
            delimiter,
            encoding,
            extension: extension.to_string(),
        }
    }

    /// Whether a file name carries this family's extension
    pub fn matches(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext == self.extension)
    }

    /// Date of a file, decoded from the token before the first delimiter
    pub fn file_date(&self, file_name: &str) -> Result<NaiveDateTime> {
        let token = match file_name.split_once(self.delimiter) {
            Some((token, _)) => token,
            None => file_name.split('.').next().unwrap_or(file_name),
        };

        self.encoding
            .decode(token)
            .map_err(|message| CubeSourceError::DateParse {
                file_name: file_name.to_string(),
                token: token.to_string(),
                message,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_decode_year_month_day() {
        let encoding = DateEncoding::YearMonthDay;
        assert_eq!(encoding.decode("20020724").unwrap(), date(2002, 7, 24));
        assert_eq!(encoding.decode("20020901").unwrap(), date(2002, 9, 1));
        assert_eq!(encoding.decode("20071020").unwrap(), date(2007, 10, 20));
    }

    #[test]
    fn test_decode_year_day_of_year() {
        let encoding = DateEncoding::YearDayOfYear;
        assert_eq!(encoding.decode("2005021").unwrap(), date(2005, 1, 21));
        assert_eq!(encoding.decode("2004366").unwrap(), date(2004, 12, 31));
        assert!(encoding.decode("2005366").is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        assert!(DateEncoding::YearMonthDay.decode("2002072").is_err());
        assert!(DateEncoding::YearMonthDay.decode("2002x724").is_err());
        assert!(DateEncoding::YearMonthDay.decode("20021301").is_err());
        assert!(DateEncoding::YearDayOfYear.decode("20050210").is_err());
        assert!(DateEncoding::YearDayOfYear.decode("").is_err());
    }

    #[test]
    fn test_file_date() {
        let naming = FileNaming::new('-', DateEncoding::YearMonthDay, "nc");
        assert!(naming.matches("20020724-ESACCI-L3C_AEROSOL-AOD.nc"));
        assert!(!naming.matches("README.txt"));
        assert_eq!(
            naming.file_date("20020724-ESACCI-L3C_AEROSOL-AOD.nc").unwrap(),
            date(2002, 7, 24)
        );
        // No delimiter: the token runs up to the extension
        assert_eq!(naming.file_date("20020724.nc").unwrap(), date(2002, 7, 24));

        let err = naming.file_date("aod-20020724.nc").unwrap_err();
        assert!(matches!(err, CubeSourceError::DateParse { token, .. } if token == "aod"));
    }
}
