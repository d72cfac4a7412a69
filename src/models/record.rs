//! Kp/ap record data structures.
//!
//! One record per three-hour interval of the GFZ "Kp and ap nowcast" feed.
//! A data line carries ten whitespace-separated columns:
//!
//! ```text
//! YYYY MM DD hh.h hh._m days days_m Kp ap D
//! 2022 07 31 18.0 19.50 33084.75000 33084.81250  2.000    7 1
//! ```
//!
//! The record timestamp is the interval midpoint (column 5, fractional
//! hours UTC). The `D` marker distinguishes provisional from definitive
//! values.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AppError, Result};
use crate::models::{Measurement, OutputConfig};

/// Number of columns in a data line.
const FIELD_COUNT: usize = 10;

/// Data quality marker of a record (the `D` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Near-real-time provisional estimate (D = 0)
    Nowcast,
    /// Final value, will not change (D = 1)
    Definitive,
    /// Early preliminary estimate (D = 2)
    Quicklook,
}

impl Status {
    /// Parse the `D` column marker.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "0" => Some(Status::Nowcast),
            "1" => Some(Status::Definitive),
            "2" => Some(Status::Quicklook),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Nowcast => "nowcast",
            Status::Definitive => "definitive",
            Status::Quicklook => "quicklook",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One three-hour Kp/ap interval, uniquely identified by its timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct KpRecord {
    /// Midpoint of the measurement interval, UTC
    pub timestamp: DateTime<Utc>,

    /// Planetary Kp index, 0–9 in thirds
    pub kp: f64,

    /// Linear ap index
    pub ap: i32,

    /// Data quality marker
    pub status: Status,
}

impl KpRecord {
    /// Whether this is a pre-allocated future interval with no data yet.
    ///
    /// The feed pads the current day with rows carrying `-1.000` / `-1`.
    pub fn is_placeholder(&self) -> bool {
        self.kp < 0.0 || self.ap < 0
    }

    /// Render this record as a line-protocol measurement.
    pub fn to_measurement(&self, output: &OutputConfig) -> Measurement {
        Measurement::new(&output.measurement)
            .with_tag("source", &output.source)
            .with_tag("status", self.status.as_str())
            .with_field("kp", self.kp)
            .with_field("ap", self.ap)
            .at(self.timestamp)
    }
}

impl Display for KpRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} kp={} ap={} ({})",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.kp,
            self.ap,
            self.status
        )
    }
}

impl FromStr for KpRecord {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != FIELD_COUNT {
            return Err(AppError::format(
                line,
                format!("expected {FIELD_COUNT} columns, found {}", parts.len()),
            ));
        }

        let year: i32 = num(parts[0], "year", line)?;
        let month: u32 = num(parts[1], "month", line)?;
        let day: u32 = num(parts[2], "day", line)?;
        let mid_hour: f64 = num(parts[4], "mid-interval hour", line)?;
        let kp: f64 = num(parts[7], "Kp", line)?;
        let ap: i32 = num(parts[8], "ap", line)?;

        let status = Status::from_marker(parts[9]).ok_or_else(|| {
            AppError::format(line, format!("unknown status marker '{}'", parts[9]))
        })?;

        if !(0.0..24.0).contains(&mid_hour) {
            return Err(AppError::format(
                line,
                format!("mid-interval hour {mid_hour} out of range"),
            ));
        }
        let hour = mid_hour.trunc() as u32;
        let minute = ((mid_hour - mid_hour.trunc()) * 60.0).round() as u32;

        let timestamp = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .ok_or_else(|| AppError::format(line, "invalid date or time"))?
            .and_utc();

        Ok(KpRecord {
            timestamp,
            kp,
            ap,
            status,
        })
    }
}

/// Parse a numeric column, reporting the column name and offending line.
fn num<T>(raw: &str, what: &str, line: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| AppError::format(line, format!("invalid {what} '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Precision;

    const LINE: &str = "2022 07 31 18.0 19.50 33084.75000 33084.81250  2.000    7 1";

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn parse_record() {
        let record: KpRecord = LINE.parse().unwrap();

        assert_eq!(record.timestamp, ts(2022, 7, 31, 19, 30));
        assert_eq!(record.kp, 2.0);
        assert_eq!(record.ap, 7);
        assert_eq!(record.status, Status::Definitive);
        assert!(!record.is_placeholder());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("Foobar".parse::<KpRecord>().is_err());
    }

    #[test]
    fn parse_rejects_short_line() {
        assert!("2022 07 31 18.0".parse::<KpRecord>().is_err());
    }

    #[test]
    fn parse_rejects_bad_numeric_field() {
        let line = "2022 07 31 18.0 19.50 33084.75000 33084.81250  x.000    7 1";
        let err = line.parse::<KpRecord>().unwrap_err();
        assert!(err.to_string().contains("Kp"));
    }

    #[test]
    fn parse_rejects_invalid_date() {
        let line = "2022 13 31 18.0 19.50 33084.75000 33084.81250  2.000    7 1";
        assert!(line.parse::<KpRecord>().is_err());
    }

    #[test]
    fn parse_rejects_unknown_status_marker() {
        let line = "2022 07 31 18.0 19.50 33084.75000 33084.81250  2.000    7 9";
        let err = line.parse::<KpRecord>().unwrap_err();
        assert!(err.to_string().contains("status marker"));
    }

    #[test]
    fn placeholder_detection() {
        let line = "2022 08 18 09.0 10.50 33102.37500 33102.43750 -1.000   -1 0";
        let record: KpRecord = line.parse().unwrap();
        assert!(record.is_placeholder());
    }

    #[test]
    fn record_renders_as_line_protocol() {
        let record: KpRecord = LINE.parse().unwrap();
        let output = OutputConfig::default();

        let line = record
            .to_measurement(&output)
            .to_line(Precision::Nanos)
            .unwrap();

        assert_eq!(
            line,
            "iono_activity,source=gfz,status=definitive ap=7i,kp=2 1659295800000000000"
        );
    }

    #[test]
    fn kp_thirds_survive_rendering() {
        let line = "2022 08 01 00.0 01.50 33085.00000 33085.06250  2.667   12 0";
        let record: KpRecord = line.parse().unwrap();
        let rendered = record
            .to_measurement(&OutputConfig::default())
            .to_line(Precision::Nanos)
            .unwrap();

        assert!(rendered.contains("kp=2.667"));
        assert!(rendered.contains("ap=12i"));
        assert!(rendered.contains("status=nowcast"));
    }
}
