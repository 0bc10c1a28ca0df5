use chrono::{Duration as ChronoDur, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{self, Display};

use crate::CellError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── serial-date utilities ─────────────────────────
The 1900 date system used by spreadsheet hosts:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but the host thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
const SERIAL_EPOCH: NaiveDate = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - SERIAL_EPOCH).num_days();
    // Dates on or after 1900-03-01 get +1 to account for phantom Feb 29
    let serial_days = if dt.date() >= NaiveDate::from_ymd_opt(1900, 3, 1).unwrap() {
        days + 1
    } else {
        days
    };

    let secs_in_day = dt.time().num_seconds_from_midnight() as f64;
    serial_days as f64 + secs_in_day / 86_400.0
}

/// Convert a serial number back into a calendar date/time.
///
/// Returns `None` when the serial is so far out of range that the date
/// arithmetic would overflow; callers fall back to emitting the raw number.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let frac_secs = (serial.fract() * 86_400.0).round() as i64;

    // Serial 60 is phantom 1900-02-29; map to 1900-02-28
    let date = if days == 60 {
        NaiveDate::from_ymd_opt(1900, 2, 28).unwrap()
    } else {
        // serial < 60: offset = serial (no phantom day yet)
        // serial > 60: offset = serial - 1 (skip phantom day)
        let offset = if days < 60 { days } else { days - 1 };
        SERIAL_EPOCH.checked_add_signed(ChronoDur::try_days(offset)?)?
    };

    let time =
        NaiveTime::from_num_seconds_from_midnight_opt((frac_secs.rem_euclid(86_400)) as u32, 0)
            .unwrap();
    Some(date.and_time(time))
}

/// Locale-invariant numeric formatting.
///
/// Rust's `f64` display is already culture-independent and shortest
/// round-trip, which is exactly the contract request bodies need: `85000.0`
/// renders as `85000`, `35.05` as `35.05`, and parsing the output back
/// recovers the input bit-for-bit.
pub fn format_number(value: f64) -> String {
    value.to_string()
}

/// A value as it arrives from the host cell grid.
///
/// Scalars are what a single cell holds; `Row` and `Grid` model range
/// references. A `Grid` with exactly one row and one column is semantically
/// its single scalar unless the receiving parameter is declared as an array.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Blank cell or omitted argument.
    Empty,
    /// Error sentinel (`#N/A`, `#VALUE!`, …).
    Error(CellError),
    Bool(bool),
    Number(f64),
    Text(String),
    /// One-dimensional range reference.
    Row(Vec<CellValue>),
    /// Two-dimensional range reference, row-major.
    Grid(Vec<Vec<CellValue>>),
}

impl CellValue {
    /// Whether the value is a blank cell or an error sentinel.
    ///
    /// Both serialize to `null` as scalars and are elided from arrays.
    pub fn is_blank_or_error(&self) -> bool {
        matches!(self, CellValue::Empty | CellValue::Error(_))
    }

    /// Unwrap a degenerate 1×1 range down to the contained scalar.
    ///
    /// Hosts hand a single-cell range reference over as a 1×1 grid; when the
    /// receiving parameter is not an array, that grid means its one cell.
    pub fn as_single(&self) -> &CellValue {
        match self {
            CellValue::Grid(rows) if rows.len() == 1 && rows[0].len() == 1 => {
                rows[0][0].as_single()
            }
            CellValue::Row(cells) if cells.len() == 1 => cells[0].as_single(),
            other => other,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Error(e) => write!(f, "{e}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Row(cells) => write!(f, "{cells:?}"),
            CellValue::Grid(rows) => write!(f, "{rows:?}"),
        }
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

/// A scalar produced by response shaping: numbers where the fragment parses
/// as one, text otherwise.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Number(n) => write!(f, "{n}"),
            ScalarValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The shaped result handed back to the display surface.
///
/// Per-invocation and discarded once rendered: a scalar fills one cell, a
/// row spills horizontally, a grid spills as a rectangle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum SpillValue {
    Scalar(ScalarValue),
    Row(Vec<ScalarValue>),
    Grid(Vec<Vec<ScalarValue>>),
}

impl SpillValue {
    /// A scalar text value; also how error messages travel, since the cell
    /// surface can render a string but not an exception.
    pub fn text(s: impl Into<String>) -> Self {
        SpillValue::Scalar(ScalarValue::Text(s.into()))
    }

    pub fn number(n: f64) -> Self {
        SpillValue::Scalar(ScalarValue::Number(n))
    }

    /// (rows, cols) of the rendered spill.
    pub fn dims(&self) -> (usize, usize) {
        match self {
            SpillValue::Scalar(_) => (1, 1),
            SpillValue::Row(cells) => (1, cells.len()),
            SpillValue::Grid(rows) => (
                rows.len(),
                rows.iter().map(Vec::len).max().unwrap_or(0),
            ),
        }
    }
}
