//! Spreadsheet error sentinels as they reach the marshalling boundary.
//!
//! A cell handed to a generated endpoint function may carry an error value
//! (`#N/A`, `#VALUE!`, …) instead of data. The marshalling core never acts on
//! the specific code (error cells serialize to `null` or are elided from
//! arrays) but the sentinel is kept intact so host adapters can round-trip
//! it.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The error codes a host grid can place in a cell.
///
/// Names are CamelCase (idiomatic Rust) while `Display` renders them the way
/// the grid shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CellError {
    Null,
    Ref,
    Name,
    Value,
    Div,
    Na,
    Num,
    Spill,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "#NULL!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Num => "#NUM!",
            Self::Spill => "#SPILL!",
        })
    }
}

impl CellError {
    /// Parse a displayed error code back into a sentinel.
    ///
    /// Host adapters feed this untrusted text, so unknown codes yield `None`
    /// rather than a panic.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "#null!" => Some(Self::Null),
            "#ref!" => Some(Self::Ref),
            "#name?" => Some(Self::Name),
            "#value!" => Some(Self::Value),
            "#div/0!" => Some(Self::Div),
            "#n/a" => Some(Self::Na),
            "#num!" => Some(Self::Num),
            "#spill!" => Some(Self::Spill),
            _ => None,
        }
    }
}
