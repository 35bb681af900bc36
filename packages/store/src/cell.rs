//! The Cell type - the scalar leaf of the tabular data model.

use serde::{Deserialize, Serialize};

/// A scalar value held in a table cell or a keyed metadata slot.
///
/// Cells are deliberately flat: no nesting, no binary data. The tabular
/// structure above them (table → row → cell) carries all the shape.
///
/// # Design Notes
///
/// - Serializes untagged, so a cell is the bare JSON scalar on the wire
/// - Integers and floats are kept distinct so `42` round-trips as `42`,
///   not `42.0`
/// - There is no null variant: an entry that would be null is expressed
///   as an absent entry instead (see [`Content`](crate::Content))
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl Cell {
    /// Check if this cell is a string.
    pub fn is_string(&self) -> bool {
        matches!(self, Cell::String(_))
    }

    /// The string content, if this cell is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(s) => Some(s),
            _ => None,
        }
    }
}

// Conversion from common types

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Integer(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Cell::Integer(v as i64)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::String(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::String(v.to_string())
    }
}
