//! The persisted content shape: the `(tables, values)` pair.
//!
//! This is the unit a persister moves between a [`Store`](crate::Store)
//! and a durable medium. Every map slot holds `Option<Cell>`, where `None`
//! marks an entry that is *explicitly absent* - distinct from the entry
//! simply not being in the map. On the wire, absent is spelled as the JSON
//! null literal (serde's `Option` handling does that mapping for free),
//! which means a real null can never appear in content. That is an
//! accepted limitation of the format, kept for compatibility with files
//! written by other implementations of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Cell;

/// A row: cell-id → cell, `None` marking an explicitly absent cell.
pub type Row = BTreeMap<String, Option<Cell>>;

/// A table: row-id → row.
pub type Table = BTreeMap<String, Row>;

/// The tabular half of persisted content: table-id → table.
pub type Tables = BTreeMap<String, Table>;

/// The metadata half: value-id → value.
pub type Values = BTreeMap<String, Option<Cell>>;

/// The full persisted content pair.
///
/// A tuple struct so it (de)serializes directly as the two-element
/// `[tables, values]` array of the wire format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Content(pub Tables, pub Values);

impl Content {
    /// Create content from its two halves.
    pub fn new(tables: Tables, values: Values) -> Self {
        Content(tables, values)
    }

    /// The tabular half.
    pub fn tables(&self) -> &Tables {
        &self.0
    }

    /// The metadata half.
    pub fn values(&self) -> &Values {
        &self.1
    }

    /// True when both halves are empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty() && self.1.is_empty()
    }
}
