//! Tabula store: the in-memory reactive tabular data structure.
//!
//! State lives in two halves:
//! - **Tables**: table-id → row-id → cell-id → scalar [`Cell`]
//! - **Values**: a flat keyed map of auxiliary metadata
//!
//! The store itself does no I/O. Persisters (see the `tabula-persister`
//! and `tabula-file-persister` crates) move [`Content`] snapshots between
//! a store and a durable medium, and subscribe to the store's change
//! listeners to know when to do so.
//!
//! # Example
//!
//! ```rust
//! use tabula_store::{Cell, Store};
//!
//! let store = Store::new();
//! store.set_cell("pets", "fido", "species", "dog");
//! store.set_value("open", true);
//!
//! let content = store.content();
//! assert!(!content.is_empty());
//! ```

mod cell;
mod content;
mod store;

pub use cell::Cell;
pub use content::{Content, Row, Table, Tables, Values};
pub use store::{ChangeListener, ListenerId, Store};
