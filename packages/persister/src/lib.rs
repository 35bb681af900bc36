//! Persister harness: bridging a tabula store to a durable medium.
//!
//! A medium (a file, a network endpoint, a storage area) becomes
//! persistable by implementing the four [`PersisterOps`] bridge
//! operations: pull content, push content, start change detection, stop
//! change detection. The [`Persister`] harness supplies everything above
//! that seam:
//!
//! - `load` / `save`: one-shot transfers in either direction
//! - `start_auto_load` / `start_auto_save`: keep store and medium in sync
//!   until the matching `stop_*` call
//! - error routing: background failures go to an optional
//!   [`IgnoredErrorHandler`] and never stop the loops
//!
//! The concrete file-backed implementation lives in the
//! `tabula-file-persister` crate.

mod error;
mod ops;
mod persister;

pub use error::PersisterError;
pub use ops::{IgnoredErrorHandler, PersisterListener, PersisterOps, Persists};
pub use persister::{report_ignored, Persister};
