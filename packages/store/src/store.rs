//! The reactive store: shared, mutable tabular state with change listeners.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::{Cell, Content, Tables, Values};

/// Handle for a registered change listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A change-listener callback. Invoked with no arguments: it is a pure
/// change signal, not a change description.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct State {
    tables: BTreeMap<String, BTreeMap<String, BTreeMap<String, Cell>>>,
    values: BTreeMap<String, Cell>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_id: BTreeMap<u64, ChangeListener>,
}

/// An in-memory reactive tabular store.
///
/// State is table-id → row-id → cell-id → [`Cell`], plus a flat keyed
/// metadata map. All methods take `&self`; the store is meant to be shared
/// behind an `Arc` between the application and a persister.
///
/// Live state never holds absent entries - a cell either has a value or is
/// not in its row at all. Explicit absence only exists in [`Content`],
/// where the wire format needs to spell it out.
///
/// # Example
///
/// ```rust
/// use tabula_store::{Cell, Store};
///
/// let store = Store::new();
/// store.set_cell("pets", "fido", "species", "dog");
/// assert_eq!(store.cell("pets", "fido", "species"), Some(Cell::from("dog")));
/// ```
#[derive(Default)]
pub struct Store {
    state: RwLock<State>,
    listeners: Mutex<Listeners>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell at `table`/`row`/`cell`, if present.
    pub fn cell(&self, table: &str, row: &str, cell: &str) -> Option<Cell> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.tables.get(table)?.get(row)?.get(cell).cloned()
    }

    /// Set a single cell, creating the row and table as needed.
    ///
    /// Listeners fire only if the stored value actually changed.
    pub fn set_cell(&self, table: &str, row: &str, cell: &str, value: impl Into<Cell>) {
        let value = value.into();
        let changed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let row_map = state
                .tables
                .entry(table.to_string())
                .or_default()
                .entry(row.to_string())
                .or_default();
            if row_map.get(cell) == Some(&value) {
                false
            } else {
                row_map.insert(cell.to_string(), value);
                true
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Delete a cell, pruning its row and table if they become empty.
    pub fn del_cell(&self, table: &str, row: &str, cell: &str) {
        let changed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let Some(table_map) = state.tables.get_mut(table) else {
                return;
            };
            let Some(row_map) = table_map.get_mut(row) else {
                return;
            };
            let removed = row_map.remove(cell).is_some();
            if row_map.is_empty() {
                table_map.remove(row);
            }
            if table_map.is_empty() {
                state.tables.remove(table);
            }
            removed
        };
        if changed {
            self.notify();
        }
    }

    /// The metadata value at `id`, if present.
    pub fn value(&self, id: &str) -> Option<Cell> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.values.get(id).cloned()
    }

    /// Set a metadata value.
    pub fn set_value(&self, id: &str, value: impl Into<Cell>) {
        let value = value.into();
        let changed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.values.insert(id.to_string(), value.clone()) != Some(value)
        };
        if changed {
            self.notify();
        }
    }

    /// Delete a metadata value.
    pub fn del_value(&self, id: &str) {
        let changed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.values.remove(id).is_some()
        };
        if changed {
            self.notify();
        }
    }

    /// Replace the tabular half wholesale. Absent entries are skipped, so
    /// they stay absent in the live store.
    pub fn set_tables(&self, tables: Tables) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.tables = strip_absent_tables(tables);
        }
        self.notify();
    }

    /// A snapshot of the full store state as persisted content.
    pub fn content(&self) -> Content {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let tables = state
            .tables
            .iter()
            .map(|(table_id, table)| {
                let table = table
                    .iter()
                    .map(|(row_id, row)| {
                        let row = row
                            .iter()
                            .map(|(cell_id, cell)| (cell_id.clone(), Some(cell.clone())))
                            .collect();
                        (row_id.clone(), row)
                    })
                    .collect();
                (table_id.clone(), table)
            })
            .collect();
        let values = state
            .values
            .iter()
            .map(|(id, value)| (id.clone(), Some(value.clone())))
            .collect();
        Content::new(tables, values)
    }

    /// Replace the full store state from persisted content.
    ///
    /// Both halves are replaced wholesale. Absent entries are skipped, so a
    /// cell that was persisted as absent reads back as absent afterwards.
    pub fn set_content(&self, content: Content) {
        let Content(tables, values) = content;
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.tables = strip_absent_tables(tables);
            state.values = strip_absent_values(values);
        }
        self.notify();
    }

    /// Register a listener invoked after every state change.
    pub fn add_change_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.by_id.insert(id, Arc::new(listener));
        ListenerId(id)
    }

    /// Remove a listener. A no-op for unknown or already-removed ids.
    pub fn del_change_listener(&self, id: ListenerId) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.by_id.remove(&id.0);
    }

    // Invoked outside the state lock so listeners may read the store.
    fn notify(&self) {
        let callbacks: Vec<ChangeListener> = {
            let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.by_id.values().cloned().collect()
        };
        for callback in callbacks {
            callback();
        }
    }
}

fn strip_absent_tables(
    tables: Tables,
) -> BTreeMap<String, BTreeMap<String, BTreeMap<String, Cell>>> {
    tables
        .into_iter()
        .map(|(table_id, table)| {
            let table = table
                .into_iter()
                .map(|(row_id, row)| {
                    let row = row
                        .into_iter()
                        .filter_map(|(cell_id, cell)| cell.map(|c| (cell_id, c)))
                        .collect();
                    (row_id, row)
                })
                .collect();
            (table_id, table)
        })
        .collect()
}

fn strip_absent_values(values: Values) -> BTreeMap<String, Cell> {
    values
        .into_iter()
        .filter_map(|(id, value)| value.map(|v| (id, v)))
        .collect()
}
