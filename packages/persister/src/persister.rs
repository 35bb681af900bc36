//! The generic persister harness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tabula_store::{Content, ListenerId, Store};

use crate::{IgnoredErrorHandler, PersisterError, PersisterListener, PersisterOps, Persists};

/// Route a background error to the ignored-error handler.
///
/// Bridge-operation implementations should use this for failures that must
/// not stop a polling or auto-persist loop.
pub fn report_ignored(handler: Option<&IgnoredErrorHandler>, error: &PersisterError) {
    log::warn!("ignoring persister error: {}", error);
    if let Some(handler) = handler {
        handler(error);
    }
}

struct AutoLoad<H> {
    listener: H,
    task: JoinHandle<()>,
}

struct AutoSave {
    listener: ListenerId,
    task: JoinHandle<()>,
}

/// Bridges a [`Store`] to a durable medium through a set of
/// [`PersisterOps`].
///
/// The harness owns the lifecycle: one-shot [`load`](Self::load) and
/// [`save`](Self::save), and the auto variants that keep store and medium
/// in sync in both directions until stopped. Background failures are
/// routed to the optional ignored-error handler and never stop the loops;
/// explicit `save` failures reject.
///
/// # Example
///
/// ```rust,ignore
/// let persister = Persister::new(store, ops, Persists::StoreOnly, None);
/// persister.load().await?;
/// persister.start_auto_save().await?;
/// ```
pub struct Persister<O: PersisterOps> {
    store: Arc<Store>,
    ops: Arc<O>,
    kind: Persists,
    on_ignored_error: Option<IgnoredErrorHandler>,
    // Set while a load applies content, so auto-save does not echo the
    // loaded state straight back to the medium.
    loading: Arc<AtomicBool>,
    auto_load: Mutex<Option<AutoLoad<O::ListenerHandle>>>,
    auto_save: Mutex<Option<AutoSave>>,
}

impl<O: PersisterOps> Persister<O> {
    /// Assemble a persister from a store and a medium's bridge operations.
    pub fn new(
        store: Arc<Store>,
        ops: O,
        kind: Persists,
        on_ignored_error: Option<IgnoredErrorHandler>,
    ) -> Self {
        Self {
            store,
            ops: Arc::new(ops),
            kind,
            on_ignored_error,
            loading: Arc::new(AtomicBool::new(false)),
            auto_load: Mutex::new(None),
            auto_save: Mutex::new(None),
        }
    }

    /// The store this persister is bound to.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The kind tag this persister was assembled with.
    pub fn persists(&self) -> Persists {
        self.kind
    }

    /// The underlying bridge operations.
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Pull persisted content from the medium into the store.
    pub async fn load(&self) -> Result<(), PersisterError> {
        let content = self.ops.get_persisted().await?;
        apply_content(&self.store, &self.loading, content);
        Ok(())
    }

    /// Push the store's content to the medium, replacing what was there.
    ///
    /// Write failures reject: there is no fallback for a failed save.
    pub async fn save(&self) -> Result<(), PersisterError> {
        self.ops.set_persisted(self.store.content()).await
    }

    /// Load once, then keep reloading whenever the medium reports an
    /// external change. Replaces any previous auto-load.
    pub async fn start_auto_load(&self) -> Result<(), PersisterError> {
        self.stop_auto_load();
        self.load().await?;

        let (tx, mut rx) = mpsc::channel::<()>(1);
        let listener: PersisterListener = Arc::new(move || {
            // A full channel already holds a pending reload; drop the signal.
            let _ = tx.try_send(());
        });
        let handle = self.ops.add_listener(listener)?;

        let ops = Arc::clone(&self.ops);
        let store = Arc::clone(&self.store);
        let loading = Arc::clone(&self.loading);
        let on_ignored_error = self.on_ignored_error.clone();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                match ops.get_persisted().await {
                    Ok(content) => apply_content(&store, &loading, content),
                    Err(error) => report_ignored(on_ignored_error.as_ref(), &error),
                }
            }
        });

        let mut slot = self.auto_load.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(AutoLoad {
            listener: handle,
            task,
        });
        Ok(())
    }

    /// Stop auto-loading. A no-op when auto-load is not running.
    pub fn stop_auto_load(&self) {
        let previous = {
            let mut slot = self.auto_load.lock().unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };
        if let Some(auto) = previous {
            self.ops.del_listener(auto.listener);
            auto.task.abort();
        }
    }

    /// Save once, then keep saving whenever the store changes. Replaces any
    /// previous auto-save. Change bursts coalesce into a single pending save.
    pub async fn start_auto_save(&self) -> Result<(), PersisterError> {
        self.stop_auto_save();
        self.save().await?;

        let (tx, mut rx) = mpsc::channel::<()>(1);
        let loading = Arc::clone(&self.loading);
        let listener = self.store.add_change_listener(move || {
            if !loading.load(Ordering::SeqCst) {
                let _ = tx.try_send(());
            }
        });

        let ops = Arc::clone(&self.ops);
        let store = Arc::clone(&self.store);
        let on_ignored_error = self.on_ignored_error.clone();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                if let Err(error) = ops.set_persisted(store.content()).await {
                    report_ignored(on_ignored_error.as_ref(), &error);
                }
            }
        });

        let mut slot = self.auto_save.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(AutoSave { listener, task });
        Ok(())
    }

    /// Stop auto-saving. A no-op when auto-save is not running.
    pub fn stop_auto_save(&self) {
        let previous = {
            let mut slot = self.auto_save.lock().unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };
        if let Some(auto) = previous {
            self.store.del_change_listener(auto.listener);
            auto.task.abort();
        }
    }
}

impl<O: PersisterOps> Drop for Persister<O> {
    fn drop(&mut self) {
        self.stop_auto_load();
        self.stop_auto_save();
    }
}

fn apply_content(store: &Store, loading: &AtomicBool, content: Content) {
    loading.store(true, Ordering::SeqCst);
    store.set_content(content);
    loading.store(false, Ordering::SeqCst);
}
