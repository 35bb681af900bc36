//! File persistence for tabula stores.
//!
//! Bridges a [`Store`] to a single JSON file on the local filesystem:
//! content is written as the `[tables, values]` wire array (see
//! [`codec`]), loads that hit a missing or corrupt file fall back to
//! empty content, and external modifications are detected by polling the
//! file's modification timestamp (see [`watch`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabula_file_persister::create_file_persister;
//! use tabula_store::Store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tabula_persister::PersisterError> {
//!     let store = Arc::new(Store::new());
//!     let persister = create_file_persister(Arc::clone(&store), "/data/app/store.json", None);
//!
//!     persister.load().await?;
//!     persister.start_auto_save().await?;
//!
//!     store.set_cell("pets", "fido", "species", "dog");
//!     // ...the file now converges on the store's content.
//!     Ok(())
//! }
//! ```

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tabula_persister::{
    IgnoredErrorHandler, Persister, PersisterError, PersisterListener, PersisterOps, Persists,
};
use tabula_store::{Content, Store};

pub mod codec;
mod file;
mod watch;

pub use codec::CodecError;
pub use file::FileHandle;
pub use watch::{PollWatcher, WatchHandle, DEFAULT_POLL_INTERVAL};

/// Bridge operations over one JSON file.
///
/// Usually constructed through [`create_file_persister`]; public so other
/// harness assemblies can reuse the file medium directly.
pub struct FilePersisterOps {
    file: FileHandle,
    poll_interval: Duration,
    on_ignored_error: Option<IgnoredErrorHandler>,
}

#[async_trait]
impl PersisterOps for FilePersisterOps {
    type ListenerHandle = WatchHandle;

    /// Read and decode the file.
    ///
    /// Never fails: a missing, unreadable, or corrupt file loads as empty
    /// content rather than as an error.
    async fn get_persisted(&self) -> Result<Content, PersisterError> {
        let text = match self.file.read_text().await {
            Ok(text) => text,
            Err(error) => {
                log::debug!(
                    "loading {} as empty content: {}",
                    self.file.path().display(),
                    error
                );
                return Ok(Content::default());
            }
        };
        match codec::decode(&text) {
            Ok(content) => Ok(content),
            Err(error) => {
                log::debug!(
                    "loading {} as empty content: {}",
                    self.file.path().display(),
                    error
                );
                Ok(Content::default())
            }
        }
    }

    /// Encode content and overwrite the file with it.
    async fn set_persisted(&self, content: Content) -> Result<(), PersisterError> {
        let text = codec::encode(&content)?;
        self.file.write_text(&text).await?;
        Ok(())
    }

    fn add_listener(
        &self,
        listener: PersisterListener,
    ) -> Result<Self::ListenerHandle, PersisterError> {
        let watcher = PollWatcher::new(self.file.clone(), self.poll_interval);
        Ok(watcher.attach(listener, self.on_ignored_error.clone()))
    }

    fn del_listener(&self, mut handle: Self::ListenerHandle) {
        handle.cancel();
    }
}

/// A persister bound to one JSON file.
///
/// Wraps the generic [`Persister`] harness (all of its methods are
/// available through deref) and adds the file-specific surface.
pub struct FilePersister {
    inner: Persister<FilePersisterOps>,
}

impl FilePersister {
    /// The path of the backing file.
    pub fn file_path(&self) -> &Path {
        self.inner.ops().file.path()
    }
}

impl Deref for FilePersister {
    type Target = Persister<FilePersisterOps>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Create a persister that persists `store` to the file at `path`,
/// polling for external changes every [`DEFAULT_POLL_INTERVAL`].
///
/// Errors during background work are routed to `on_ignored_error` when
/// supplied, and silently dropped otherwise.
pub fn create_file_persister(
    store: Arc<Store>,
    path: impl Into<PathBuf>,
    on_ignored_error: Option<IgnoredErrorHandler>,
) -> FilePersister {
    create_file_persister_with_interval(store, path, DEFAULT_POLL_INTERVAL, on_ignored_error)
}

/// [`create_file_persister`] with a custom poll interval.
///
/// `poll_interval` must be non-zero. Shorter intervals lower detection
/// latency at the cost of more stat traffic.
pub fn create_file_persister_with_interval(
    store: Arc<Store>,
    path: impl Into<PathBuf>,
    poll_interval: Duration,
    on_ignored_error: Option<IgnoredErrorHandler>,
) -> FilePersister {
    let ops = FilePersisterOps {
        file: FileHandle::new(path),
        poll_interval,
        on_ignored_error: on_ignored_error.clone(),
    };
    FilePersister {
        inner: Persister::new(store, ops, Persists::StoreOrMergeableStore, on_ignored_error),
    }
}
