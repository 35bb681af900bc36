//! The bridge-operations trait a medium implements to become persistable.

use std::sync::Arc;

use async_trait::async_trait;

use tabula_store::Content;

use crate::PersisterError;

/// Signal that the persisted medium changed underneath the persister.
///
/// Carries no payload: the persister reacts by re-running its load path,
/// it is never handed the changed content directly.
pub type PersisterListener = Arc<dyn Fn() + Send + Sync>;

/// Observer for errors the persister swallows instead of propagating.
pub type IgnoredErrorHandler = Arc<dyn Fn(&PersisterError) + Send + Sync>;

/// What kinds of store a persister supports.
///
/// Recorded on the persister and exposed for introspection; this workspace
/// ships only the plain [`Store`](tabula_store::Store), so the tag crosses
/// the interface for parity with other implementations rather than for
/// dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Persists {
    /// Plain stores only.
    StoreOnly,
    /// Plain or mergeable stores.
    StoreOrMergeableStore,
}

/// The four operations a medium supplies to the [`Persister`](crate::Persister) harness.
///
/// Implementations bridge one concrete medium (a file, a network endpoint,
/// a browser storage area) to the store-shaped [`Content`] pair. The
/// harness supplies everything above: `load`/`save`, the auto variants,
/// and error routing.
#[async_trait]
pub trait PersisterOps: Send + Sync + 'static {
    /// Cancellation handle returned by [`add_listener`](Self::add_listener).
    type ListenerHandle: Send + 'static;

    /// Pull the currently persisted content from the medium.
    async fn get_persisted(&self) -> Result<Content, PersisterError>;

    /// Push content to the medium, replacing what was there.
    async fn set_persisted(&self, content: Content) -> Result<(), PersisterError>;

    /// Start change detection on the medium, invoking `listener` whenever
    /// an external modification is observed.
    fn add_listener(
        &self,
        listener: PersisterListener,
    ) -> Result<Self::ListenerHandle, PersisterError>;

    /// Stop change detection. Must be a no-op for an already-stopped handle.
    fn del_listener(&self, handle: Self::ListenerHandle);
}
