//! Polling change detection for a single file.
//!
//! The filesystem surface used here exposes no native change-notification
//! primitive, so external modifications are detected by re-reading the
//! file's modification timestamp on a fixed tick. Detection latency is up
//! to one interval; the contract is the timestamp comparison, not a
//! push-based watch.

use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use tabula_persister::{report_ignored, IgnoredErrorHandler, PersisterError, PersisterListener};

use crate::file::FileHandle;

/// Tick interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Watches one file for external modification by polling its timestamp.
pub struct PollWatcher {
    file: FileHandle,
    interval: Duration,
}

impl PollWatcher {
    /// Create a watcher over `file`, ticking every `interval`.
    pub fn new(file: FileHandle, interval: Duration) -> Self {
        Self { file, interval }
    }

    /// Start watching. `listener` is invoked (with no arguments) whenever a
    /// tick observes a modification time different from the previous one.
    ///
    /// The first observation only establishes the baseline and never fires
    /// the listener. Ticks where the file is missing, or where the stat
    /// fails, fire nothing; stat failures are routed to `on_ignored_error`
    /// and the loop keeps ticking.
    ///
    /// If the file does not exist, an empty one is written so the first
    /// poll has something to baseline. That write runs detached: a load
    /// racing it may observe the file mid-creation, and any error it hits
    /// is routed to `on_ignored_error` without aborting the attach.
    pub fn attach(
        &self,
        listener: PersisterListener,
        on_ignored_error: Option<IgnoredErrorHandler>,
    ) -> WatchHandle {
        let file = self.file.clone();
        let on_error = on_ignored_error.clone();
        tokio::spawn(async move {
            if !file.exists().await {
                if let Err(error) = file.write_text("").await {
                    report_ignored(on_error.as_ref(), &error.into());
                }
            }
        });

        let file = self.file.clone();
        let interval = self.interval;
        let task = tokio::spawn(async move {
            let mut last_modified: Option<SystemTime> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match file.modified().await {
                    Ok(Some(modified)) => {
                        if last_modified.is_some_and(|last| last != modified) {
                            log::debug!("{} changed on disk", file.path().display());
                            listener();
                        }
                        last_modified = Some(modified);
                    }
                    Ok(None) => {}
                    Err(error) => {
                        let error = PersisterError::Read {
                            message: error.to_string(),
                        };
                        report_ignored(on_ignored_error.as_ref(), &error);
                    }
                }
            }
        });

        WatchHandle { task: Some(task) }
    }
}

/// Cancellation handle for an active poll loop.
///
/// Cancelling is idempotent, and dropping the handle cancels too, so a
/// watcher can never outlive the persister that started it.
pub struct WatchHandle {
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Stop the poll loop. A no-op when already cancelled.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the poll loop has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_listener() -> (PersisterListener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let listener: PersisterListener = Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (listener, count)
    }

    fn bump_mtime(path: &std::path::Path, forward: Duration) {
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .unwrap();
        file.set_modified(SystemTime::now() + forward).unwrap();
    }

    #[tokio::test]
    async fn baseline_tick_does_not_fire() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[{},{}]").unwrap();

        let watcher = PollWatcher::new(FileHandle::new(&path), Duration::from_millis(20));
        let (listener, count) = counting_listener();
        let _handle = watcher.attach(listener, None);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fires_when_the_timestamp_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[{},{}]").unwrap();

        let watcher = PollWatcher::new(FileHandle::new(&path), Duration::from_millis(20));
        let (listener, count) = counting_listener();
        let _handle = watcher.attach(listener, None);

        // Let the baseline land, then push the timestamp well forward.
        tokio::time::sleep(Duration::from_millis(80)).await;
        bump_mtime(&path, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn attach_creates_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let file = FileHandle::new(&path);
        let watcher = PollWatcher::new(file.clone(), Duration::from_millis(20));
        let (listener, _count) = counting_listener();
        let _handle = watcher.attach(listener, None);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(file.exists().await);
        assert_eq!(file.read_text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "").unwrap();

        let watcher = PollWatcher::new(FileHandle::new(&path), Duration::from_millis(20));
        let (listener, count) = counting_listener();
        let mut handle = watcher.attach(listener, None);

        handle.cancel();
        assert!(handle.is_cancelled());
        handle.cancel();

        // No more ticks after cancellation.
        bump_mtime(&path, Duration::from_secs(10));
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
