//! End-to-end tests over real files in a temp directory.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tabula_file_persister::{create_file_persister, create_file_persister_with_interval};
use tabula_store::{Cell, Store};

async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

fn bump_mtime(path: &Path, forward: Duration) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + forward).unwrap();
}

#[tokio::test]
async fn save_writes_store_content_to_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(Store::new());
    store.set_cell("pets", "fido", "species", "dog");

    let persister = create_file_persister(Arc::clone(&store), &path, None);
    persister.save().await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("pets"));
    assert!(text.contains("fido"));
}

#[tokio::test]
async fn load_reads_persisted_file_into_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"[{"pets":{"fido":{"species":"dog"}}},{}]"#).unwrap();

    let store = Arc::new(Store::new());
    let persister = create_file_persister(Arc::clone(&store), &path, None);
    persister.load().await.unwrap();

    assert_eq!(store.cell("pets", "fido", "species"), Some(Cell::from("dog")));
}

#[tokio::test]
async fn load_from_a_missing_file_is_empty_and_does_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-written.json");

    let store = Arc::new(Store::new());
    let persister = create_file_persister(Arc::clone(&store), &path, None);
    persister.load().await.unwrap();

    assert!(store.content().is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn load_from_a_corrupt_file_is_empty_and_does_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "definitely not json").unwrap();

    let store = Arc::new(Store::new());
    let persister = create_file_persister(Arc::clone(&store), &path, None);
    persister.load().await.unwrap();

    assert!(store.content().is_empty());
}

#[tokio::test]
async fn never_set_cells_read_back_as_absent_after_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(Store::new());
    store.set_cell("users", "alice", "name", "Alice");
    let persister = create_file_persister(Arc::clone(&store), &path, None);
    persister.save().await.unwrap();

    let fresh = Arc::new(Store::new());
    let fresh_persister = create_file_persister(Arc::clone(&fresh), &path, None);
    fresh_persister.load().await.unwrap();

    assert_eq!(fresh.cell("users", "alice", "name"), Some(Cell::from("Alice")));
    assert_eq!(fresh.cell("users", "alice", "age"), None);
}

#[tokio::test]
async fn explicitly_absent_cells_survive_a_round_trip_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    // A file written by another producer, with an absent marker in it.
    std::fs::write(&path, r#"[{"users":{"alice":{"age":null,"name":"Alice"}}},{}]"#).unwrap();

    let store = Arc::new(Store::new());
    let persister = create_file_persister(Arc::clone(&store), &path, None);
    persister.load().await.unwrap();

    assert_eq!(store.cell("users", "alice", "age"), None);
    assert_ne!(store.cell("users", "alice", "age"), Some(Cell::from("null")));
}

#[tokio::test]
async fn auto_save_persists_changes_without_an_explicit_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(Store::new());
    let persister = create_file_persister(Arc::clone(&store), &path, None);
    persister.start_auto_save().await.unwrap();

    store.set_cell("pets", "fido", "species", "dog");

    let saved = wait_until(|| {
        std::fs::read_to_string(&path).is_ok_and(|text| text.contains("fido"))
    })
    .await;
    assert!(saved);

    persister.stop_auto_save();
}

#[tokio::test]
async fn auto_load_picks_up_external_modifications() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "[{},{}]").unwrap();

    let store = Arc::new(Store::new());
    let persister = create_file_persister_with_interval(
        Arc::clone(&store),
        &path,
        Duration::from_millis(25),
        None,
    );
    persister.start_auto_load().await.unwrap();

    // Let the watcher establish its baseline, then modify behind its back.
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, r#"[{"pets":{"fido":{"species":"dog"}}},{}]"#).unwrap();
    bump_mtime(&path, Duration::from_secs(10));

    let loaded =
        wait_until(|| store.cell("pets", "fido", "species") == Some(Cell::from("dog"))).await;
    assert!(loaded);

    persister.stop_auto_load();
}

#[tokio::test]
async fn attaching_the_watcher_creates_a_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(Store::new());
    let persister = create_file_persister_with_interval(
        Arc::clone(&store),
        &path,
        Duration::from_millis(25),
        None,
    );
    persister.start_auto_load().await.unwrap();

    assert!(wait_until(|| path.exists()).await);
    persister.stop_auto_load();
}

#[tokio::test]
async fn stopping_twice_or_without_starting_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(Store::new());
    let persister = create_file_persister(Arc::clone(&store), &path, None);

    persister.stop_auto_load();
    persister.stop_auto_load();
    persister.stop_auto_save();

    persister.start_auto_load().await.unwrap();
    persister.stop_auto_load();
    persister.stop_auto_load();
}

#[tokio::test]
async fn file_path_reports_the_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = Arc::new(Store::new());
    let persister = create_file_persister(store, &path, None);
    assert_eq!(persister.file_path(), path.as_path());
}
