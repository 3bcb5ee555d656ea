use schedule_core::{ArchiveObserver, ChangeObserver, RecordStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Task {
    title: String,
}

fn task(title: &str) -> Task {
    Task {
        title: title.to_string(),
    }
}

fn on_disk(path: &Path) -> Vec<Task> {
    let mut store: RecordStore<Task> = RecordStore::at_path(path);
    store.load().unwrap().to_vec()
}

/// Captures each notification together with the source file contents at
/// the moment the callback ran.
#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<(Task, PathBuf, Vec<Task>)>>,
}

impl RecordingObserver {
    fn seen(&self) -> Vec<(Task, PathBuf, Vec<Task>)> {
        self.seen.lock().unwrap().clone()
    }
}

impl ChangeObserver<Task> for RecordingObserver {
    fn on_deleted(&self, store: &RecordStore<Task>, item: &Task) {
        let source_on_disk = on_disk(store.path());
        self.seen.lock().unwrap().push((
            item.clone(),
            store.path().to_path_buf(),
            source_on_disk,
        ));
    }
}

fn seeded_store(path: &Path, titles: &[&str]) -> RecordStore<Task> {
    let mut store = RecordStore::at_path(path);
    store
        .synchronize(titles.iter().map(|title| task(title)).collect())
        .unwrap();
    store
}

#[test]
fn observer_runs_after_source_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("active.store");
    let mut store = seeded_store(&path, &["a", "b", "c"]);
    let observer = Arc::new(RecordingObserver::default());
    store.observe_with(&observer);

    let removed = store.delete_at(1).unwrap();

    assert_eq!(removed, task("b"));
    let seen = observer.seen();
    assert_eq!(seen.len(), 1);
    let (item, source_path, source_on_disk) = &seen[0];
    assert_eq!(item, &task("b"));
    assert_eq!(source_path, &path);
    assert_eq!(source_on_disk, &vec![task("a"), task("c")]);
}

#[test]
fn archive_observer_moves_deleted_record_to_companion_file() {
    let dir = tempfile::tempdir().unwrap();
    let active_path = dir.path().join("active.store");
    let archive_path = dir.path().join("completed.store");

    let archive = Arc::new(Mutex::new(RecordStore::<Task>::at_path(&archive_path)));
    let archiver = Arc::new(ArchiveObserver::new(Arc::clone(&archive)));
    let mut active = seeded_store(&active_path, &["write report", "call bank"]);
    active.observe_with(&archiver);

    active.delete_at(0).unwrap();
    active.delete_at(0).unwrap();

    assert!(on_disk(&active_path).is_empty());
    assert_eq!(
        on_disk(&archive_path),
        vec![task("write report"), task("call bank")]
    );
    assert_eq!(
        archive.lock().unwrap().items(),
        &[task("write report"), task("call bank")]
    );
    assert_eq!(archiver.failed_archives(), 0);
}

#[test]
fn dropped_observer_is_skipped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("active.store");
    let mut store = seeded_store(&path, &["a", "b"]);

    let observer = Arc::new(RecordingObserver::default());
    store.observe_with(&observer);
    assert!(store.has_observer());
    drop(observer);
    assert!(!store.has_observer());

    let removed = store.delete_at(0).unwrap();
    assert_eq!(removed, task("a"));
    assert_eq!(on_disk(&path), vec![task("b")]);
}

#[test]
fn store_does_not_keep_observer_alive() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&dir.path().join("active.store"), &["a"]);
    let observer = Arc::new(RecordingObserver::default());

    store.observe_with(&observer);

    assert_eq!(Arc::strong_count(&observer), 1);
}

#[test]
fn cleared_observer_receives_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&dir.path().join("active.store"), &["a", "b"]);
    let observer = Arc::new(RecordingObserver::default());
    store.observe_with(&observer);

    store.clear_observer();
    store.delete_at(0).unwrap();

    assert!(observer.seen().is_empty());
}

#[test]
fn failed_delete_keeps_cache_and_skips_notification() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir(&data_dir).unwrap();
    let path = data_dir.join("active.store");
    let mut store = seeded_store(&path, &["a", "b"]);
    let observer = Arc::new(RecordingObserver::default());
    store.observe_with(&observer);

    std::fs::remove_dir_all(&data_dir).unwrap();

    let err = store.delete_at(0).unwrap_err();
    match err {
        StoreError::Delete { index, source } => {
            assert_eq!(index, 0);
            assert!(matches!(*source, StoreError::Write { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.items(), &[task("a"), task("b")]);
    assert!(observer.seen().is_empty());
}

#[test]
fn delete_out_of_range_is_rejected_without_notification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("active.store");
    let mut store = seeded_store(&path, &["only"]);
    let observer = Arc::new(RecordingObserver::default());
    store.observe_with(&observer);

    let err = store.delete_at(5).unwrap_err();

    assert!(matches!(err, StoreError::IndexOutOfBounds { index: 5, len: 1 }));
    assert_eq!(on_disk(&path), vec![task("only")]);
    assert!(observer.seen().is_empty());
}
