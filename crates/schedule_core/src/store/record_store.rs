//! Generic file-backed record collection.
//!
//! # Responsibility
//! - Provide load/create/update/delete/reorder over one ordered collection.
//! - Persist the full collection after every mutation.
//! - Notify the registered observer after a durable deletion.
//!
//! # Invariants
//! - Mutations are staged on a copy of the cache; the cache is replaced only
//!   after the staged collection has been written.
//! - After any successful mutation the cache equals the file contents.
//! - Record order is significant and preserved across save/load.
//! - The observer reference is non-owning; a dropped observer is skipped.

use super::codec::{decode_records, encode_records};
use super::file::{read_if_exists, write_atomic};
use super::observer::ChangeObserver;
use super::{StoreError, StoreResult};
use crate::config::StorageLayout;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Instant;

/// Bounds required from values kept in a [`RecordStore`].
///
/// Equality is structural; no identity field is assumed.
pub trait Record: Serialize + DeserializeOwned + PartialEq + Clone {}

impl<T> Record for T where T: Serialize + DeserializeOwned + PartialEq + Clone {}

/// Ordered collection of records mirrored to one backing file.
pub struct RecordStore<T> {
    path: PathBuf,
    cache: Vec<T>,
    observer: Option<Weak<dyn ChangeObserver<T>>>,
}

impl<T> Debug for RecordStore<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .field("cached_records", &self.cache.len())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl<T: Record> RecordStore<T> {
    /// Creates a store for `filename` inside the layout's base directory.
    ///
    /// The cache starts empty; nothing is read until [`RecordStore::load`]
    /// or the first operation that reloads.
    ///
    /// # Errors
    /// - Returns `InvalidFilename` when `filename` is not a plain file name.
    pub fn open(layout: &StorageLayout, filename: &str) -> StoreResult<Self> {
        Ok(Self::at_path(layout.path_for(filename)?))
    }

    /// Creates a store bound to an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Vec::new(),
            observer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current cached records, in persisted order.
    pub fn items(&self) -> &[T] {
        &self.cache
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.cache.get(index)
    }

    /// Replaces the deletion observer. `None` disables notifications.
    pub fn set_observer(&mut self, observer: Option<Weak<dyn ChangeObserver<T>>>) {
        self.observer = observer;
    }

    /// Registers `observer` without taking ownership of it.
    pub fn observe_with<O>(&mut self, observer: &Arc<O>)
    where
        O: ChangeObserver<T> + 'static,
    {
        let weak: Weak<O> = Arc::downgrade(observer);
        self.observer = Some(weak);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Returns whether a registered observer is still alive.
    pub fn has_observer(&self) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|observer| observer.strong_count() > 0)
    }

    /// Reads the backing file into the cache.
    ///
    /// A missing file is not an error: the current cache is returned as is.
    ///
    /// # Errors
    /// - `Read` when the file exists but cannot be read.
    /// - `Decode`/`UnsupportedFormatVersion` when its contents are not a
    ///   readable collection. The cache is left unchanged in that case.
    pub fn load(&mut self) -> StoreResult<&[T]> {
        let started_at = Instant::now();
        let Some(bytes) = read_if_exists(&self.path)? else {
            debug!(
                "event=store_load module=store status=missing file={}",
                self.file_label()
            );
            return Ok(&self.cache);
        };

        match decode_records::<T>(&bytes, &self.path) {
            Ok(records) => {
                self.cache = records;
                debug!(
                    "event=store_load module=store status=ok file={} records={} duration_ms={}",
                    self.file_label(),
                    self.cache.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(&self.cache)
            }
            Err(err) => {
                error!(
                    "event=store_load module=store status=error file={} error_code={} error={}",
                    self.file_label(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Appends `item` and persists the collection.
    ///
    /// The file is reloaded first on a best-effort basis so records written
    /// by another handle are not lost.
    pub fn create(&mut self, item: T) -> StoreResult<()> {
        self.reload_best_effort("create");

        let mut staged = self.cache.clone();
        staged.push(item);
        self.commit(staged, "create")
    }

    /// Replaces the first record equal to `old` with `new`, in place.
    ///
    /// Returns `Ok(false)` without touching the cache or the file when no
    /// record equals `old`.
    pub fn update(&mut self, old: &T, new: T) -> StoreResult<bool> {
        let Some(index) = self.cache.iter().position(|item| item == old) else {
            debug!(
                "event=store_update module=store status=not_found file={}",
                self.file_label()
            );
            return Ok(false);
        };

        let mut staged = self.cache.clone();
        staged[index] = new;
        self.commit(staged, "update")?;
        Ok(true)
    }

    /// Replaces the record at `index` and persists the collection.
    pub fn update_at(&mut self, index: usize, item: T) -> StoreResult<()> {
        self.check_index(index)?;

        let mut staged = self.cache.clone();
        staged[index] = item;
        self.commit(staged, "update_at")
    }

    /// Removes the record at `index`, persists, then notifies the observer.
    ///
    /// # Errors
    /// - `IndexOutOfBounds` when `index` is not a cached position.
    /// - `Delete` wrapping the write failure. The cache keeps the record and
    ///   the observer is not notified.
    pub fn delete_at(&mut self, index: usize) -> StoreResult<T> {
        self.check_index(index)?;

        let mut staged = self.cache.clone();
        let removed = staged.remove(index);
        if let Err(source) = self.persist(&staged, "delete") {
            return Err(StoreError::Delete {
                index,
                source: Box::new(source),
            });
        }
        self.cache = staged;

        self.notify_deleted(&removed);
        Ok(removed)
    }

    /// Replaces the whole collection, typically after a reorder.
    pub fn synchronize(&mut self, items: Vec<T>) -> StoreResult<()> {
        self.commit(items, "synchronize")
    }

    /// Moves the record at `from` so it ends up at position `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> StoreResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let mut staged = self.cache.clone();
        let item = staged.remove(from);
        staged.insert(to, item);
        self.synchronize(staged)
    }

    /// Reloads on a best-effort basis, then reports whether any record
    /// equals `item`.
    pub fn contains(&mut self, item: &T) -> bool {
        self.reload_best_effort("contains");
        self.cache.iter().any(|candidate| candidate == item)
    }

    /// Removes every record and persists the empty collection.
    pub fn clear(&mut self) -> StoreResult<()> {
        self.reload_best_effort("clear");
        self.commit(Vec::new(), "clear")
    }

    fn commit(&mut self, staged: Vec<T>, operation: &'static str) -> StoreResult<()> {
        self.persist(&staged, operation)?;
        self.cache = staged;
        Ok(())
    }

    fn persist(&self, records: &[T], operation: &'static str) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = encode_records(records).and_then(|bytes| write_atomic(&self.path, &bytes));

        match &result {
            Ok(()) => info!(
                "event=store_save module=store status=ok op={} file={} records={} duration_ms={}",
                operation,
                self.file_label(),
                records.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_save module=store status=error op={} file={} duration_ms={} error_code={} error={}",
                operation,
                self.file_label(),
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    fn reload_best_effort(&mut self, operation: &'static str) {
        let reloaded = self.load().map(|_| ());
        if let Err(err) = reloaded {
            warn!(
                "event=store_reload module=store status=skipped op={} file={} error_code={}",
                operation,
                self.file_label(),
                err.code()
            );
        }
    }

    fn notify_deleted(&self, removed: &T) {
        let Some(observer) = self.observer.as_ref() else {
            return;
        };
        match observer.upgrade() {
            Some(observer) => observer.on_deleted(self, removed),
            None => debug!(
                "event=store_notify module=store status=observer_dropped file={}",
                self.file_label()
            ),
        }
    }

    fn check_index(&self, index: usize) -> StoreResult<()> {
        if index >= self.cache.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.cache.len(),
            });
        }
        Ok(())
    }

    /// File name used in log events; falls back to the full path.
    pub(crate) fn file_label(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::RecordStore;
    use crate::store::StoreError;

    #[test]
    fn failed_create_keeps_cache_untouched() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store: RecordStore<String> =
            RecordStore::at_path(dir.path().join("missing").join("items.store"));

        let err = store
            .create("first".to_string())
            .expect_err("write into missing dir must fail");
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn out_of_range_index_is_rejected_without_io() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("items.store");
        let mut store: RecordStore<String> = RecordStore::at_path(&path);

        let err = store
            .update_at(0, "x".to_string())
            .expect_err("empty store has no index 0");
        assert!(matches!(err, StoreError::IndexOutOfBounds { index: 0, len: 0 }));
        assert!(!path.exists());
    }

    #[test]
    fn move_item_to_same_position_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store: RecordStore<u32> = RecordStore::at_path(dir.path().join("n.store"));
        store.synchronize(vec![1, 2, 3]).expect("seed should persist");

        store.move_item(1, 1).expect("same-position move should succeed");
        assert_eq!(store.items(), &[1, 2, 3]);
    }

    #[test]
    fn debug_output_omits_record_contents() {
        let mut store: RecordStore<String> = RecordStore::at_path("/tmp/never-written.store");
        store.cache.push("secret title".to_string());
        let rendered = format!("{store:?}");
        assert!(rendered.contains("cached_records: 1"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn file_label_is_the_bare_file_name() {
        let store: RecordStore<String> = RecordStore::at_path("/var/app/data/schedules.store");
        assert_eq!(store.file_label(), "schedules.store");
    }

    #[test]
    fn observe_with_accepts_concrete_observer_types() {
        struct Noop;
        impl crate::store::ChangeObserver<u32> for Noop {
            fn on_deleted(&self, _store: &RecordStore<u32>, _item: &u32) {}
        }

        let mut store: RecordStore<u32> = RecordStore::at_path("/tmp/never-written.store");
        let observer = std::sync::Arc::new(Noop);
        store.observe_with(&observer);
        assert!(store.has_observer());
    }

    #[test]
    fn oversized_collection_is_rejected_before_writing() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("blobs.store");
        let mut store: RecordStore<Vec<u8>> = RecordStore::at_path(&path);
        store
            .synchronize(vec![vec![1u8; 16]])
            .expect("small seed should persist");
        let bytes_before = std::fs::read(&path).expect("seed file should exist");

        let oversized = vec![vec![7u8; crate::store::codec::MAX_PAYLOAD_BYTES + 1]];
        let err = store
            .synchronize(oversized)
            .expect_err("collection above the decode limit must not be written");

        assert!(matches!(err, StoreError::TooLarge { .. }));
        assert_eq!(store.items(), &[vec![1u8; 16]]);
        assert_eq!(
            std::fs::read(&path).expect("seed file should still exist"),
            bytes_before
        );
        assert_eq!(store.load().expect("file stays loadable"), &[vec![1u8; 16]]);
    }
}
