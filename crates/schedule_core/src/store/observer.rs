//! Deletion notification contracts.
//!
//! # Responsibility
//! - Define the callback a [`RecordStore`] invokes after a durable deletion.
//! - Provide the archive wiring that copies deleted records into a
//!   companion store.
//!
//! # Invariants
//! - Callbacks run inline on the deleting caller, after the source file no
//!   longer contains the record.
//! - Stores never own their observer; callers keep the `Arc`.

use super::record_store::{Record, RecordStore};
use log::{error, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Receives records removed from a store.
pub trait ChangeObserver<T>: Send + Sync {
    /// Called once per successful `delete_at`, with the removed record.
    fn on_deleted(&self, store: &RecordStore<T>, item: &T);
}

/// Observer that archives deleted records into a companion store.
///
/// The companion store is shared with the caller so both can read it.
pub struct ArchiveObserver<T> {
    archive: Arc<Mutex<RecordStore<T>>>,
    failed_archives: AtomicUsize,
}

impl<T> ArchiveObserver<T> {
    pub fn new(archive: Arc<Mutex<RecordStore<T>>>) -> Self {
        Self {
            archive,
            failed_archives: AtomicUsize::new(0),
        }
    }

    /// Shared handle to the archive store.
    pub fn archive(&self) -> &Arc<Mutex<RecordStore<T>>> {
        &self.archive
    }

    /// Number of deletions that could not be archived.
    ///
    /// The callback signature cannot return errors, so failures are counted
    /// and logged here.
    pub fn failed_archives(&self) -> usize {
        self.failed_archives.load(Ordering::SeqCst)
    }

    fn record_failure(&self) {
        self.failed_archives.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: Record + Send> ChangeObserver<T> for ArchiveObserver<T> {
    fn on_deleted(&self, store: &RecordStore<T>, item: &T) {
        let mut archive = match self.archive.lock() {
            Ok(archive) => archive,
            Err(_) => {
                error!(
                    "event=archive_record module=store status=error source={} error_code=lock_poisoned",
                    store.file_label()
                );
                self.record_failure();
                return;
            }
        };

        if let Err(err) = archive.create(item.clone()) {
            error!(
                "event=archive_record module=store status=error source={} target={} error_code={} error={}",
                store.file_label(),
                archive.file_label(),
                err.code(),
                err
            );
            self.record_failure();
            return;
        }

        let reloaded = archive.load().map(|records| records.len());
        match reloaded {
            Ok(records) => info!(
                "event=archive_record module=store status=ok source={} target={} records={}",
                store.file_label(),
                archive.file_label(),
                records
            ),
            Err(err) => warn!(
                "event=archive_record module=store status=reload_failed target={} error_code={}",
                archive.file_label(),
                err.code()
            ),
        }
    }
}
