//! Schedule list use-case service.
//!
//! # Responsibility
//! - Own the pending and completed schedule stores.
//! - Archive a schedule into the completed store when it is completed.
//! - Validate schedules before they are written.
//!
//! # Invariants
//! - The pending store's observer is owned here, never by the store.
//! - A completed schedule is written to the completed store only after the
//!   pending store no longer contains it on disk.

use crate::config::{ConfigError, StorageLayout, ACTIVE_SCHEDULES_FILE, COMPLETED_SCHEDULES_FILE};
use crate::model::schedule::{Schedule, ScheduleId, ScheduleValidationError};
use crate::store::{ArchiveObserver, RecordStore, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

pub type ServiceResult<T> = Result<T, ScheduleServiceError>;

/// Service error for schedule use-cases.
#[derive(Debug)]
pub enum ScheduleServiceError {
    /// Storage directory could not be prepared.
    Config(ConfigError),
    /// Input failed field validation.
    Validation(ScheduleValidationError),
    /// Target schedule is not in the pending list.
    ScheduleNotFound(ScheduleId),
    /// Persistence-layer failure.
    Store(StoreError),
    /// Removed from the pending list but not written to the completed list.
    /// Carries the schedule so the caller can restore it.
    ArchiveFailed(Schedule),
    LockPoisoned,
}

impl Display for ScheduleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ScheduleNotFound(id) => write!(f, "schedule not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::ArchiveFailed(schedule) => {
                write!(f, "schedule {} was not archived", schedule.id)
            }
            Self::LockPoisoned => write!(f, "completed schedule store lock is poisoned"),
        }
    }
}

impl Error for ScheduleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for ScheduleServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ScheduleValidationError> for ScheduleServiceError {
    fn from(value: ScheduleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ScheduleServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Request model for adding a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewSchedule {
    pub title: String,
    pub detail: String,
    /// Optional due time in epoch milliseconds.
    pub due_at: Option<i64>,
}

/// Pending/completed schedule lists backed by two record files.
pub struct ScheduleService {
    pending: RecordStore<Schedule>,
    completed: Arc<Mutex<RecordStore<Schedule>>>,
    archiver: Arc<ArchiveObserver<Schedule>>,
}

impl std::fmt::Debug for ScheduleService {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleService")
            .field("pending", &self.pending)
            .field("failed_archives", &self.archiver.failed_archives())
            .finish_non_exhaustive()
    }
}

impl ScheduleService {
    /// Opens both schedule stores under `layout` and loads them.
    ///
    /// # Errors
    /// - `Config` when the base directory cannot be created.
    /// - `Store` when either existing file cannot be decoded.
    pub fn open(layout: &StorageLayout) -> ServiceResult<Self> {
        layout.ensure_base_dir()?;

        let mut pending: RecordStore<Schedule> = RecordStore::open(layout, ACTIVE_SCHEDULES_FILE)?;
        let completed: Arc<Mutex<RecordStore<Schedule>>> = Arc::new(Mutex::new(
            RecordStore::open(layout, COMPLETED_SCHEDULES_FILE)?,
        ));
        let archiver = Arc::new(ArchiveObserver::new(Arc::clone(&completed)));
        pending.observe_with(&archiver);

        let pending_count = pending.load()?.len();
        let service = Self {
            pending,
            completed,
            archiver,
        };
        let completed_count = service.completed_store()?.load()?.len();

        info!(
            "event=schedule_service_open module=service status=ok pending={} completed={}",
            pending_count, completed_count
        );
        Ok(service)
    }

    /// Pending schedules in display order.
    pub fn pending(&self) -> &[Schedule] {
        self.pending.items()
    }

    /// Snapshot of completed schedules, oldest completion first.
    pub fn completed(&self) -> ServiceResult<Vec<Schedule>> {
        Ok(self.completed_store()?.items().to_vec())
    }

    /// Validates and appends a new pending schedule.
    pub fn add_schedule(&mut self, request: &NewSchedule) -> ServiceResult<Schedule> {
        let mut schedule = Schedule::new(request.title.trim(), now_epoch_ms());
        schedule.detail = request.detail.clone();
        schedule.due_at = request.due_at;
        schedule.validate()?;

        self.pending.create(schedule.clone())?;
        info!(
            "event=schedule_add module=service status=ok pending={}",
            self.pending.len()
        );
        Ok(schedule)
    }

    /// Replaces `current` with `updated` in the pending list.
    ///
    /// # Errors
    /// - `ScheduleNotFound` when `current` is not pending.
    pub fn edit_schedule(&mut self, current: &Schedule, updated: Schedule) -> ServiceResult<()> {
        updated.validate()?;
        if !self.pending.update(current, updated)? {
            return Err(ScheduleServiceError::ScheduleNotFound(current.id));
        }
        Ok(())
    }

    /// Replaces the pending schedule at `index`.
    pub fn edit_schedule_at(&mut self, index: usize, updated: Schedule) -> ServiceResult<()> {
        updated.validate()?;
        self.pending.update_at(index, updated)?;
        Ok(())
    }

    /// Moves the pending schedule at `index` into the completed list.
    ///
    /// # Errors
    /// - `Store` when the pending list could not be written; nothing moved.
    /// - `ArchiveFailed` when the schedule left the pending list but the
    ///   completed list could not be written.
    pub fn complete_schedule(&mut self, index: usize) -> ServiceResult<Schedule> {
        let failures_before = self.archiver.failed_archives();
        let schedule = self.pending.delete_at(index)?;
        if self.archiver.failed_archives() > failures_before {
            return Err(ScheduleServiceError::ArchiveFailed(schedule));
        }

        info!(
            "event=schedule_complete module=service status=ok index={} pending={}",
            index,
            self.pending.len()
        );
        Ok(schedule)
    }

    /// Moves the completed schedule at `index` back to the end of the
    /// pending list.
    ///
    /// The pending list is written first, so a failure at any step leaves
    /// the schedule in at least one list on disk.
    pub fn reopen_schedule(&mut self, index: usize) -> ServiceResult<Schedule> {
        let schedule = {
            let completed = self.completed_store()?;
            completed
                .get(index)
                .cloned()
                .ok_or(StoreError::IndexOutOfBounds {
                    index,
                    len: completed.len(),
                })?
        };

        self.pending.create(schedule.clone())?;
        self.completed_store()?.delete_at(index)?;
        info!(
            "event=schedule_reopen module=service status=ok index={} pending={}",
            index,
            self.pending.len()
        );
        Ok(schedule)
    }

    /// Reorders the pending list.
    pub fn reorder(&mut self, from: usize, to: usize) -> ServiceResult<()> {
        self.pending.move_item(from, to)?;
        Ok(())
    }

    /// Returns whether `schedule` is currently pending on disk.
    pub fn is_pending(&mut self, schedule: &Schedule) -> bool {
        self.pending.contains(schedule)
    }

    /// Empties the completed list.
    pub fn clear_completed(&mut self) -> ServiceResult<()> {
        self.completed_store()?.clear()?;
        Ok(())
    }

    /// Re-reads both lists from disk.
    pub fn reload(&mut self) -> ServiceResult<()> {
        self.pending.load()?;
        self.completed_store()?.load()?;
        Ok(())
    }

    fn completed_store(&self) -> ServiceResult<MutexGuard<'_, RecordStore<Schedule>>> {
        self.completed
            .lock()
            .map_err(|_| ScheduleServiceError::LockPoisoned)
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
