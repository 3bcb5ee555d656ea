//! Core persistence and use-case logic for the schedule app.
//! This crate is the single source of truth for storage invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::{
    ConfigError, StorageLayout, ACTIVE_SCHEDULES_FILE, COMPLETED_SCHEDULES_FILE,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::schedule::{Schedule, ScheduleId, ScheduleValidationError};
pub use service::schedule_service::{
    NewSchedule, ScheduleService, ScheduleServiceError, ServiceResult,
};
pub use store::{
    ArchiveObserver, ChangeObserver, Record, RecordStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
