//! Schedule record.
//!
//! # Responsibility
//! - Define the record kept in the pending and completed schedule lists.
//! - Validate user-provided fields before they reach storage.
//!
//! # Invariants
//! - `id` is generated once and never reused for another schedule.
//! - `title` is non-empty after trimming and at most `MAX_TITLE_CHARS` long.
//! - Timestamps are Unix epoch milliseconds and never negative.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a schedule.
pub type ScheduleId = Uuid;

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// One scheduled item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub title: String,
    /// Free-form notes; may be empty.
    pub detail: String,
    /// Unix epoch milliseconds. `None` for undated items.
    pub due_at: Option<i64>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Schedule {
    /// Creates an undated schedule with a generated id and empty detail.
    pub fn new(title: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), title, created_at)
    }

    /// Creates a schedule with a caller-provided id.
    ///
    /// Used when the id already exists, e.g. when restoring an archived item.
    pub fn with_id(id: ScheduleId, title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            title: title.into(),
            detail: String::new(),
            due_at: None,
            created_at,
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        let title_chars = self.title.trim().chars().count();
        if title_chars == 0 {
            return Err(ScheduleValidationError::EmptyTitle);
        }
        if title_chars > MAX_TITLE_CHARS {
            return Err(ScheduleValidationError::TitleTooLong {
                chars: title_chars,
                max: MAX_TITLE_CHARS,
            });
        }
        if self.created_at < 0 {
            return Err(ScheduleValidationError::NegativeTimestamp("created_at"));
        }
        if self.due_at.is_some_and(|due_at| due_at < 0) {
            return Err(ScheduleValidationError::NegativeTimestamp("due_at"));
        }
        Ok(())
    }

    /// Returns whether the due time has passed at `now_ms`.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.due_at.is_some_and(|due_at| due_at < now_ms)
    }
}

/// Field validation failures for [`Schedule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleValidationError {
    EmptyTitle,
    TitleTooLong { chars: usize, max: usize },
    NegativeTimestamp(&'static str),
}

impl Display for ScheduleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "schedule title cannot be empty"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "schedule title has {chars} characters; max is {max}")
            }
            Self::NegativeTimestamp(field) => write!(f, "schedule {field} cannot be negative"),
        }
    }
}

impl Error for ScheduleValidationError {}
