//! File-backed record storage.
//!
//! # Responsibility
//! - Persist one homogeneous, ordered collection of records per file.
//! - Keep the in-memory cache and on-disk contents identical after every
//!   successful mutation.
//! - Notify a non-owning observer after durable deletions.
//!
//! # Invariants
//! - Every write replaces the whole file atomically (temp file + rename).
//! - The cache is only swapped after the write that produced it succeeded.
//! - A missing backing file reads as an empty collection.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod codec;
mod file;
pub mod observer;
pub mod record_store;

pub use observer::{ArchiveObserver, ChangeObserver};
pub use record_store::{Record, RecordStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage error for record file load/save operations.
#[derive(Debug)]
pub enum StoreError {
    /// The collection could not be serialized.
    Encode(bincode::error::EncodeError),
    /// The backing file exists but its bytes are not a record collection.
    Decode { path: PathBuf, reason: String },
    /// The backing file exists but could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The temp file could not be written or renamed over the target.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Persisting the collection after a removal failed.
    Delete {
        index: usize,
        source: Box<StoreError>,
    },
    IndexOutOfBounds {
        index: usize,
        len: usize,
    },
    UnsupportedFormatVersion {
        found: u32,
        latest_supported: u32,
    },
    InvalidFilename(String),
    /// The encoded collection exceeds the readable file size.
    TooLarge {
        bytes: usize,
        limit: usize,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode records: {err}"),
            Self::Decode { path, reason } => write!(
                f,
                "failed to decode record file `{}`: {reason}",
                path.display()
            ),
            Self::Read { path, source } => {
                write!(f, "failed to read record file `{}`: {source}", path.display())
            }
            Self::Write { path, source } => {
                write!(f, "failed to write record file `{}`: {source}", path.display())
            }
            Self::Delete { index, source } => {
                write!(f, "failed to persist deletion at index {index}: {source}")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} is out of bounds for {len} records")
            }
            Self::UnsupportedFormatVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "record file format version {found} is newer than supported {latest_supported}"
            ),
            Self::InvalidFilename(value) => write!(f, "invalid record filename: `{value}`"),
            Self::TooLarge { bytes, limit } => write!(
                f,
                "encoded records take {bytes} bytes; the record file limit is {limit}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Read { source, .. } => Some(source),
            Self::Write { source, .. } => Some(source),
            Self::Delete { source, .. } => Some(source.as_ref()),
            Self::Decode { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::UnsupportedFormatVersion { .. }
            | Self::InvalidFilename(_)
            | Self::TooLarge { .. } => None,
        }
    }
}

impl From<bincode::error::EncodeError> for StoreError {
    fn from(value: bincode::error::EncodeError) -> Self {
        Self::Encode(value)
    }
}

impl StoreError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "encode_failed",
            Self::Decode { .. } => "decode_failed",
            Self::Read { .. } => "read_failed",
            Self::Write { .. } => "write_failed",
            Self::Delete { .. } => "delete_failed",
            Self::IndexOutOfBounds { .. } => "index_out_of_bounds",
            Self::UnsupportedFormatVersion { .. } => "unsupported_format_version",
            Self::InvalidFilename(_) => "invalid_filename",
            Self::TooLarge { .. } => "too_large",
        }
    }
}
