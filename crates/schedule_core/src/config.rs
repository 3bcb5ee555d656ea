//! Storage location configuration.
//!
//! # Responsibility
//! - Resolve record file names against an injected base directory.
//! - Reject file names that could escape that directory.
//!
//! # Invariants
//! - `base_dir` is always absolute.
//! - Resolved paths are direct children of `base_dir`.

use crate::store::{StoreError, StoreResult};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Backing file of the pending schedule list.
pub const ACTIVE_SCHEDULES_FILE: &str = "schedules.store";
/// Backing file of the completed schedule archive.
pub const COMPLETED_SCHEDULES_FILE: &str = "completed_schedules.store";

/// Configuration errors for storage layout setup.
#[derive(Debug)]
pub enum ConfigError {
    EmptyBaseDir,
    RelativeBaseDir(PathBuf),
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBaseDir => write!(f, "storage base directory cannot be empty"),
            Self::RelativeBaseDir(path) => write!(
                f,
                "storage base directory must be an absolute path, got `{}`",
                path.display()
            ),
            Self::CreateDir { path, source } => write!(
                f,
                "failed to create storage directory `{}`: {source}",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::EmptyBaseDir | Self::RelativeBaseDir(_) => None,
        }
    }
}

/// Directory that holds every record file of one application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    base_dir: PathBuf,
}

impl StorageLayout {
    /// Creates a layout rooted at `base_dir`.
    ///
    /// # Errors
    /// - Returns an error when `base_dir` is empty or not absolute.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base_dir = base_dir.as_ref();
        if base_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBaseDir);
        }
        if !base_dir.is_absolute() {
            return Err(ConfigError::RelativeBaseDir(base_dir.to_path_buf()));
        }
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Creates the base directory (and parents) when missing.
    pub fn ensure_base_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.base_dir).map_err(|source| ConfigError::CreateDir {
            path: self.base_dir.clone(),
            source,
        })
    }

    /// Resolves `filename` to a file directly inside the base directory.
    pub fn path_for(&self, filename: &str) -> StoreResult<PathBuf> {
        if !is_plain_filename(filename) {
            return Err(StoreError::InvalidFilename(filename.to_string()));
        }
        Ok(self.base_dir.join(filename))
    }
}

fn is_plain_filename(value: &str) -> bool {
    !value.trim().is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\', '\0'])
}
