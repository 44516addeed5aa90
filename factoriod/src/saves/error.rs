//! Error types for save management.

use std::io;
use std::path::PathBuf;

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Errors that can occur while managing save files.
#[derive(Debug)]
pub enum SaveError {
    /// The referenced save file does not exist.
    NotFound { path: PathBuf },

    /// Creating a save would overwrite an existing one.
    AlreadyExists { path: PathBuf },

    /// The binary's map-creation mode failed to produce a save.
    CreationFailed { path: PathBuf, reason: String },

    /// Filesystem failure.
    Io { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "save not found: {}", path.display()),
            Self::AlreadyExists { path } => {
                write!(f, "save already exists: {}", path.display())
            }
            Self::CreationFailed { path, reason } => {
                write!(f, "failed to create save {}: {}", path.display(), reason)
            }
            Self::Io { path, source } => {
                write!(f, "save file operation on {} failed: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
