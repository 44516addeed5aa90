//! Error types for supervision.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::acquire::AcquireError;
use crate::catalog::CatalogError;
use crate::saves::SaveError;
use crate::settings::SettingsError;
use crate::version::ParseVersionError;

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Errors that abort a run attempt or reject an operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The requested version could not be determined.
    #[error("could not determine a version to run: {0}")]
    VersionResolution(#[from] CatalogError),

    /// The configured version string is not a version.
    #[error("configured version is invalid: {0}")]
    InvalidVersion(#[from] ParseVersionError),

    /// No install could be materialized for the requested version.
    #[error("could not materialize an install: {0}")]
    Acquire(#[from] AcquireError),

    /// No save could be resolved or created.
    #[error("could not resolve a save: {0}")]
    Save(#[from] SaveError),

    /// A settings file needed for launch was unusable.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The server binary could not be spawned.
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn { program: PathBuf, source: io::Error },

    /// A compound operation needed the run stopped, but it outlived the
    /// deadline.
    #[error("the active run did not stop within the deadline")]
    StopTimedOut,

    /// Waiting on the child process failed.
    #[error("failed waiting on the server process: {0}")]
    Wait(#[from] io::Error),
}
