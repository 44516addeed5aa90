//! Error types for release acquisition.

use std::io;
use std::path::PathBuf;

use crate::catalog::UpdateStep;

/// Result type for acquisition operations.
pub type AcquireResult<T> = Result<T, AcquireError>;

/// Errors that can occur while downloading or installing releases.
#[derive(Debug)]
pub enum AcquireError {
    /// Failed to download a file.
    DownloadFailed { url: String, reason: String },

    /// Failed to write a file or directory.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Archive extraction failed.
    ExtractionFailed { archive: PathBuf, reason: String },

    /// The updater API did not resolve a patch to exactly one package URL.
    PatchLinkFailed { step: UpdateStep, reason: String },

    /// The binary's self-update mode rejected a patch.
    PatchApplyFailed { step: UpdateStep, reason: String },
}

impl std::fmt::Display for AcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DownloadFailed { url, reason } => {
                write!(f, "failed to download {}: {}", url, reason)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::ExtractionFailed { archive, reason } => {
                write!(f, "failed to extract {}: {}", archive.display(), reason)
            }
            Self::PatchLinkFailed { step, reason } => {
                write!(f, "no usable download link for update {}: {}", step, reason)
            }
            Self::PatchApplyFailed { step, reason } => {
                write!(f, "failed to apply update {}: {}", step, reason)
            }
        }
    }
}

impl std::error::Error for AcquireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::FactorioVersion;

    #[test]
    fn test_patch_error_display_names_the_step() {
        let step = UpdateStep::new(
            FactorioVersion::new(1, 1, 100),
            FactorioVersion::new(1, 1, 101),
        );
        let err = AcquireError::PatchApplyFailed {
            step,
            reason: "exit code 1".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("1.1.100 -> 1.1.101"));
        assert!(message.contains("exit code 1"));
    }
}
