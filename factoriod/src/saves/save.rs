//! The save-file model.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Suffix marking a backup copy of a save.
pub(crate) const BACKUP_SUFFIX: &str = ".bak";

/// A saved game on disk.
///
/// Everything about a save derives from its path: the name is the filename
/// stem, backups are identified by suffix, and the modification time is
/// read live from the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Save {
    path: PathBuf,
}

impl Save {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The save's display name: the filename without its final extension
    /// (`save1.zip` -> `save1`; a backup `save1.zip.bak` -> `save1.zip`).
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether this file is a backup copy rather than a live save.
    pub fn is_backup(&self) -> bool {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(BACKUP_SUFFIX))
            .unwrap_or(false)
    }

    /// Last modification time, if the file exists and exposes one.
    pub fn last_write_time(&self) -> Option<DateTime<Utc>> {
        let modified = self.path.metadata().ok()?.modified().ok()?;
        Some(modified.into())
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl fmt::Display for Save {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_the_stem() {
        assert_eq!(Save::new("/saves/save1.zip").name(), "save1");
        assert_eq!(Save::new("/saves/midnight base.zip").name(), "midnight base");
    }

    #[test]
    fn test_backup_detection_and_name() {
        let backup = Save::new("/saves/save1.zip.bak");
        assert!(backup.is_backup());
        assert_eq!(backup.name(), "save1.zip");

        assert!(!Save::new("/saves/save1.zip").is_backup());
    }

    #[test]
    fn test_last_write_time_of_missing_file_is_none() {
        assert_eq!(Save::new("/nonexistent/save.zip").last_write_time(), None);
    }
}
