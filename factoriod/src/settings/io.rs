//! Settings file reading and writing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Result type for settings file operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors from reading or writing a settings file.
#[derive(Debug)]
pub enum SettingsError {
    /// Failed to read a file.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// The file exists but is not valid JSON for the expected shape.
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::Malformed { path, source } => {
                write!(f, "malformed settings file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::Malformed { source, .. } => Some(source),
        }
    }
}

/// Read a JSON settings file, producing the default object when the file
/// does not exist.
///
/// This is deliberately the only place where a missing settings file turns
/// into defaults. A file that exists but fails to parse is an error, never
/// silently replaced.
pub fn read_or_default<T>(path: &Path) -> SettingsResult<T>
where
    T: DeserializeOwned + Default,
{
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file absent, using defaults");
            return Ok(T::default());
        }
        Err(source) => {
            return Err(SettingsError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents).map_err(|source| SettingsError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a settings value as pretty-printed JSON, atomically.
///
/// Writes to `<path>.tmp` then renames over the destination, so readers
/// never observe a partially written file.
pub fn write_pretty<T: Serialize>(path: &Path, value: &T) -> SettingsResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SettingsError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let contents = serde_json::to_string_pretty(value).map_err(|source| {
        SettingsError::Malformed {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).map_err(|source| SettingsError::WriteFailed {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| SettingsError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Create an empty JSON array file if nothing exists at `path`.
///
/// The binary writes its ban/admin lists into its own data directory when
/// the files it was pointed at do not exist; pre-creating empty lists keeps
/// them where the daemon expects them.
pub fn ensure_empty_list(path: &Path) -> SettingsResult<()> {
    if path.exists() {
        return Ok(());
    }

    debug!(path = %path.display(), "creating empty list file");
    write_pretty(path, &serde_json::json!([]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ServerSettings;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_file_yields_default() {
        let temp = TempDir::new().unwrap();
        let settings: ServerSettings =
            read_or_default(&temp.path().join("server-settings.json")).unwrap();
        assert_eq!(settings, ServerSettings::default());
    }

    #[test]
    fn test_read_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("server-settings.json");
        fs::write(&path, "{not json").unwrap();

        let result: SettingsResult<ServerSettings> = read_or_default(&path);
        assert!(matches!(result, Err(SettingsError::Malformed { .. })));
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("server-settings.json");

        let mut settings = ServerSettings::default();
        settings.name = "round trip".to_string();
        write_pretty(&path, &settings).unwrap();

        let read: ServerSettings = read_or_default(&path).unwrap();
        assert_eq!(read.name, "round trip");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_ensure_empty_list_creates_and_preserves() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("banlist.json");

        ensure_empty_list(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");

        fs::write(&path, r#"["griefer"]"#).unwrap();
        ensure_empty_list(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"["griefer"]"#);
    }
}
