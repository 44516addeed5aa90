//! Save resolution, selection, and backup.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::error::{SaveError, SaveResult};
use super::save::{Save, BACKUP_SUFFIX};

/// Name of the pointer file recording the currently selected save.
const POINTER_FILE: &str = "current-save";

/// Default filename for a synthesized first save.
const DEFAULT_SAVE_NAME: &str = "save1.zip";

/// Creates a save file through the game binary's map-creation mode.
///
/// Kept behind a trait so save selection logic can be exercised without a
/// real install; the production implementation lives with the supervisor's
/// process launcher.
#[async_trait]
pub trait SaveFactory: Send + Sync {
    /// Create a new save at `path` using the install at `install_dir`.
    async fn create_save(&self, install_dir: &Path, path: &Path) -> SaveResult<()>;
}

/// Manages the saves directory and the current-save pointer.
#[derive(Debug, Clone)]
pub struct SaveManager {
    root: PathBuf,
}

impl SaveManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the current-save pointer.
    ///
    /// An unset pointer or a pointer whose target has vanished yields
    /// `None` — absence is self-healing here, never an error.
    pub fn current_save(&self) -> Option<Save> {
        let contents = fs::read_to_string(self.pointer_path()).ok()?;
        let name = contents.trim();
        if name.is_empty() {
            return None;
        }

        let save = Save::new(self.root.join(name));
        if save.exists() {
            Some(save)
        } else {
            debug!(target = name, "current-save pointer target is missing");
            None
        }
    }

    /// Point the current-save indirection at `save`.
    ///
    /// Idempotent; fails only when `save` itself does not exist. The pointer
    /// file is replaced atomically so a crash never leaves a torn pointer.
    pub fn set_current_save(&self, save: &Save) -> SaveResult<()> {
        if !save.exists() {
            return Err(SaveError::NotFound {
                path: save.path().to_path_buf(),
            });
        }

        let file_name = save
            .path()
            .file_name()
            .ok_or_else(|| SaveError::NotFound {
                path: save.path().to_path_buf(),
            })?
            .to_string_lossy()
            .into_owned();

        self.ensure_root()?;
        let pointer = self.pointer_path();
        let tmp = pointer.with_extension("tmp");
        fs::write(&tmp, format!("{}\n", file_name)).map_err(|source| SaveError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &pointer).map_err(|source| SaveError::Io {
            path: pointer,
            source,
        })?;

        info!(save = %save.name(), "current save set");
        Ok(())
    }

    /// List saves ordered by last-write-time descending.
    pub fn list_saves(&self, include_backups: bool) -> SaveResult<Vec<Save>> {
        self.ensure_root()?;

        let entries = fs::read_dir(&self.root).map_err(|source| SaveError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut saves = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if name == POINTER_FILE || name.ends_with(".tmp") {
                continue;
            }

            let save = Save::new(path);
            if save.is_backup() && !include_backups {
                continue;
            }
            saves.push(save);
        }

        saves.sort_by_key(|save| std::cmp::Reverse(save.last_write_time()));
        Ok(saves)
    }

    /// Resolve the save to run, creating one when none exists.
    ///
    /// Resolution order: the current-save pointer; else the most recently
    /// modified save on disk (adopted as current); else a fresh default save
    /// created through `factory` and adopted.
    pub async fn select_or_create(
        &self,
        install_dir: &Path,
        factory: &dyn SaveFactory,
    ) -> SaveResult<Save> {
        if let Some(save) = self.current_save() {
            debug!(save = %save.name(), "using current save");
            return Ok(save);
        }

        if let Some(newest) = self.list_saves(false)?.into_iter().next() {
            info!(save = %newest.name(), "adopting most recently modified save");
            self.set_current_save(&newest)?;
            return Ok(newest);
        }

        self.create_save(install_dir, DEFAULT_SAVE_NAME, false, factory)
            .await
    }

    /// Create a named save through the binary and adopt it as current.
    ///
    /// `name` may be given with or without the `.zip` extension. Refuses to
    /// replace an existing save unless `overwrite` is set.
    pub async fn create_save(
        &self,
        install_dir: &Path,
        name: &str,
        overwrite: bool,
        factory: &dyn SaveFactory,
    ) -> SaveResult<Save> {
        self.ensure_root()?;

        let file_name = if name.ends_with(".zip") {
            name.to_string()
        } else {
            format!("{}.zip", name)
        };
        let path = self.root.join(file_name);

        if path.exists() && !overwrite {
            return Err(SaveError::AlreadyExists { path });
        }

        info!(path = %path.display(), "creating save");
        factory.create_save(install_dir, &path).await?;

        let save = Save::new(&path);
        if !save.exists() {
            return Err(SaveError::CreationFailed {
                path,
                reason: "map creation reported success but produced no file".to_string(),
            });
        }

        self.set_current_save(&save)?;
        Ok(save)
    }

    /// Copy `save` to its backup name, overwriting any prior backup.
    ///
    /// Run before every server start so a save corrupted in play can be
    /// recovered; callers treat failure as log-worthy, not fatal.
    pub fn backup(&self, save: &Save) -> SaveResult<Save> {
        if !save.exists() {
            return Err(SaveError::NotFound {
                path: save.path().to_path_buf(),
            });
        }

        let file_name = save
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup_path = save
            .path()
            .with_file_name(format!("{}{}", file_name, BACKUP_SUFFIX));

        fs::copy(save.path(), &backup_path).map_err(|source| SaveError::Io {
            path: backup_path.clone(),
            source,
        })?;

        debug!(backup = %backup_path.display(), "save backed up");
        Ok(Save::new(backup_path))
    }

    /// Backup that only logs on failure, for use on the launch path.
    pub fn backup_best_effort(&self, save: &Save) {
        if let Err(e) = self.backup(save) {
            warn!(save = %save.name(), error = %e, "could not back up save");
        }
    }

    fn pointer_path(&self) -> PathBuf {
        self.root.join(POINTER_FILE)
    }

    fn ensure_root(&self) -> SaveResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| SaveError::Io {
            path: self.root.clone(),
            source,
        })
    }
}
