//! Building the binary's command lines.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::FactorioConfig;
use crate::saves::{Save, SaveError, SaveFactory, SaveResult};
use crate::settings::{ensure_empty_list, read_or_default, write_pretty, MapGenSettings, MapSettings};

use super::error::SupervisorResult;

/// A fully resolved invocation of the server binary.
///
/// Kept as data rather than a live `Command` so argument construction is
/// inspectable in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl LaunchPlan {
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

/// Build the `--start-server` invocation for `save`.
///
/// Flags carrying a path are only added when the file or directory exists —
/// with the exception of the ban/admin lists, which are created as empty
/// JSON arrays first so the binary does not write its own copies elsewhere.
pub(crate) fn build_server_plan(
    config: &FactorioConfig,
    install_dir: &Path,
    save: &Save,
) -> SupervisorResult<LaunchPlan> {
    let mut args: Vec<OsString> = vec!["--start-server".into(), save.path().into()];

    add_server_settings(config, &mut args);

    let files = &config.files;
    if push_if_file(&mut args, "--server-whitelist", &files.server_whitelist_path) {
        args.push("--use-server-whitelist".into());
    }

    ensure_empty_list(&files.server_banlist_path)?;
    ensure_empty_list(&files.server_adminlist_path)?;
    push_if_file(&mut args, "--server-banlist", &files.server_banlist_path);
    push_if_file(&mut args, "--server-adminlist", &files.server_adminlist_path);

    push_if_dir(&mut args, "--mod-directory", &files.mods_directory);

    Ok(LaunchPlan {
        program: config.executable.executable_in(install_dir),
        args,
        cwd: install_dir.to_path_buf(),
    })
}

fn add_server_settings(config: &FactorioConfig, args: &mut Vec<OsString>) {
    let path = &config.files.server_settings_path;
    if !push_if_file(args, "--server-settings", path) {
        info!("no server settings file found, the binary will use its defaults");
        return;
    }

    // Purely informational: name the game being hosted in the daemon log.
    if let Ok(contents) = std::fs::read_to_string(path) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&contents) {
            info!(
                name = value["name"].as_str().unwrap_or(""),
                description = value["description"].as_str().unwrap_or(""),
                "hosting game"
            );
        }
    }
}

fn push_if_file(args: &mut Vec<OsString>, flag: &str, path: &Path) -> bool {
    if path.is_file() {
        args.push(flag.into());
        args.push(path.into());
        true
    } else {
        false
    }
}

fn push_if_dir(args: &mut Vec<OsString>, flag: &str, path: &Path) -> bool {
    if path.is_dir() {
        args.push(flag.into());
        args.push(path.into());
        true
    } else {
        false
    }
}

/// Creates saves through the binary's `--create` mode.
///
/// Generation inputs are merged with defaults and written to a scratch
/// directory, so the binary always receives complete settings files even
/// when the operator wrote partial ones (or none at all).
pub struct MapCreator {
    config: FactorioConfig,
    map_gen_override: Option<MapGenSettings>,
}

impl MapCreator {
    pub fn new(config: FactorioConfig) -> Self {
        Self {
            config,
            map_gen_override: None,
        }
    }

    /// Use explicit generation settings instead of the configured file.
    pub fn with_map_gen_settings(mut self, settings: Option<MapGenSettings>) -> Self {
        self.map_gen_override = settings;
        self
    }

    fn scratch_dir(&self, save_path: &Path) -> PathBuf {
        let stem = save_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "save".to_string());
        std::env::temp_dir().join(format!("factoriod-mapgen-{}-{}", std::process::id(), stem))
    }
}

#[async_trait]
impl SaveFactory for MapCreator {
    async fn create_save(&self, install_dir: &Path, path: &Path) -> SaveResult<()> {
        let generation = &self.config.map_generation;

        let map_gen: MapGenSettings = match &self.map_gen_override {
            Some(settings) => settings.clone(),
            None => read_or_default(&generation.map_gen_settings_path).map_err(|e| {
                SaveError::CreationFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?,
        };
        let map_settings: MapSettings =
            read_or_default(&generation.map_settings_path).map_err(|e| {
                SaveError::CreationFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;

        let scratch = self.scratch_dir(path);
        let map_gen_path = scratch.join("map-gen-settings.json");
        let map_settings_path = scratch.join("map-settings.json");
        for (file, write) in [
            (&map_gen_path, write_pretty(&map_gen_path, &map_gen)),
            (
                &map_settings_path,
                write_pretty(&map_settings_path, &map_settings),
            ),
        ] {
            write.map_err(|e| SaveError::CreationFailed {
                path: file.clone(),
                reason: e.to_string(),
            })?;
        }

        let executable = self.config.executable.executable_in(install_dir);
        let mut command = Command::new(&executable);
        command
            .arg("--create")
            .arg(path)
            .arg("--map-gen-settings")
            .arg(&map_gen_path)
            .arg("--map-settings")
            .arg(&map_settings_path)
            .current_dir(install_dir)
            .stdin(Stdio::null());

        if let Some(seed) = generation.map_gen_seed {
            command.arg("--map-gen-seed").arg(seed.to_string());
        }

        debug!(save = %path.display(), "running map creation");
        let output = command
            .output()
            .await
            .map_err(|e| SaveError::CreationFailed {
                path: path.to_path_buf(),
                reason: format!("failed to run {}: {}", executable.display(), e),
            })?;

        tokio::fs::remove_dir_all(&scratch).await.ok();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SaveError::CreationFailed {
                path: path.to_path_buf(),
                reason: format!("map creation exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExecutableConfig, GameFilesConfig, SavesConfig};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn config_in(temp: &TempDir) -> FactorioConfig {
        let root = temp.path();
        FactorioConfig {
            executable: ExecutableConfig {
                downloads_directory: root.join("downloads"),
                updates_directory: root.join("updates"),
                ..Default::default()
            },
            files: GameFilesConfig {
                server_settings_path: root.join("config/server-settings.json"),
                server_whitelist_path: root.join("config/server-whitelist.json"),
                server_banlist_path: root.join("config/server-banlist.json"),
                server_adminlist_path: root.join("config/server-adminlist.json"),
                mods_directory: root.join("mods"),
            },
            saves: SavesConfig {
                root_directory: root.join("saves"),
            },
            ..Default::default()
        }
    }

    fn arg_strings(plan: &LaunchPlan) -> Vec<String> {
        plan.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_plan_always_starts_the_save() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let install_dir = temp.path().join("downloads/factorio");
        let save = Save::new(temp.path().join("saves/save1.zip"));

        let plan = build_server_plan(&config, &install_dir, &save).unwrap();
        let args = arg_strings(&plan);

        assert_eq!(args[0], "--start-server");
        assert!(args[1].ends_with("save1.zip"));
        assert_eq!(plan.program, install_dir.join("bin/x64/factorio"));
        assert_eq!(plan.cwd, install_dir);
    }

    #[test]
    fn test_missing_optional_files_are_omitted() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let save = Save::new(temp.path().join("saves/save1.zip"));

        let plan = build_server_plan(&config, temp.path(), &save).unwrap();
        let args = arg_strings(&plan);

        assert!(!args.contains(&"--server-settings".to_string()));
        assert!(!args.contains(&"--server-whitelist".to_string()));
        assert!(!args.contains(&"--use-server-whitelist".to_string()));
        assert!(!args.contains(&"--mod-directory".to_string()));
    }

    #[test]
    fn test_ban_and_admin_lists_are_created_as_empty_arrays() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let save = Save::new(temp.path().join("saves/save1.zip"));

        let plan = build_server_plan(&config, temp.path(), &save).unwrap();
        let args = arg_strings(&plan);

        assert!(args.contains(&"--server-banlist".to_string()));
        assert!(args.contains(&"--server-adminlist".to_string()));
        assert_eq!(
            fs::read_to_string(&config.files.server_banlist_path)
                .unwrap()
                .trim(),
            "[]"
        );
    }

    #[test]
    fn test_whitelist_brings_its_use_flag() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        fs::create_dir_all(temp.path().join("config")).unwrap();
        fs::write(&config.files.server_whitelist_path, "[]").unwrap();
        fs::create_dir_all(&config.files.mods_directory).unwrap();
        let save = Save::new(temp.path().join("saves/save1.zip"));

        let plan = build_server_plan(&config, temp.path(), &save).unwrap();
        let args = arg_strings(&plan);

        assert!(args.contains(&"--server-whitelist".to_string()));
        assert!(args.contains(&"--use-server-whitelist".to_string()));
        assert!(args.contains(&"--mod-directory".to_string()));
    }

    #[tokio::test]
    async fn test_map_creator_passes_generated_settings() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.map_generation.map_gen_seed = Some(42);

        // fake binary that records its arguments and creates the save
        let install_dir = temp.path().join("downloads/factorio");
        let bin_dir = install_dir.join("bin/x64");
        fs::create_dir_all(&bin_dir).unwrap();
        let script = bin_dir.join("factorio");
        fs::write(
            &script,
            "#!/bin/sh\necho \"$@\" > args.txt\ntouch \"$2\"\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        fs::create_dir_all(temp.path().join("saves")).unwrap();
        let save_path = temp.path().join("saves/save1.zip");

        let creator = MapCreator::new(config);
        creator.create_save(&install_dir, &save_path).await.unwrap();

        assert!(save_path.exists());
        let args = fs::read_to_string(install_dir.join("args.txt")).unwrap();
        assert!(args.starts_with("--create"));
        assert!(args.contains("--map-gen-settings"));
        assert!(args.contains("--map-settings"));
        assert!(args.contains("--map-gen-seed 42"));
    }

    #[tokio::test]
    async fn test_map_creator_surfaces_binary_failure() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);

        let install_dir = temp.path().join("downloads/factorio");
        let bin_dir = install_dir.join("bin/x64");
        fs::create_dir_all(&bin_dir).unwrap();
        let script = bin_dir.join("factorio");
        fs::write(&script, "#!/bin/sh\necho 'out of disk' >&2\nexit 1\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let creator = MapCreator::new(config);
        let result = creator
            .create_save(&install_dir, &temp.path().join("saves/save1.zip"))
            .await;

        match result {
            Err(SaveError::CreationFailed { reason, .. }) => {
                assert!(reason.contains("out of disk"));
            }
            other => panic!("expected CreationFailed, got {:?}", other),
        }
    }
}
