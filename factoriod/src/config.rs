//! Daemon configuration.
//!
//! One JSON file describes everything the daemon needs to operate a server:
//! where installs and saves live, which version to run, which settings files
//! to hand to the binary, and how to reach the remote console. Every path
//! has a default rooted under the platform data directory so a fresh
//! install runs with an empty config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::acquire::RELEASE_DIR_NAME;
use crate::settings::{read_or_default, SettingsResult};

/// Top-level daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FactorioConfig {
    pub executable: ExecutableConfig,
    pub files: GameFilesConfig,
    pub saves: SavesConfig,
    pub map_generation: MapGenerationConfig,
    pub rcon: RconConfig,
}

impl FactorioConfig {
    /// Load configuration from `path`, defaulting everything the file does
    /// not mention. A missing file yields the full default configuration.
    /// Leading `~` in operator-written paths is expanded.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let config: Self = read_or_default(path)?;
        Ok(config.expanded())
    }

    fn expanded(mut self) -> Self {
        for path in [
            &mut self.executable.downloads_directory,
            &mut self.executable.updates_directory,
            &mut self.files.server_settings_path,
            &mut self.files.server_whitelist_path,
            &mut self.files.server_banlist_path,
            &mut self.files.server_adminlist_path,
            &mut self.files.mods_directory,
            &mut self.saves.root_directory,
            &mut self.map_generation.map_gen_settings_path,
            &mut self.map_generation.map_settings_path,
        ] {
            *path = expand_tilde(path);
        }
        self
    }
}

/// Where the binary lives and which version is wanted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutableConfig {
    /// Root for downloads; the canonical install is
    /// `<downloads_directory>/factorio`.
    pub downloads_directory: PathBuf,

    /// Where incremental patch archives are staged.
    pub updates_directory: PathBuf,

    /// Path of the executable relative to the install directory.
    pub executable_path: PathBuf,

    /// Requested version: a literal like `"1.1.110"`, or `"latest"`.
    pub version: String,

    /// Resolve `"latest"` against the experimental channel too.
    pub use_experimental: bool,
}

impl ExecutableConfig {
    /// The canonical install directory.
    pub fn install_dir(&self) -> PathBuf {
        self.downloads_directory.join(RELEASE_DIR_NAME)
    }

    /// Full path of the executable inside `install_dir`.
    pub fn executable_in(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.executable_path)
    }
}

impl Default for ExecutableConfig {
    fn default() -> Self {
        Self {
            downloads_directory: data_dir().join("downloads"),
            updates_directory: data_dir().join("updates"),
            executable_path: PathBuf::from("bin/x64/factorio"),
            version: "latest".to_string(),
            use_experimental: false,
        }
    }
}

/// Settings and player-list files handed to the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameFilesConfig {
    pub server_settings_path: PathBuf,
    pub server_whitelist_path: PathBuf,
    pub server_banlist_path: PathBuf,
    pub server_adminlist_path: PathBuf,
    pub mods_directory: PathBuf,
}

impl Default for GameFilesConfig {
    fn default() -> Self {
        let config = data_dir().join("config");
        Self {
            server_settings_path: config.join("server-settings.json"),
            server_whitelist_path: config.join("server-whitelist.json"),
            server_banlist_path: config.join("server-banlist.json"),
            server_adminlist_path: config.join("server-adminlist.json"),
            mods_directory: data_dir().join("mods"),
        }
    }
}

/// Save file storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavesConfig {
    pub root_directory: PathBuf,
}

impl Default for SavesConfig {
    fn default() -> Self {
        Self {
            root_directory: data_dir().join("saves"),
        }
    }
}

/// Inputs for the binary's map-creation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapGenerationConfig {
    pub map_gen_settings_path: PathBuf,
    pub map_settings_path: PathBuf,
    pub map_gen_seed: Option<u64>,
}

impl Default for MapGenerationConfig {
    fn default() -> Self {
        let config = data_dir().join("config");
        Self {
            map_gen_settings_path: config.join("map-gen-settings.json"),
            map_settings_path: config.join("map-settings.json"),
            map_gen_seed: None,
        }
    }
}

/// Remote console endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RconConfig {
    pub address: String,
    /// Password for the console; the client stays unconfigured without one.
    pub password: Option<String>,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:27015".to_string(),
            password: None,
        }
    }
}

/// Expand a leading `~` to the user's home directory.
///
/// Operator-written config files commonly use `~/factorio/...`; everything
/// the daemon generates itself is already absolute.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(stripped),
        None => path.to_path_buf(),
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factoriod")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_file_is_fully_defaulted() {
        let temp = TempDir::new().unwrap();
        let config = FactorioConfig::load(&temp.path().join("config.json")).unwrap();
        assert_eq!(config.executable.version, "latest");
        assert!(!config.executable.use_experimental);
        assert_eq!(
            config.executable.executable_path,
            PathBuf::from("bin/x64/factorio")
        );
    }

    #[test]
    fn test_partial_config_merges_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"executable": {"version": "1.1.110"}, "rcon": {"address": "0.0.0.0:9999"}}"#,
        )
        .unwrap();

        let config = FactorioConfig::load(&path).unwrap();
        assert_eq!(config.executable.version, "1.1.110");
        assert_eq!(config.rcon.address, "0.0.0.0:9999");
        // unspecified sections keep their defaults
        assert_eq!(config.saves, SavesConfig::default());
    }

    #[test]
    fn test_install_dir_is_under_downloads() {
        let executable = ExecutableConfig {
            downloads_directory: PathBuf::from("/srv/downloads"),
            ..Default::default()
        };
        assert_eq!(
            executable.install_dir(),
            PathBuf::from("/srv/downloads/factorio")
        );
        assert_eq!(
            executable.executable_in(Path::new("/srv/downloads/factorio")),
            PathBuf::from("/srv/downloads/factorio/bin/x64/factorio")
        );
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(
            expand_tilde(Path::new("/absolute/path")),
            PathBuf::from("/absolute/path")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/saves")),
                home.join("saves")
            );
        }
    }

    #[test]
    fn test_load_expands_operator_tildes() {
        let Some(home) = dirs::home_dir() else {
            return;
        };

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"saves": {"root_directory": "~/factorio/saves"}}"#,
        )
        .unwrap();

        let config = FactorioConfig::load(&path).unwrap();
        assert_eq!(config.saves.root_directory, home.join("factorio/saves"));
    }
}
