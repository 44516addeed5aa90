//! Save listing for operators.

use std::process::ExitCode;

use factoriod::config::FactorioConfig;
use factoriod::saves::SaveManager;

pub fn execute(config: &FactorioConfig, include_backups: bool) -> ExitCode {
    let manager = SaveManager::new(&config.saves.root_directory);

    let saves = match manager.list_saves(include_backups) {
        Ok(saves) => saves,
        Err(e) => {
            eprintln!("could not list saves: {}", e);
            return ExitCode::from(2);
        }
    };

    if saves.is_empty() {
        println!("no saves in {}", config.saves.root_directory.display());
        return ExitCode::SUCCESS;
    }

    let current = manager.current_save();
    for save in saves {
        let marker = if Some(&save) == current.as_ref() { "*" } else { " " };
        let kind = if save.is_backup() { " (backup)" } else { "" };
        let modified = save
            .last_write_time()
            .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{} {}  {}{}", marker, modified, save.name(), kind);
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use factoriod::config::SavesConfig;

    #[test]
    fn test_empty_saves_directory_lists_cleanly() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = FactorioConfig {
            saves: SavesConfig {
                root_directory: temp.path().join("saves"),
            },
            ..Default::default()
        };

        // listing an empty (not yet created) root succeeds and creates it
        execute(&config, false);
        execute(&config, true);
        assert!(config.saves.root_directory.is_dir());
    }
}
