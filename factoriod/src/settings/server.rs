//! The `server-settings.json` model.

use serde::{Deserialize, Serialize};

/// Settings passed to the binary via `--server-settings`.
///
/// Field names match the file's snake_case keys one to one. Every field has
/// a default so a generated file is complete enough for the binary to start
/// a LAN-visible, unpublished server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Maximum players; 0 means unlimited.
    pub max_players: u32,
    pub visibility: Visibility,
    pub username: String,
    pub password: String,
    pub token: String,
    pub game_password: String,
    pub require_user_verification: bool,
    pub max_upload_in_kilobytes_per_second: u32,
    pub max_upload_slots: u32,
    pub minimum_latency_in_ticks: u32,
    pub ignore_player_limit_for_returning_players: bool,
    pub allow_commands: String,
    /// Autosave interval in minutes.
    pub autosave_interval: u32,
    pub autosave_slots: u32,
    /// Kick players AFK for this many minutes; 0 disables the kick.
    pub afk_autokick_interval: u32,
    pub auto_pause: bool,
    pub only_admins_can_pause_the_game: bool,
    pub autosave_only_on_server: bool,
    pub non_blocking_saving: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: "factoriod server".to_string(),
            description: "A Factorio server managed by factoriod".to_string(),
            tags: Vec::new(),
            max_players: 0,
            visibility: Visibility::default(),
            username: String::new(),
            password: String::new(),
            token: String::new(),
            game_password: String::new(),
            require_user_verification: true,
            max_upload_in_kilobytes_per_second: 0,
            max_upload_slots: 5,
            minimum_latency_in_ticks: 0,
            ignore_player_limit_for_returning_players: false,
            allow_commands: "admins-only".to_string(),
            autosave_interval: 10,
            autosave_slots: 5,
            afk_autokick_interval: 0,
            auto_pause: true,
            only_admins_can_pause_the_game: true,
            autosave_only_on_server: true,
            non_blocking_saving: false,
        }
    }
}

/// Where the server advertises itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visibility {
    /// Publish to the public matching server. Requires credentials.
    pub public: bool,
    /// Broadcast on the local network.
    pub lan: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            public: false,
            lan: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys_are_snake_case() {
        let json = serde_json::to_value(ServerSettings::default()).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("max_players"));
        assert!(object.contains_key("require_user_verification"));
        assert!(object["visibility"].as_object().unwrap().contains_key("lan"));
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let settings: ServerSettings =
            serde_json::from_str(r#"{"name": "midnight base", "max_players": 8}"#).unwrap();
        assert_eq!(settings.name, "midnight base");
        assert_eq!(settings.max_players, 8);
        // untouched keys keep their defaults
        assert_eq!(settings.autosave_interval, 10);
        assert!(settings.visibility.lan);
    }
}
