//! Map generation and map behavior settings models.
//!
//! These are written to temp files and handed to the binary's map-creation
//! mode via `--map-gen-settings` / `--map-settings`. The binary fills in
//! anything omitted, so the models only carry the keys operators commonly
//! tune, each with the game's own default value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Frequency/size/richness triple used by every autoplace control.
///
/// `1.0` is the game's "normal" for each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencySizeRichness {
    pub frequency: f64,
    pub size: f64,
    pub richness: f64,
}

impl Default for FrequencySizeRichness {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            size: 1.0,
            richness: 1.0,
        }
    }
}

/// The `map-gen-settings.json` model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapGenSettings {
    pub terrain_segmentation: f64,
    pub water: f64,
    /// Map width in tiles; 0 means unlimited.
    pub width: u32,
    /// Map height in tiles; 0 means unlimited.
    pub height: u32,
    pub starting_area: f64,
    pub peaceful_mode: bool,
    /// Per-resource tuning, keyed by the game's kebab-case prototype names.
    pub autoplace_controls: BTreeMap<String, FrequencySizeRichness>,
    pub cliff_settings: CliffSettings,
}

impl Default for MapGenSettings {
    fn default() -> Self {
        let autoplace_controls = [
            "coal",
            "copper-ore",
            "crude-oil",
            "enemy-base",
            "iron-ore",
            "stone",
            "trees",
            "uranium-ore",
        ]
        .into_iter()
        .map(|name| (name.to_string(), FrequencySizeRichness::default()))
        .collect();

        Self {
            terrain_segmentation: 1.0,
            water: 1.0,
            width: 0,
            height: 0,
            starting_area: 1.0,
            peaceful_mode: false,
            autoplace_controls,
            cliff_settings: CliffSettings::default(),
        }
    }
}

/// Cliff placement tuning inside [`MapGenSettings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliffSettings {
    pub name: String,
    pub cliff_elevation_0: f64,
    pub cliff_elevation_interval: f64,
    pub richness: f64,
}

impl Default for CliffSettings {
    fn default() -> Self {
        Self {
            name: "cliff".to_string(),
            cliff_elevation_0: 10.0,
            cliff_elevation_interval: 40.0,
            richness: 1.0,
        }
    }
}

/// The `map-settings.json` model.
///
/// Carried opaquely: the daemon never interprets these values, it only
/// guarantees a complete default object exists to hand to the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MapSettings {
    pub difficulty_settings: DifficultySettings,
    pub pollution: PollutionSettings,
    pub enemy_evolution: EnemyEvolutionSettings,
    pub enemy_expansion: EnemyExpansionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultySettings {
    pub recipe_difficulty: u32,
    pub technology_difficulty: u32,
    pub technology_price_multiplier: f64,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            recipe_difficulty: 0,
            technology_difficulty: 0,
            technology_price_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollutionSettings {
    pub enabled: bool,
    pub ageing: f64,
    pub diffusion_ratio: f64,
    pub min_to_diffuse: f64,
}

impl Default for PollutionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ageing: 1.0,
            diffusion_ratio: 0.02,
            min_to_diffuse: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyEvolutionSettings {
    pub enabled: bool,
    pub time_factor: f64,
    pub destroy_factor: f64,
    pub pollution_factor: f64,
}

impl Default for EnemyEvolutionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            time_factor: 0.000_004,
            destroy_factor: 0.002,
            pollution_factor: 0.000_000_9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyExpansionSettings {
    pub enabled: bool,
    pub min_expansion_cooldown: u32,
    pub max_expansion_cooldown: u32,
}

impl Default for EnemyExpansionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_expansion_cooldown: 14_400,
            max_expansion_cooldown: 216_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autoplace_keys_are_kebab_case() {
        let settings = MapGenSettings::default();
        assert!(settings.autoplace_controls.contains_key("iron-ore"));
        assert!(settings.autoplace_controls.contains_key("copper-ore"));
        assert!(settings.autoplace_controls.contains_key("uranium-ore"));

        let json = serde_json::to_value(&settings).unwrap();
        let controls = json["autoplace_controls"].as_object().unwrap();
        assert!(controls.contains_key("crude-oil"));
    }

    #[test]
    fn test_partial_map_gen_merges_with_defaults() {
        let settings: MapGenSettings = serde_json::from_str(
            r#"{"water": 0.5, "autoplace_controls": {"iron-ore": {"richness": 2.0}}}"#,
        )
        .unwrap();
        assert_eq!(settings.water, 0.5);
        assert_eq!(settings.terrain_segmentation, 1.0);

        let iron = &settings.autoplace_controls["iron-ore"];
        assert_eq!(iron.richness, 2.0);
        // unspecified axes of a specified control still default
        assert_eq!(iron.frequency, 1.0);
    }

    #[test]
    fn test_map_settings_default_serializes() {
        let json = serde_json::to_value(MapSettings::default()).unwrap();
        assert!(json["pollution"]["enabled"].as_bool().unwrap());
        assert_eq!(json["difficulty_settings"]["recipe_difficulty"], 0);
    }
}
