use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};
use crate::grid::TileId;
use crate::level::{AdversarySpec, Campaign, Level};
use crate::powerup::PowerupSelector;

/// Simulation tuning shared by every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks per second
    pub fps: u32,
    /// Tile edge length in position units
    pub tile_size: i32,
    /// Actor movement per tick in position units
    pub actor_speed: i32,
    /// Adversary movement per tick on each axis
    pub adversary_speed: i32,
    /// Ticks between two steps of a spreading trail hit
    pub propagation_interval: u32,
    pub effect_duration_secs: u32,
    /// Upper bound of the random wait before a power item appears
    pub max_spawn_delay_secs: u32,
}

impl SimConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(1000 / self.fps.max(1) as u64)
    }

    pub fn effect_duration_ticks(&self) -> u32 {
        self.effect_duration_secs * self.fps
    }

    /// Agents must spend at least one whole tick in every tile they cross,
    /// otherwise the trail laid behind the actor would have gaps.
    pub fn validate(&self) -> Result<(), LoadError> {
        let invalid = |reason: &str| -> Result<(), LoadError> {
            Err(LoadError::InvalidSimConfig(reason.to_string()))
        };
        if self.fps == 0 {
            return invalid("fps must be positive");
        }
        if self.tile_size < 2 || self.tile_size % 2 != 0 {
            return invalid("tile_size must be even and at least 2");
        }
        if self.actor_speed <= 0 || self.adversary_speed <= 0 {
            return invalid("speeds must be positive");
        }
        if self.tile_size < 2 * self.actor_speed.max(self.adversary_speed) {
            return invalid("tile_size must be at least twice the fastest speed");
        }
        if self.propagation_interval == 0 {
            return invalid("propagation_interval must be positive");
        }
        if self.max_spawn_delay_secs == 0 {
            return invalid("max_spawn_delay_secs must be positive");
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            tile_size: 20,
            actor_speed: 2,
            adversary_speed: 2,
            propagation_interval: 3,
            effect_duration_secs: 10,
            max_spawn_delay_secs: 10,
        }
    }
}

fn default_lives() -> i32 {
    3
}

/// Campaign file as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_lives")]
    pub lives: i32,
    pub levels: Vec<LevelConfig>,
    #[serde(default)]
    pub sim: SimConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Map file, relative to the campaign file
    #[serde(alias = "outlay")]
    pub layout: PathBuf,
    pub goal: f64,
    #[serde(default)]
    pub powerup: PowerupSelector,
    #[serde(default)]
    pub enemies: Vec<AdversarySpec>,
    #[serde(default)]
    pub start: Option<[usize; 2]>,
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a campaign file and the map files it names.
    pub fn load(path: impl AsRef<Path>) -> Result<(Campaign, SimConfig), ConfigError> {
        let path = path.as_ref();
        let config = Self::from_json(&read(path)?)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let sim = config.sim.clone();
        sim.validate()?;
        Ok((config.into_campaign(base)?, sim))
    }

    pub fn into_campaign(self, base: &Path) -> Result<Campaign, ConfigError> {
        if self.levels.is_empty() {
            return Err(LoadError::NoLevels.into());
        }
        let levels = self
            .levels
            .into_iter()
            .map(|level| -> Result<Level, ConfigError> {
                let map = read(&base.join(&level.layout))?;
                let start = level
                    .start
                    .map_or(TileId::new(0, 0), |[row, col]| TileId::new(row, col));
                Ok(Level {
                    map,
                    goal: level.goal,
                    powerup: level.powerup,
                    adversaries: level.enemies,
                    start,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Campaign {
            lives: self.lives,
            levels,
        })
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AdversaryKind;
    use crate::powerup::EffectKind;

    #[test]
    fn test_default_config() {
        let sim = SimConfig::default();
        assert_eq!(sim.fps, 60);
        assert_eq!(sim.tick_duration(), Duration::from_millis(16));
        assert_eq!(sim.effect_duration_ticks(), 600);
        assert!(sim.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_fast_agents() {
        let sim = SimConfig {
            adversary_speed: 11,
            ..Default::default()
        };
        assert!(matches!(sim.validate(), Err(LoadError::InvalidSimConfig(_))));

        let sim = SimConfig {
            tile_size: 21,
            ..Default::default()
        };
        assert!(sim.validate().is_err());
    }

    #[test]
    fn test_parse_accepts_historical_names() {
        let config = GameConfig::from_json(
            r#"{
                "levels": [{
                    "outlay": "one.txt",
                    "goal": 0.75,
                    "powerup": "ZAWARUDO",
                    "enemies": [
                        { "kind": "worm", "spawn": "random" },
                        { "kind": "beetle", "spawn": "3,4" }
                    ]
                }],
                "sim": { "fps": 30 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.lives, 3);
        assert_eq!(config.sim.fps, 30);
        assert_eq!(config.sim.tile_size, 20);
        let level = &config.levels[0];
        assert_eq!(level.layout, PathBuf::from("one.txt"));
        assert_eq!(level.powerup, PowerupSelector::Fixed(EffectKind::TimeFreeze));
        assert_eq!(level.enemies[0].kind, AdversaryKind::Plain);
        assert_eq!(level.enemies[1].kind, AdversaryKind::Destructive);
        assert_eq!(level.enemies[1].spawn, "3,4");
        assert_eq!(level.start, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            GameConfig::from_json("{ \"levels\": 3 }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_resolves_layouts_next_to_campaign() {
        let dir = std::env::temp_dir().join(format!("turfwar-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("one.txt"), "XXXX\nX  X\nXXXX\n").unwrap();
        fs::write(
            dir.join("campaign.json"),
            r#"{ "lives": 2, "levels": [{ "layout": "one.txt", "goal": 0.5, "start": [0, 1] }] }"#,
        )
        .unwrap();

        let (campaign, sim) = GameConfig::load(dir.join("campaign.json")).unwrap();
        assert_eq!(campaign.lives, 2);
        assert_eq!(campaign.levels[0].start, TileId::new(0, 1));
        assert!(campaign.levels[0].map.starts_with("XXXX"));
        assert_eq!(sim, SimConfig::default());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_reports_missing_layout() {
        let config = GameConfig::from_json(
            r#"{ "levels": [{ "layout": "does-not-exist.txt", "goal": 0.5 }] }"#,
        )
        .unwrap();
        let err = config.into_campaign(Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
