//! Match configuration
//!
//! Table geometry, physics tuning, rack layout and automation settings.
//! Loaded from a JSON file; every section falls back to defaults.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::TableGeometry;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Physics tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fraction of velocity lost on every cushion or ball contact
    pub collision_loss: f32,
    /// Fraction of velocity lost to the cloth every tick
    pub friction: f32,
    /// Integration step per tick
    pub dt: f32,
    /// Speed below which a ball stops
    pub min_velocity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            collision_loss: COLLISION_LOSS,
            friction: FRICTION,
            dt: SIM_DT,
            min_velocity: BALL_MIN_VELOCITY,
        }
    }
}

/// Starting ball positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RackLayout {
    /// Cue ball start and re-spot position
    pub cue_ball: Vec2,
    pub eight_ball: Vec2,
    pub reds: Vec<Vec2>,
    pub yellows: Vec<Vec2>,
}

impl Default for RackLayout {
    fn default() -> Self {
        // Triangle with its apex toward the cue ball: columns 34px apart,
        // balls 39px apart within a column
        Self {
            cue_ball: Vec2::new(413.0, 413.0),
            eight_ball: Vec2::new(1090.0, 413.0),
            reds: vec![
                Vec2::new(1056.0, 432.5),
                Vec2::new(1090.0, 374.0),
                Vec2::new(1124.0, 393.5),
                Vec2::new(1124.0, 471.5),
                Vec2::new(1158.0, 335.0),
                Vec2::new(1158.0, 374.0),
                Vec2::new(1158.0, 452.0),
            ],
            yellows: vec![
                Vec2::new(1022.0, 413.0),
                Vec2::new(1056.0, 393.5),
                Vec2::new(1090.0, 452.0),
                Vec2::new(1124.0, 354.5),
                Vec2::new(1124.0, 432.5),
                Vec2::new(1158.0, 413.0),
                Vec2::new(1158.0, 491.0),
            ],
        }
    }
}

/// Automated shot decision settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Player indices whose turns are decided by the shot decision service
    pub players: Vec<usize>,
    pub min_power: f32,
    pub max_power: f32,
    /// Max random deviation from the line to the target (radians)
    pub aim_jitter: f32,
    /// Seed for the built-in planner
    pub seed: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            players: vec![0, 1],
            min_power: MIN_SHOT_POWER,
            max_power: MAX_SHOT_POWER,
            aim_jitter: 0.05,
            seed: 12345,
        }
    }
}

impl AutomationConfig {
    pub fn controls(&self, player: usize) -> bool {
        self.players.contains(&player)
    }
}

/// Occupancy grid submitted to the correlation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    /// Area covered by the grid (pixels)
    pub width: f32,
    pub height: f32,
    /// Cell value marking a ball
    pub occupied: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 37,
            width: 1423.0,
            height: 762.0,
            occupied: 255,
        }
    }
}

/// Complete match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub table: TableGeometry,
    pub physics: PhysicsConfig,
    pub rack: RackLayout,
    /// Ticks between a shot and the stick disappearing
    pub stick_hide_delay_ticks: u32,
    pub automation: AutomationConfig,
    pub grid: GridConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            table: TableGeometry::default(),
            physics: PhysicsConfig::default(),
            rack: RackLayout::default(),
            stick_hide_delay_ticks: STICK_HIDE_DELAY_TICKS,
            automation: AutomationConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Config with no automated players (every shot comes from input)
    pub fn manual() -> Self {
        let mut config = Self::default();
        config.automation.players.clear();
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.ball_diameter <= 0.0 {
            return Err(ConfigError::Invalid("ball diameter must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.physics.collision_loss) {
            return Err(ConfigError::Invalid(format!(
                "collision loss {} outside [0, 1)",
                self.physics.collision_loss
            )));
        }
        if !(0.0..1.0).contains(&self.physics.friction) {
            return Err(ConfigError::Invalid(format!(
                "friction {} outside [0, 1)",
                self.physics.friction
            )));
        }
        if self.table.pockets.is_empty() {
            return Err(ConfigError::Invalid("table has no pockets".into()));
        }
        if self.rack.reds.len() != 7 || self.rack.yellows.len() != 7 {
            return Err(ConfigError::Invalid(format!(
                "rack needs 7 reds and 7 yellows, got {} and {}",
                self.rack.reds.len(),
                self.rack.yellows.len()
            )));
        }
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(ConfigError::Invalid("grid must have cells".into()));
        }
        if self.automation.min_power > self.automation.max_power {
            return Err(ConfigError::Invalid("min power exceeds max power".into()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Load from `path`, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Config saved to {}", path.as_ref().display());
        Ok(())
    }
}
