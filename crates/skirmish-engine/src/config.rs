//! Simulation configuration.
//!
//! Every section deserializes with defaults, so a config file only needs the
//! values it changes:
//!
//! ```
//! use skirmish_engine::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "enemy": { "attack_radius": 40.0 } }"#).unwrap();
//! assert_eq!(config.enemy.attack_radius, 40.0);
//! assert_eq!(config.enemy.detection_radius, 150.0);
//! assert!(config.combat.attack_interval.is_none());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::enemy::EnemyConfig;
use skirmish_core::player::PlayerConfig;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Rejected or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("fixed_dt must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidRadius { name: &'static str, value: f32 },

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidSpeed { name: &'static str, value: f32 },

    #[error("attack_interval must be positive and finite, got {0}")]
    InvalidInterval(f32),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Fixed-timestep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// 60 Hz.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

/// Driver-side combat pacing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// When set, an enemy in the attacking band strikes its target on entry
    /// and then once per interval (seconds). `None` leaves attacks entirely to
    /// the caller.
    pub attack_interval: Option<f32>,
}

/// Everything a [`Simulation`](crate::sim::Simulation) is tuned by.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tick: TickConfig,
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub combat: CombatConfig,
}

impl SimConfig {
    /// Parse and validate. Missing sections fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file, then [`validate`](Self::validate) it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the simulation cannot run with.
    ///
    /// An attack radius larger than the detection radius is allowed (the
    /// chase band is then empty) but logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.tick.fixed_dt;
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(ConfigError::InvalidTimestep(dt));
        }

        let radii = [
            ("detection_radius", self.enemy.detection_radius),
            ("attack_radius", self.enemy.attack_radius),
        ];
        for (name, value) in radii {
            if !non_negative(value) {
                return Err(ConfigError::InvalidRadius { name, value });
            }
        }

        let speeds = [
            ("enemy.chase_speed", self.enemy.chase_speed),
            ("enemy.speed_per_stack", self.enemy.speed_per_stack),
            ("player.speed", self.player.speed),
            ("player.speed_per_stack", self.player.speed_per_stack),
        ];
        for (name, value) in speeds {
            if !non_negative(value) {
                return Err(ConfigError::InvalidSpeed { name, value });
            }
        }

        if let Some(interval) = self.combat.attack_interval {
            if !(interval > 0.0 && interval.is_finite()) {
                return Err(ConfigError::InvalidInterval(interval));
            }
        }

        if self.enemy.attack_radius > self.enemy.detection_radius {
            tracing::warn!(
                attack_radius = self.enemy.attack_radius,
                detection_radius = self.enemy.detection_radius,
                "attack radius exceeds detection radius; enemies will never chase"
            );
        }
        Ok(())
    }
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn bad_timestep_rejected() {
        let mut config = SimConfig::default();
        config.tick.fixed_dt = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimestep(_))));
        config.tick.fixed_dt = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimestep(_))));
    }

    #[test]
    fn negative_radius_rejected() {
        let mut config = SimConfig::default();
        config.enemy.attack_radius = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRadius {
                name: "attack_radius",
                ..
            })
        ));
    }

    #[test]
    fn inverted_radii_are_only_a_warning() {
        let mut config = SimConfig::default();
        config.enemy.attack_radius = 200.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_rejected() {
        let json = r#"{ "combat": { "attack_interval": 0.0 } }"#;
        assert!(matches!(
            SimConfig::from_json_str(json),
            Err(ConfigError::InvalidInterval(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
