//! The player-controlled entity.
//!
//! Movement comes from outside (input is not the core's business): the
//! driver writes a velocity and the base update integrates it. The player is
//! also the natural carrier of power-ups, so it exposes the absolute
//! per-stack attribute setters that effect handlers call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorOptions, Damageable, SimEntity};
use crate::events::EventLog;
use crate::kind::EntityKind;

/// Tunables for a [`Player`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: u32,
    /// Movement speed in units/second before boosts.
    pub speed: f32,
    /// Speed added per `speed_boost` stack.
    pub speed_per_stack: f32,
    /// Max health added per `health_increase` stack.
    pub health_per_stack: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            speed: 120.0,
            speed_per_stack: 20.0,
            health_per_stack: 25,
        }
    }
}

/// The controllable entity. Speed and health ceiling are derived from its
/// [`PlayerConfig`] and the current power-up stack counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    actor: Actor,
    config: PlayerConfig,
    speed: f32,
}

impl Player {
    /// An idle player at full health.
    pub fn new(position: Vec2, config: PlayerConfig) -> Self {
        let actor = Actor::new(
            EntityKind::Player,
            position,
            ActorOptions {
                max_health: config.max_health,
                ..Default::default()
            },
        );
        Self {
            actor,
            speed: config.speed,
            config,
        }
    }

    /// Current movement speed, boosts included.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Speed with no boosts applied.
    pub fn base_speed(&self) -> f32 {
        self.config.speed
    }

    /// Health ceiling with no boosts applied.
    pub fn base_max_health(&self) -> u32 {
        self.config.max_health
    }

    /// Steer along `direction` at the current speed. A zero direction stops.
    pub fn move_towards(&mut self, direction: Vec2) -> bool {
        let velocity = direction.normalize_or_zero() * self.speed;
        self.actor.set_velocity(velocity)
    }

    /// Set speed for `stacks` boosts. Absolute, so re-applying the same count
    /// is idempotent and `0` restores the base.
    pub fn set_speed_stacks(&mut self, stacks: u32) {
        self.speed = self.config.speed + self.config.speed_per_stack * stacks as f32;
        // Keep an in-flight move consistent with the new speed.
        let heading = self.actor.velocity().normalize_or_zero();
        if heading != Vec2::ZERO {
            self.actor.set_velocity(heading * self.speed);
        }
    }

    /// Set the health ceiling for `stacks` boosts. `0` restores the base.
    pub fn set_max_health_stacks(&mut self, stacks: u32) {
        let max = self
            .config
            .max_health
            .saturating_add(self.config.health_per_stack.saturating_mul(stacks));
        self.actor.set_max_health(max);
    }
}

impl SimEntity for Player {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }
}

impl Damageable for Player {
    fn take_damage(&mut self, amount: u32, events: &mut EventLog) {
        self.receive_damage(amount, events);
    }
}
