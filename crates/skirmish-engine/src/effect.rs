//! Stackable effects (power-ups) and the attribute capability they act on.
//!
//! An effect is an inert descriptor: a kind tag and a stack ceiling. It holds
//! no timers and no per-application state; repeated pickups are counted as
//! stacks by the [`EffectManager`](crate::manager::EffectManager), never as
//! separate instances.
//!
//! Targets expose attribute setters through [`EffectTarget`]. Every setter
//! takes the *absolute* stack count, so applying level `n` twice is the same
//! as applying it once and `0` restores the baseline. A target that lacks a
//! setter reports [`EffectError::MissingCapability`] and the caller degrades.

use std::fmt;

use serde::{Deserialize, Serialize};
use skirmish_core::actor::Prop;
use skirmish_core::enemy::EnemyAgent;
use skirmish_core::player::Player;
use skirmish_core::world::Entity;

/// Kind tag of the built-in movement-speed effect.
pub const SPEED_BOOST: &str = "speed_boost";
/// Kind tag of the built-in max-health effect.
pub const HEALTH_INCREASE: &str = "health_increase";

// ---------------------------------------------------------------------------
// EffectError
// ---------------------------------------------------------------------------

/// Why a handler could not change its target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    /// The target has no setter for the attribute an effect modifies.
    #[error("target does not support `{capability}`")]
    MissingCapability { capability: &'static str },
}

// ---------------------------------------------------------------------------
// EffectTarget
// ---------------------------------------------------------------------------

/// Attribute setters an effect handler may call. Defaults report the
/// capability as missing.
pub trait EffectTarget {
    fn update_speed(&mut self, _stacks: u32) -> Result<(), EffectError> {
        Err(EffectError::MissingCapability {
            capability: "update_speed",
        })
    }

    fn update_max_health(&mut self, _stacks: u32) -> Result<(), EffectError> {
        Err(EffectError::MissingCapability {
            capability: "update_max_health",
        })
    }
}

impl EffectTarget for Player {
    fn update_speed(&mut self, stacks: u32) -> Result<(), EffectError> {
        self.set_speed_stacks(stacks);
        Ok(())
    }

    fn update_max_health(&mut self, stacks: u32) -> Result<(), EffectError> {
        self.set_max_health_stacks(stacks);
        Ok(())
    }
}

/// Enemies can be hasted but their health pool is fixed.
impl EffectTarget for EnemyAgent {
    fn update_speed(&mut self, stacks: u32) -> Result<(), EffectError> {
        self.set_speed_stacks(stacks);
        Ok(())
    }
}

impl EffectTarget for Prop {}

impl EffectTarget for Entity {
    fn update_speed(&mut self, stacks: u32) -> Result<(), EffectError> {
        match self {
            Entity::Player(p) => p.update_speed(stacks),
            Entity::Enemy(e) => e.update_speed(stacks),
            Entity::Prop(p) => p.update_speed(stacks),
        }
    }

    fn update_max_health(&mut self, stacks: u32) -> Result<(), EffectError> {
        match self {
            Entity::Player(p) => p.update_max_health(stacks),
            Entity::Enemy(e) => e.update_max_health(stacks),
            Entity::Prop(p) => p.update_max_health(stacks),
        }
    }
}

// ---------------------------------------------------------------------------
// StackableEffect
// ---------------------------------------------------------------------------

/// A kind of effect and how it behaves when no built-in handler claims it.
pub trait StackableEffect: fmt::Debug {
    /// Key shared with the manager's active set.
    fn kind(&self) -> &str;

    /// Stack ceiling, at least 1.
    fn max_stacks(&self) -> u32;

    /// Fallback activation for kinds without a built-in handler. Runs once,
    /// on the first stack.
    fn apply(&self, _target: &mut dyn EffectTarget) {
        tracing::debug!(kind = self.kind(), "effect has no behaviour of its own");
    }

    /// Undo whatever [`StackableEffect::apply`] did.
    fn reset(&self, _target: &mut dyn EffectTarget) {}
}

// ---------------------------------------------------------------------------
// Powerup
// ---------------------------------------------------------------------------

/// Plain data effect, e.g. loaded from a level file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Powerup {
    kind: String,
    max_stacks: u32,
}

impl Powerup {
    /// A power-up of `kind` that stacks up to `max_stacks` times.
    pub fn new(kind: impl Into<String>, max_stacks: u32) -> Self {
        Self {
            kind: kind.into(),
            max_stacks: max_stacks.max(1),
        }
    }

    /// [`SPEED_BOOST`] with the given cap.
    pub fn speed_boost(max_stacks: u32) -> Self {
        Self::new(SPEED_BOOST, max_stacks)
    }

    /// [`HEALTH_INCREASE`] with the given cap.
    pub fn health_increase(max_stacks: u32) -> Self {
        Self::new(HEALTH_INCREASE, max_stacks)
    }
}

impl StackableEffect for Powerup {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn max_stacks(&self) -> u32 {
        self.max_stacks.max(1)
    }
}
