//! Skirmish engine -- stackable effects and the fixed-timestep frame driver.
//!
//! This crate builds on [`skirmish_core`] to provide the per-entity
//! [`EffectManager`](manager::EffectManager), the [`Simulation`](sim::Simulation)
//! that runs bodies, enemy AI and effect hooks in a fixed order each tick, and
//! the JSON-backed [`SimConfig`](config::SimConfig).
//!
//! # Quick Start
//!
//! ```
//! use glam::Vec2;
//! use skirmish_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! let player = sim.spawn_player(Vec2::ZERO);
//! sim.spawn_enemy(Vec2::new(20.0, 0.0));
//!
//! for _ in 0..4 {
//!     sim.add_effect(player, Powerup::speed_boost(3)).unwrap();
//! }
//! assert_eq!(sim.effect_stacks(player, SPEED_BOOST), Some(3));
//!
//! sim.run_ticks(100);
//! assert_eq!(sim.tick_count(), 100);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod effect;
pub mod manager;
pub mod sim;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use skirmish_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use skirmish_core::prelude::*;

    pub use crate::config::{CombatConfig, ConfigError, SimConfig, TickConfig};
    pub use crate::effect::{
        EffectError, EffectTarget, Powerup, StackableEffect, HEALTH_INCREASE, SPEED_BOOST,
    };
    pub use crate::manager::{AttributeHandler, EffectManager};
    pub use crate::sim::{FrameDiagnostics, Simulation};
}
