//! Skirmish core -- entities, enemy AI and combat for a frame-driven 2D game.
//!
//! Every entity is a variant composed over a shared [`Actor`](actor::Actor)
//! record (position, velocity, health, lifecycle state) and dispatched through
//! the [`SimEntity`](actor::SimEntity) trait. Entities reference each other
//! only through generational [`EntityHandle`](handle::EntityHandle)s resolved
//! by the [`World`](world::World), so a removed entity can never be reached
//! through a stale target.
//!
//! Observable side effects go into an [`EventLog`](events::EventLog) supplied
//! by the caller.
//!
//! # Quick Start
//!
//! ```
//! use skirmish_core::prelude::*;
//! use glam::Vec2;
//!
//! let mut world = World::new();
//! let player = world.spawn(Player::new(Vec2::ZERO, PlayerConfig::default()));
//! let enemy = world.spawn(EnemyAgent::new(Vec2::new(75.0, 0.0), &EnemyConfig::default()));
//!
//! let mut events = EventLog::new();
//! let ctx = world.context();
//! let agent = world.get_mut(enemy).and_then(Entity::as_enemy_mut).unwrap();
//! agent.update_ai(1.0 / 60.0, &ctx, &mut events);
//!
//! assert_eq!(agent.ai_state(), AiState::Chasing);
//! assert_eq!(agent.target(), Some(player));
//! ```

#![deny(unsafe_code)]

pub mod actor;
pub mod enemy;
pub mod events;
pub mod handle;
pub mod kind;
pub mod player;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The handle's entity was despawned (or never existed).
    #[error("entity {entity:?} does not exist (stale or never spawned)")]
    StaleEntity { entity: handle::EntityHandle },

    /// The entity has no damage capability (walls, obstacles).
    #[error("entity {entity:?} ({kind}) cannot take damage")]
    NotDamageable {
        entity: handle::EntityHandle,
        kind: kind::EntityKind,
    },

    /// An enemy-only operation was invoked on something else.
    #[error("entity {entity:?} is a {kind}, not an enemy")]
    NotAnEnemy {
        entity: handle::EntityHandle,
        kind: kind::EntityKind,
    },

    /// Both sides of a pairwise operation are the same entity.
    #[error("entity {entity:?} cannot interact with itself")]
    SelfInteraction { entity: handle::EntityHandle },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::actor::{Actor, ActorOptions, Damageable, EntityView, Prop, SimEntity};
    pub use crate::enemy::{EnemyAgent, EnemyConfig, WorldContext, DEFAULT_CHASE_SPEED};
    pub use crate::events::{EventLog, SimEvent};
    pub use crate::handle::{EntityHandle, HandleAllocator};
    pub use crate::kind::{AiState, EntityKind, LifecycleState};
    pub use crate::player::{Player, PlayerConfig};
    pub use crate::world::{Entity, World, WorldSnapshot};
    pub use crate::CoreError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use glam::Vec2;

    #[test]
    fn enemy_kills_player_through_the_registry() {
        let mut world = World::new();
        let player = world.spawn(Player::new(Vec2::ZERO, PlayerConfig::default()));
        let enemy = world.spawn(EnemyAgent::new(Vec2::new(10.0, 0.0), &EnemyConfig::default()));
        let mut events = EventLog::new();

        for _ in 0..12 {
            let (attacker, target) = world.pair_mut(enemy, player).unwrap();
            let agent = attacker.as_enemy_mut().unwrap();
            let victim = target.as_damageable_mut().unwrap();
            agent.attack(player, victim, &mut events);
        }

        let p = world.get(player).unwrap();
        assert_eq!(p.actor().health(), 0);
        assert_eq!(p.actor().state(), LifecycleState::Dead);
        assert_eq!(events.deaths().collect::<Vec<_>>(), vec![player]);
    }

    #[test]
    fn dead_enemy_ai_is_frozen_in_world() {
        let mut world = World::new();
        world.spawn(Player::new(Vec2::ZERO, PlayerConfig::default()));
        let enemy = world.spawn(EnemyAgent::new(Vec2::new(100.0, 0.0), &EnemyConfig::default()));
        let mut events = EventLog::new();

        let ctx = world.context();
        let agent = world.get_mut(enemy).and_then(Entity::as_enemy_mut).unwrap();
        agent.update_ai(0.1, &ctx, &mut events);
        assert_eq!(agent.ai_state(), AiState::Chasing);
        agent.kill(&mut events);

        let frozen = agent.clone();
        for _ in 0..5 {
            agent.update_ai(0.1, &WorldContext::default(), &mut events);
        }
        assert_eq!(agent.ai_state(), frozen.ai_state());
        assert_eq!(agent.target(), frozen.target());
        assert_eq!(agent.actor().velocity(), frozen.actor().velocity());
        assert_eq!(agent.actor().position(), frozen.actor().position());
    }
}
