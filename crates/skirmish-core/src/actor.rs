//! The shared base record every entity variant is composed over, and the
//! capability traits the frame driver dispatches through.
//!
//! Variants ([`Player`](crate::player::Player),
//! [`EnemyAgent`](crate::enemy::EnemyAgent), [`Prop`]) embed an [`Actor`]
//! and implement [`SimEntity`]. The provided trait methods carry the base
//! behaviour; a variant overrides only the hooks it extends.
//!
//! # Death
//!
//! Health reaching zero runs [`SimEntity::on_death`] exactly once. After that
//! the actor is frozen: [`Actor::integrate`], [`Actor::set_velocity`] and
//! [`Actor::set_state`] are no-ops, and further damage is ignored.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::events::{EventLog, SimEvent};
use crate::handle::EntityHandle;
use crate::kind::{EntityKind, LifecycleState};

// ---------------------------------------------------------------------------
// ActorOptions
// ---------------------------------------------------------------------------

/// Construction options for an [`Actor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorOptions {
    pub velocity: Vec2,
    pub max_health: u32,
    /// Starting health; `None` means full. Clamped to `max_health`.
    pub health: Option<u32>,
}

impl Default for ActorOptions {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            max_health: 100,
            health: None,
        }
    }
}

// ---------------------------------------------------------------------------
// EntityView
// ---------------------------------------------------------------------------

/// Read-only snapshot of another entity, handed to collision hooks and AI.
///
/// Holding a view never borrows the entity it describes, so it is safe to
/// pass while the receiver is being mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    pub handle: EntityHandle,
    pub kind: EntityKind,
    pub position: Vec2,
    pub lifecycle: LifecycleState,
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Position, velocity, health and lifecycle state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    handle: EntityHandle,
    kind: EntityKind,
    position: Vec2,
    velocity: Vec2,
    health: u32,
    max_health: u32,
    state: LifecycleState,
    /// Seconds spent in the current lifecycle state.
    state_time: f32,
}

impl Actor {
    /// A living actor in the `Idle` state, not yet bound to a world slot.
    pub fn new(kind: EntityKind, position: Vec2, options: ActorOptions) -> Self {
        let health = options.health.unwrap_or(options.max_health).min(options.max_health);
        Self {
            handle: EntityHandle::UNBOUND,
            kind,
            position,
            velocity: options.velocity,
            health,
            max_health: options.max_health,
            state: LifecycleState::Idle,
            state_time: 0.0,
        }
    }

    /// Called by the world when the owning entity is spawned.
    pub(crate) fn bind(&mut self, handle: EntityHandle) {
        self.handle = handle;
    }

    /// Registry handle, [`EntityHandle::UNBOUND`] until spawned.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Collision category, fixed at construction.
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Current position in world units.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity in units per second.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current health, never above [`Actor::max_health`].
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Health ceiling.
    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Lifecycle state driving animation.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Seconds since the last real lifecycle change.
    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// `true` once the death transition has run. Terminal.
    pub fn is_dead(&self) -> bool {
        self.state.is_dead()
    }

    /// Snapshot for collision hooks and AI contexts.
    pub fn view(&self) -> EntityView {
        EntityView {
            handle: self.handle,
            kind: self.kind.clone(),
            position: self.position,
            lifecycle: self.state,
        }
    }

    /// Euclidean distance to a point.
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Per-frame integration: `position += velocity * dt`.
    pub fn integrate(&mut self, dt: f32) {
        if self.is_dead() {
            return;
        }
        self.position += self.velocity * dt;
        self.state_time += dt;
    }

    /// Returns `false` (and leaves velocity untouched) once dead.
    pub fn set_velocity(&mut self, velocity: Vec2) -> bool {
        if self.is_dead() {
            return false;
        }
        self.velocity = velocity;
        true
    }

    /// Teleport. Ignored once dead.
    pub fn set_position(&mut self, position: Vec2) -> bool {
        if self.is_dead() {
            return false;
        }
        self.position = position;
        true
    }

    /// Switch between the living states. Re-entering the current state keeps
    /// the animation clock running.
    ///
    /// `Dead` is refused here: death has to go through [`SimEntity::kill`] so
    /// the variant's [`SimEntity::on_death`] hook runs.
    pub fn set_state(&mut self, state: LifecycleState) -> bool {
        if self.is_dead() {
            return false;
        }
        if state.is_dead() {
            tracing::debug!(entity = %self.handle, "refusing direct Dead transition, use kill()");
            return false;
        }
        if self.state != state {
            tracing::trace!(entity = %self.handle, from = %self.state, to = %state, "lifecycle");
            self.state = state;
            self.state_time = 0.0;
        }
        true
    }

    /// Subtract `amount` (saturating). Returns `true` when this call brought a
    /// living actor to zero health, i.e. the death hook must run.
    pub fn apply_damage(&mut self, amount: u32, events: &mut EventLog) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        events.push(SimEvent::Damaged {
            entity: self.handle,
            amount,
            remaining: self.health,
        });
        self.health == 0
    }

    /// Base death transition. Returns `false` if the actor was already dead.
    pub fn mark_dead(&mut self, events: &mut EventLog) -> bool {
        if self.is_dead() {
            return false;
        }
        self.state = LifecycleState::Dead;
        self.state_time = 0.0;
        tracing::info!(entity = %self.handle, kind = %self.kind, "entity died");
        events.push(SimEvent::Died {
            entity: self.handle,
        });
        true
    }

    /// Replace the health ceiling. A raised ceiling heals by the same amount
    /// (the dead stay at zero); a lowered one clamps current health.
    pub fn set_max_health(&mut self, max_health: u32) {
        if max_health > self.max_health && !self.is_dead() {
            let gained = max_health - self.max_health;
            self.health = self.health.saturating_add(gained);
        }
        self.max_health = max_health;
        self.health = self.health.min(self.max_health);
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Per-frame behaviour shared by every entity variant.
pub trait SimEntity {
    fn actor(&self) -> &Actor;

    fn actor_mut(&mut self) -> &mut Actor;

    /// Physics/animation step. Safe to call after death.
    fn update(&mut self, dt: f32, _events: &mut EventLog) {
        self.actor_mut().integrate(dt);
    }

    /// Collision reaction. The base record does nothing.
    fn handle_collision(&mut self, _other: &EntityView, _events: &mut EventLog) {}

    /// Runs once, when health reaches zero or the entity is killed.
    fn on_death(&mut self, events: &mut EventLog) {
        self.actor_mut().mark_dead(events);
    }

    /// Lifecycle change. `Dead` goes through [`SimEntity::kill`] so the
    /// variant's death hook fires.
    fn set_state(&mut self, state: LifecycleState, events: &mut EventLog) {
        if state.is_dead() {
            self.kill(events);
        } else {
            self.actor_mut().set_state(state);
        }
    }

    /// Force death from outside (despawn zones, scripted kills).
    fn kill(&mut self, events: &mut EventLog) {
        if !self.actor().is_dead() {
            self.on_death(events);
        }
    }

    /// Damage pipeline for variants that are [`Damageable`].
    fn receive_damage(&mut self, amount: u32, events: &mut EventLog) {
        if self.actor_mut().apply_damage(amount, events) {
            self.on_death(events);
        }
    }
}

/// Anything that accepts damage. Walls and obstacles do not.
pub trait Damageable: SimEntity {
    /// Apply `amount` damage, running the death hook if health hits zero.
    fn take_damage(&mut self, amount: u32, events: &mut EventLog);

    /// Whether a hit would land right now. Dead entities ignore damage.
    fn accepts_damage(&self) -> bool {
        !self.actor().is_dead()
    }
}

// ---------------------------------------------------------------------------
// Prop
// ---------------------------------------------------------------------------

/// Static environment piece (wall, obstacle, decoration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    actor: Actor,
}

impl Prop {
    /// A full-health prop of `kind` at `position`.
    pub fn new(kind: EntityKind, position: Vec2) -> Self {
        Self {
            actor: Actor::new(kind, position, ActorOptions::default()),
        }
    }
}

impl SimEntity for Prop {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal damageable variant for exercising the provided methods.
    struct Dummy {
        actor: Actor,
        deaths: u32,
    }

    impl Dummy {
        fn new(max_health: u32) -> Self {
            Self {
                actor: Actor::new(
                    EntityKind::Other("dummy".to_owned()),
                    Vec2::ZERO,
                    ActorOptions {
                        max_health,
                        ..Default::default()
                    },
                ),
                deaths: 0,
            }
        }
    }

    impl SimEntity for Dummy {
        fn actor(&self) -> &Actor {
            &self.actor
        }
        fn actor_mut(&mut self) -> &mut Actor {
            &mut self.actor
        }
        fn on_death(&mut self, events: &mut EventLog) {
            self.deaths += 1;
            self.actor.mark_dead(events);
        }
    }

    impl Damageable for Dummy {
        fn take_damage(&mut self, amount: u32, events: &mut EventLog) {
            self.receive_damage(amount, events);
        }
    }

    #[test]
    fn update_integrates_velocity() {
        let mut actor = Actor::new(
            EntityKind::Enemy,
            Vec2::new(1.0, 2.0),
            ActorOptions {
                velocity: Vec2::new(10.0, -4.0),
                ..Default::default()
            },
        );
        actor.integrate(0.5);
        assert_eq!(actor.position(), Vec2::new(6.0, 0.0));
        assert_eq!(actor.state_time(), 0.5);
    }

    #[test]
    fn starting_health_is_clamped() {
        let actor = Actor::new(
            EntityKind::Player,
            Vec2::ZERO,
            ActorOptions {
                max_health: 50,
                health: Some(80),
                ..Default::default()
            },
        );
        assert_eq!(actor.health(), 50);
    }

    #[test]
    fn overkill_clamps_at_zero_and_dies_once() {
        let mut dummy = Dummy::new(20);
        let mut events = EventLog::new();
        dummy.take_damage(15, &mut events);
        assert_eq!(dummy.actor().health(), 5);
        dummy.take_damage(100, &mut events);
        assert_eq!(dummy.actor().health(), 0);
        dummy.take_damage(7, &mut events);
        dummy.kill(&mut events);

        assert_eq!(dummy.deaths, 1);
        assert_eq!(events.deaths().count(), 1);
        assert!(dummy.actor().is_dead());
    }

    #[test]
    fn dead_actor_is_frozen() {
        let mut dummy = Dummy::new(1);
        let mut events = EventLog::new();
        dummy.actor_mut().set_velocity(Vec2::new(3.0, 0.0));
        dummy.take_damage(1, &mut events);

        let before = dummy.actor().clone();
        dummy.update(1.0, &mut events);
        assert!(!dummy.actor_mut().set_velocity(Vec2::ONE));
        dummy.set_state(LifecycleState::Moving, &mut events);
        assert_eq!(dummy.actor(), &before);
    }

    #[test]
    fn setting_dead_runs_the_variant_hook() {
        let mut dummy = Dummy::new(10);
        let mut events = EventLog::new();
        dummy.set_state(LifecycleState::Dead, &mut events);
        dummy.set_state(LifecycleState::Dead, &mut events);
        assert_eq!(dummy.deaths, 1);
        assert_eq!(dummy.actor().health(), 10, "forced death leaves health alone");
    }

    #[test]
    fn state_clock_resets_only_on_real_change() {
        let mut actor = Actor::new(EntityKind::Enemy, Vec2::ZERO, ActorOptions::default());
        actor.integrate(1.0);
        actor.set_state(LifecycleState::Idle);
        assert_eq!(actor.state_time(), 1.0);
        actor.set_state(LifecycleState::Moving);
        assert_eq!(actor.state_time(), 0.0);
    }

    #[test]
    fn actor_refuses_dead_so_the_hook_cannot_be_skipped() {
        let mut dummy = Dummy::new(10);
        let mut events = EventLog::new();
        assert!(!dummy.actor_mut().set_state(LifecycleState::Dead));
        assert_eq!(dummy.actor().state(), LifecycleState::Idle);
        assert_eq!(dummy.deaths, 0);

        dummy.kill(&mut events);
        assert_eq!(dummy.deaths, 1);
        assert!(dummy.actor().is_dead());
    }

    #[test]
    fn raising_max_health_heals_lowering_clamps() {
        let mut actor = Actor::new(
            EntityKind::Player,
            Vec2::ZERO,
            ActorOptions {
                max_health: 100,
                health: Some(60),
                ..Default::default()
            },
        );
        actor.set_max_health(125);
        assert_eq!((actor.health(), actor.max_health()), (85, 125));
        actor.set_max_health(70);
        assert_eq!((actor.health(), actor.max_health()), (70, 70));
    }

    #[test]
    fn prop_collision_is_a_no_op() {
        let mut wall = Prop::new(EntityKind::Wall, Vec2::new(5.0, 5.0));
        let other = Prop::new(EntityKind::Enemy, Vec2::ZERO);
        let mut events = EventLog::new();
        let before = wall.clone();
        wall.handle_collision(&other.actor().view(), &mut events);
        assert_eq!(wall, before);
        assert!(events.is_empty());
    }
}
