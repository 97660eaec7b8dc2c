//! Fixed-timestep frame driver.
//!
//! The [`Simulation`] owns the [`World`], one [`EffectManager`] per entity and
//! the frame's [`EventLog`]. Each [`tick`](Simulation::tick):
//!
//! 1. Base physics step for players and props.
//! 2. Enemy AI update (base step included) against a [`WorldContext`] built
//!    from the registry.
//! 3. Optional attack pacing, when [`CombatConfig::attack_interval`] is set.
//! 4. Effect manager hooks.
//! 5. Tick counter advances; buffered events are handed back.
//!
//! Entities are visited in slot order and nothing reads the wall clock, so the
//! same spawn sequence and the same calls produce the same
//! [`state_hash`](Simulation::state_hash) on every run.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use skirmish_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! let player = sim.spawn_player(Vec2::ZERO);
//! let enemy = sim.spawn_enemy(Vec2::new(100.0, 0.0));
//!
//! sim.add_effect(player, Powerup::speed_boost(3)).unwrap();
//! sim.tick();
//!
//! let agent = sim.world().get(enemy).and_then(Entity::as_enemy).unwrap();
//! assert_eq!(agent.ai_state(), AiState::Chasing);
//! assert_eq!(sim.effect_stacks(player, SPEED_BOOST), Some(1));
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use glam::Vec2;
use serde::Serialize;
use skirmish_core::actor::{Damageable, Prop, SimEntity};
use skirmish_core::enemy::EnemyAgent;
use skirmish_core::events::{EventLog, SimEvent};
use skirmish_core::handle::EntityHandle;
use skirmish_core::kind::{AiState, EntityKind};
use skirmish_core::player::Player;
use skirmish_core::world::{Entity, World, WorldSnapshot};
use skirmish_core::CoreError;

use crate::config::{CombatConfig, ConfigError, SimConfig};
use crate::effect::StackableEffect;
use crate::manager::{AttributeHandler, EffectManager};

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing and counters for the last tick.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Wall-clock time per phase, in execution order.
    pub phase_times: Vec<(&'static str, Duration)>,
    pub total_time: Duration,
    /// Enemies whose AI ran this tick.
    pub enemies_updated: usize,
    /// Attacks dealt by the pacer this tick.
    pub paced_attacks: usize,
    /// Events handed back by this tick.
    pub events: usize,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Fixed-step driver owning the world, one effect manager per entity and
/// the pending event log.
///
/// Each [`tick`](Self::tick) integrates bodies, runs enemy AI, paces
/// automatic attacks when [`CombatConfig::attack_interval`] is set, then
/// advances the effect managers.
pub struct Simulation {
    world: World,
    effects: BTreeMap<EntityHandle, EffectManager>,
    /// Handlers registered on every manager, current and future.
    extra_handlers: Vec<(String, AttributeHandler)>,
    events: EventLog,
    config: SimConfig,
    tick_counter: u64,
    fixed_dt: f64,
    /// Seconds until each attacking enemy may strike again.
    attack_clocks: BTreeMap<EntityHandle, f32>,
    last_diagnostics: FrameDiagnostics,
}

impl Simulation {
    /// An empty simulation. Fails if `config` does not validate.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: SimConfig) -> Self {
        Self {
            world: World::new(),
            effects: BTreeMap::new(),
            extra_handlers: Vec::new(),
            events: EventLog::new(),
            fixed_dt: config.tick.fixed_dt,
            config,
            tick_counter: 0,
            attack_clocks: BTreeMap::new(),
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    // -- spawning -----------------------------------------------------------

    /// Add any entity and give it an effect manager.
    pub fn spawn(&mut self, entity: impl Into<Entity>) -> EntityHandle {
        let handle = self.world.spawn(entity);
        let mut manager = EffectManager::new(handle);
        for (kind, handler) in &self.extra_handlers {
            manager.register_handler(kind.clone(), *handler);
        }
        self.effects.insert(handle, manager);
        handle
    }

    /// Spawn a player tuned by `config.player`.
    pub fn spawn_player(&mut self, position: Vec2) -> EntityHandle {
        let player = Player::new(position, self.config.player.clone());
        self.spawn(player)
    }

    /// Spawn an idle enemy with the configured radii and attack power.
    pub fn spawn_enemy(&mut self, position: Vec2) -> EntityHandle {
        let enemy = EnemyAgent::new(position, &self.config.enemy);
        self.spawn(enemy)
    }

    /// Spawn a wall, obstacle or other inert body.
    pub fn spawn_prop(&mut self, kind: EntityKind, position: Vec2) -> EntityHandle {
        self.spawn(Prop::new(kind, position))
    }

    /// Remove an entity. Its effects are reset first so no attribute change
    /// outlives the manager.
    pub fn despawn(&mut self, handle: EntityHandle) -> Result<Entity, CoreError> {
        if let Some(mut manager) = self.effects.remove(&handle) {
            if let Some(entity) = self.world.get_mut(handle) {
                manager.destroy(entity, &mut self.events);
            }
        }
        self.attack_clocks.remove(&handle);
        self.world.despawn(handle)
    }

    // -- frame --------------------------------------------------------------

    /// Run one frame and return every event raised since the last drain.
    pub fn tick(&mut self) -> Vec<SimEvent> {
        let tick_start = Instant::now();
        let dt = self.fixed_dt as f32;
        let mut phase_times = Vec::with_capacity(4);

        let start = Instant::now();
        self.world.step_bodies(dt, &mut self.events);
        phase_times.push(("bodies", start.elapsed()));

        let start = Instant::now();
        let ctx = self.world.context();
        let enemies = self.world.enemies();
        for &handle in &enemies {
            if let Some(agent) = self.world.get_mut(handle).and_then(Entity::as_enemy_mut) {
                agent.update_ai(dt, &ctx, &mut self.events);
            }
        }
        phase_times.push(("ai", start.elapsed()));

        let start = Instant::now();
        let paced_attacks = match self.config.combat.attack_interval {
            Some(interval) => self.pace_attacks(&enemies, dt, interval),
            None => 0,
        };
        phase_times.push(("combat", start.elapsed()));

        let start = Instant::now();
        let time = self.sim_time();
        for manager in self.effects.values_mut() {
            manager.update(time, self.fixed_dt);
        }
        phase_times.push(("effects", start.elapsed()));

        self.tick_counter += 1;

        let events = self.events.drain();
        self.last_diagnostics = FrameDiagnostics {
            phase_times,
            total_time: tick_start.elapsed(),
            enemies_updated: enemies.len(),
            paced_attacks,
            events: events.len(),
        };
        events
    }

    /// Run `count` ticks. Returns the total number of events raised.
    pub fn run_ticks(&mut self, count: u64) -> usize {
        (0..count).map(|_| self.tick().len()).sum()
    }

    /// Strike on entering the attacking band, then at most once per
    /// `interval`. The clock keeps running while the agent is out of range,
    /// so leaving and re-entering the band does not earn an early hit.
    fn pace_attacks(&mut self, enemies: &[EntityHandle], dt: f32, interval: f32) -> usize {
        let mut dealt = 0;
        for &attacker in enemies {
            let (attacking, target) = match self.world.get(attacker).and_then(Entity::as_enemy) {
                Some(agent) if !agent.actor().is_dead() => {
                    (agent.ai_state() == AiState::Attacking, agent.target())
                }
                _ => (false, None),
            };
            let Some(target) = target else {
                self.attack_clocks.remove(&attacker);
                continue;
            };

            let clock = self.attack_clocks.entry(attacker).or_insert(0.0);
            if *clock > 0.0 {
                *clock -= dt;
            }
            if !attacking || *clock > 0.0 {
                continue;
            }
            *clock = interval;

            let Ok((a, t)) = self.world.pair_mut(attacker, target) else {
                continue;
            };
            let (Some(agent), Some(victim)) = (a.as_enemy_mut(), t.as_damageable_mut()) else {
                continue;
            };
            if agent.attack(target, victim, &mut self.events) {
                dealt += 1;
            }
        }
        dealt
    }

    // -- interactions -------------------------------------------------------

    /// Deliver a collision to both entities.
    pub fn report_collision(&mut self, a: EntityHandle, b: EntityHandle) -> Result<(), CoreError> {
        let (first, second) = self.world.pair_mut(a, b)?;
        let (view_a, view_b) = (first.actor().view(), second.actor().view());

        self.events.push(SimEvent::Collided {
            entity: a,
            other: b,
            other_kind: view_b.kind.clone(),
        });
        first.as_sim_mut().handle_collision(&view_b, &mut self.events);

        self.events.push(SimEvent::Collided {
            entity: b,
            other: a,
            other_kind: view_a.kind.clone(),
        });
        second.as_sim_mut().handle_collision(&view_a, &mut self.events);
        Ok(())
    }

    /// Explicit enemy attack. `Ok(false)` when the attacker or the target is
    /// already dead.
    pub fn enemy_attack(
        &mut self,
        attacker: EntityHandle,
        target: EntityHandle,
    ) -> Result<bool, CoreError> {
        let (a, t) = self.world.pair_mut(attacker, target)?;
        let attacker_kind = a.actor().kind().clone();
        let target_kind = t.actor().kind().clone();
        let agent = a.as_enemy_mut().ok_or(CoreError::NotAnEnemy {
            entity: attacker,
            kind: attacker_kind,
        })?;
        let victim = t.as_damageable_mut().ok_or(CoreError::NotDamageable {
            entity: target,
            kind: target_kind,
        })?;
        Ok(agent.attack(target, victim, &mut self.events))
    }

    /// Damage from a source outside the core (player weapons, hazards).
    pub fn apply_damage(&mut self, target: EntityHandle, amount: u32) -> Result<(), CoreError> {
        let entity = self.world.entity_mut(target)?;
        let kind = entity.actor().kind().clone();
        let victim = entity
            .as_damageable_mut()
            .ok_or(CoreError::NotDamageable {
                entity: target,
                kind,
            })?;
        victim.take_damage(amount, &mut self.events);
        Ok(())
    }

    /// Force an entity dead without despawning it.
    pub fn kill(&mut self, handle: EntityHandle) -> Result<(), CoreError> {
        self.world
            .entity_mut(handle)?
            .as_sim_mut()
            .kill(&mut self.events);
        Ok(())
    }

    /// Point the player at `direction` (zero stops it).
    pub fn steer_player(&mut self, handle: EntityHandle, direction: Vec2) -> Result<bool, CoreError> {
        let entity = self.world.entity_mut(handle)?;
        match entity.as_player_mut() {
            Some(player) => Ok(player.move_towards(direction)),
            None => Ok(false),
        }
    }

    // -- effects ------------------------------------------------------------

    /// Pick up `effect` on `owner`. Returns the resulting stack count.
    pub fn add_effect(
        &mut self,
        owner: EntityHandle,
        effect: impl StackableEffect + 'static,
    ) -> Result<u32, CoreError> {
        let target = self.world.entity_mut(owner)?;
        let manager = self
            .effects
            .get_mut(&owner)
            .ok_or(CoreError::StaleEntity { entity: owner })?;
        Ok(manager.add_effect(Box::new(effect), target, &mut self.events))
    }

    /// Drop `kind` from `owner`. `Ok(false)` if it was not active.
    pub fn remove_effect(&mut self, owner: EntityHandle, kind: &str) -> Result<bool, CoreError> {
        let target = self.world.entity_mut(owner)?;
        let manager = self
            .effects
            .get_mut(&owner)
            .ok_or(CoreError::StaleEntity { entity: owner })?;
        Ok(manager.remove_effect(kind, target, &mut self.events))
    }

    /// Whether `owner` is live and has `kind` active.
    pub fn is_effect_active(&self, owner: EntityHandle, kind: &str) -> bool {
        self.effects.get(&owner).is_some_and(|m| m.is_active(kind))
    }

    /// Stack count of `kind` on `owner`; `None` if inactive or despawned.
    pub fn effect_stacks(&self, owner: EntityHandle, kind: &str) -> Option<u32> {
        self.effects.get(&owner)?.stacks(kind)
    }

    /// The effect manager of a live entity.
    pub fn effects(&self, owner: EntityHandle) -> Option<&EffectManager> {
        self.effects.get(&owner)
    }

    /// Register an attribute handler on every manager, including those of
    /// entities spawned later.
    pub fn register_effect_handler(&mut self, kind: &str, handler: AttributeHandler) {
        for manager in self.effects.values_mut() {
            manager.register_handler(kind, handler);
        }
        self.extra_handlers.push((kind.to_owned(), handler));
    }

    // -- state --------------------------------------------------------------

    /// BLAKE3 hex digest of the world, active effects and tick state.
    pub fn state_hash(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct HashedState<'a> {
            tick_counter: u64,
            fixed_dt: f64,
            world: WorldSnapshot<'a>,
            effects: Vec<(EntityHandle, Vec<(&'a str, u32)>)>,
        }

        let effects = self
            .effects
            .iter()
            .map(|(handle, manager)| {
                let stacks = manager
                    .active_kinds()
                    .into_iter()
                    .map(|kind| (kind, manager.stacks(kind).unwrap_or(0)))
                    .collect();
                (*handle, stacks)
            })
            .collect();

        let state = HashedState {
            tick_counter: self.tick_counter,
            fixed_dt: self.fixed_dt,
            world: self.world.snapshot(),
            effects,
        };
        let bytes = serde_json::to_vec(&state)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Take events raised outside [`tick`](Self::tick) (pickups, collisions,
    /// explicit attacks) without advancing time.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// `tick_count * fixed_dt`, computed rather than accumulated.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    /// Seconds advanced per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Read-only view of every entity.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct entity access for scene code and tests. Despawn through
    /// [`Simulation::despawn`] so effect managers are torn down.
    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.world.get_mut(handle)
    }

    /// Combat tunables, including the attack pacer interval.
    pub fn combat(&self) -> &CombatConfig {
        &self.config.combat
    }

    /// The validated configuration this simulation runs with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Timing of the most recent tick.
    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_validated(SimConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
