//! Enemy AI: target tracking, distance bands, and the explicit attack action.
//!
//! Every frame the agent re-derives its behaviour from scratch:
//!
//! 1. Base physics step.
//! 2. Dead agents stop here -- AI state, velocity and target stay frozen.
//! 3. The target is whatever player the [`WorldContext`] supplies this frame.
//!    No player in the context clears the target; nothing is carried over.
//! 4. Against a living target at distance `d` (first match wins):
//!    - `d <= attack_radius`    -> [`AiState::Attacking`], stop, lifecycle `Attacking`
//!    - `d <= detection_radius` -> [`AiState::Chasing`], head for the target at
//!      chase speed, lifecycle `Moving`
//!    - otherwise               -> [`AiState::Idle`], stop, lifecycle `Idle`
//! 5. No (living) target -> the idle branch.
//!
//! There is no hysteresis: a target sitting exactly on a band edge can flip
//! the agent every frame. Attacking does not deal damage by itself; damage
//! only flows through [`EnemyAgent::attack`], paced by the caller.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorOptions, Damageable, EntityView, SimEntity};
use crate::events::{EventLog, SimEvent};
use crate::handle::EntityHandle;
use crate::kind::{AiState, EntityKind, LifecycleState};

/// Reference chase speed in units/second.
pub const DEFAULT_CHASE_SPEED: f32 = 55.0;

// ---------------------------------------------------------------------------
// EnemyConfig
// ---------------------------------------------------------------------------

/// Tunables for an [`EnemyAgent`].
///
/// `attack_radius <= detection_radius` is expected but not enforced here;
/// the attack band is always tested first regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_health: u32,
    pub detection_radius: f32,
    pub attack_radius: f32,
    pub attack_power: u32,
    pub chase_speed: f32,
    /// Chase speed added per `speed_boost` stack.
    pub speed_per_stack: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 50,
            detection_radius: 150.0,
            attack_radius: 30.0,
            attack_power: 10,
            chase_speed: DEFAULT_CHASE_SPEED,
            speed_per_stack: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// WorldContext
// ---------------------------------------------------------------------------

/// What the driver tells an agent about the world this frame.
#[derive(Debug, Clone, Default)]
pub struct WorldContext {
    /// The player, if one exists. `None` means "no target this frame".
    pub player: Option<EntityView>,
}

impl WorldContext {
    /// Context in which `player` is the only candidate target.
    pub fn with_player(player: EntityView) -> Self {
        Self {
            player: Some(player),
        }
    }
}

// ---------------------------------------------------------------------------
// EnemyAgent
// ---------------------------------------------------------------------------

/// A hostile actor that picks its behaviour band from the distance to the
/// player every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyAgent {
    actor: Actor,
    ai_state: AiState,
    target: Option<EntityHandle>,
    detection_radius: f32,
    attack_radius: f32,
    attack_power: u32,
    base_chase_speed: f32,
    chase_speed: f32,
    speed_per_stack: f32,
}

impl EnemyAgent {
    /// An idle, target-less agent with the tunables from `config`.
    pub fn new(position: Vec2, config: &EnemyConfig) -> Self {
        let actor = Actor::new(
            EntityKind::Enemy,
            position,
            ActorOptions {
                max_health: config.max_health,
                ..Default::default()
            },
        );
        Self {
            actor,
            ai_state: AiState::Idle,
            target: None,
            detection_radius: config.detection_radius,
            attack_radius: config.attack_radius,
            attack_power: config.attack_power,
            base_chase_speed: config.chase_speed,
            chase_speed: config.chase_speed,
            speed_per_stack: config.speed_per_stack,
        }
    }

    /// Behaviour band chosen on the last update.
    pub fn ai_state(&self) -> AiState {
        self.ai_state
    }

    /// Handle of the entity tracked last frame. May be stale; resolve it
    /// through the world before use.
    pub fn target(&self) -> Option<EntityHandle> {
        self.target
    }

    /// Outer edge of the chase band.
    pub fn detection_radius(&self) -> f32 {
        self.detection_radius
    }

    /// Outer edge of the attack band.
    pub fn attack_radius(&self) -> f32 {
        self.attack_radius
    }

    /// Damage dealt per [`EnemyAgent::attack`].
    pub fn attack_power(&self) -> u32 {
        self.attack_power
    }

    /// Current chase speed, boosts included.
    pub fn chase_speed(&self) -> f32 {
        self.chase_speed
    }

    /// Set chase speed for `stacks` boosts; `0` restores the base.
    pub fn set_speed_stacks(&mut self, stacks: u32) {
        self.chase_speed = self.base_chase_speed + self.speed_per_stack * stacks as f32;
    }

    /// Frame update: base physics, then AI re-evaluation against `ctx`.
    pub fn update_ai(&mut self, dt: f32, ctx: &WorldContext, events: &mut EventLog) {
        self.actor.integrate(dt);
        if self.actor.is_dead() {
            return;
        }

        self.target = ctx.player.as_ref().map(|p| p.handle);

        match ctx.player.as_ref().filter(|p| !p.lifecycle.is_dead()) {
            Some(target) => {
                let distance = self.actor.distance_to(target.position);
                if distance <= self.attack_radius {
                    self.enter(AiState::Attacking, events);
                    self.actor.set_velocity(Vec2::ZERO);
                    self.actor.set_state(LifecycleState::Attacking);
                } else if distance <= self.detection_radius {
                    self.enter(AiState::Chasing, events);
                    let heading = (target.position - self.actor.position()).normalize_or_zero();
                    self.actor.set_velocity(heading * self.chase_speed);
                    self.actor.set_state(LifecycleState::Moving);
                } else {
                    self.go_idle(events);
                }
            }
            None => self.go_idle(events),
        }
    }

    /// Deal `attack_power` to `target`. Returns whether the hit landed:
    /// `false` when the agent is dead or the target no longer accepts damage,
    /// in which case nothing is recorded.
    ///
    /// There is no cooldown: calling this every frame deals damage every frame.
    pub fn attack(
        &mut self,
        target_handle: EntityHandle,
        target: &mut dyn Damageable,
        events: &mut EventLog,
    ) -> bool {
        if self.actor.is_dead() || !target.accepts_damage() {
            return false;
        }
        events.push(SimEvent::Attacked {
            attacker: self.actor.handle(),
            target: target_handle,
            amount: self.attack_power,
        });
        target.take_damage(self.attack_power, events);
        self.actor.set_state(LifecycleState::Attacking);
        true
    }

    fn go_idle(&mut self, events: &mut EventLog) {
        self.enter(AiState::Idle, events);
        self.actor.set_velocity(Vec2::ZERO);
        if self.actor.state() != LifecycleState::Idle {
            self.actor.set_state(LifecycleState::Idle);
        }
    }

    fn enter(&mut self, next: AiState, events: &mut EventLog) {
        if self.ai_state == next {
            return;
        }
        tracing::debug!(
            entity = %self.actor.handle(),
            from = %self.ai_state,
            to = %next,
            "ai state"
        );
        events.push(SimEvent::AiStateChanged {
            entity: self.actor.handle(),
            from: self.ai_state,
            to: next,
        });
        self.ai_state = next;
    }
}

impl SimEntity for EnemyAgent {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    fn handle_collision(&mut self, other: &EntityView, _events: &mut EventLog) {
        let me = self.actor.handle();
        match other.kind {
            EntityKind::Player if self.ai_state == AiState::Attacking => {
                // Contact never hurts; the hit lands through `attack`.
                tracing::trace!(entity = %me, other = %other.handle, "contact while attacking");
            }
            EntityKind::Player => {
                tracing::trace!(entity = %me, other = %other.handle, "player contact");
            }
            EntityKind::Wall | EntityKind::Obstacle => {
                tracing::trace!(
                    entity = %me,
                    other = %other.handle,
                    kind = %other.kind,
                    "blocked"
                );
            }
            _ => {}
        }
    }

    fn on_death(&mut self, events: &mut EventLog) {
        if self.actor.mark_dead(events) {
            tracing::debug!(entity = %self.actor.handle(), ai = %self.ai_state, "enemy defeated");
        }
    }
}

impl Damageable for EnemyAgent {
    fn take_damage(&mut self, amount: u32, events: &mut EventLog) {
        self.receive_damage(amount, events);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Player, PlayerConfig};

    fn player_view(at: Vec2, lifecycle: LifecycleState) -> EntityView {
        EntityView {
            handle: EntityHandle::new(0, 0),
            kind: EntityKind::Player,
            position: at,
            lifecycle,
        }
    }

    fn band_at(distance: f32) -> AiState {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let ctx = WorldContext::with_player(player_view(
            Vec2::new(distance, 0.0),
            LifecycleState::Idle,
        ));
        enemy.update_ai(0.0, &ctx, &mut EventLog::new());
        enemy.ai_state()
    }

    #[test]
    fn bands_follow_radii() {
        assert_eq!(band_at(20.0), AiState::Attacking);
        assert_eq!(band_at(30.0), AiState::Attacking);
        assert_eq!(band_at(75.0), AiState::Chasing);
        assert_eq!(band_at(150.0), AiState::Chasing);
        assert_eq!(band_at(200.0), AiState::Idle);
    }

    #[test]
    fn chase_heads_for_target_at_chase_speed() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let ctx =
            WorldContext::with_player(player_view(Vec2::new(0.0, 100.0), LifecycleState::Moving));
        enemy.update_ai(0.0, &ctx, &mut EventLog::new());
        assert_eq!(enemy.actor().velocity(), Vec2::new(0.0, DEFAULT_CHASE_SPEED));
        assert_eq!(enemy.actor().state(), LifecycleState::Moving);
    }

    #[test]
    fn dead_target_means_idle_but_is_still_tracked() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let ctx =
            WorldContext::with_player(player_view(Vec2::new(10.0, 0.0), LifecycleState::Dead));
        enemy.update_ai(0.016, &ctx, &mut EventLog::new());
        assert_eq!(enemy.ai_state(), AiState::Idle);
        assert_eq!(enemy.target(), Some(EntityHandle::new(0, 0)));
    }

    #[test]
    fn missing_player_clears_target() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let mut events = EventLog::new();
        let near = WorldContext::with_player(player_view(Vec2::new(50.0, 0.0), LifecycleState::Idle));
        enemy.update_ai(0.0, &near, &mut events);
        assert!(enemy.target().is_some());
        enemy.update_ai(0.0, &WorldContext::default(), &mut events);
        assert_eq!(enemy.target(), None);
        assert_eq!(enemy.ai_state(), AiState::Idle);
        assert_eq!(enemy.actor().velocity(), Vec2::ZERO);
    }

    #[test]
    fn idle_does_not_restart_idle_animation() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let mut events = EventLog::new();
        enemy.update_ai(0.25, &WorldContext::default(), &mut events);
        enemy.update_ai(0.25, &WorldContext::default(), &mut events);
        assert_eq!(enemy.actor().state_time(), 0.5);
        assert!(events.is_empty());
    }

    #[test]
    fn attack_damages_and_animates() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let mut player = Player::new(Vec2::X, PlayerConfig::default());
        let mut events = EventLog::new();
        assert!(enemy.attack(EntityHandle::new(0, 0), &mut player, &mut events));
        assert_eq!(player.actor().health(), 90);
        assert_eq!(enemy.actor().state(), LifecycleState::Attacking);
    }

    #[test]
    fn dead_enemy_cannot_attack() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let mut player = Player::new(Vec2::X, PlayerConfig::default());
        let mut events = EventLog::new();
        enemy.take_damage(1_000, &mut events);
        assert!(!enemy.attack(EntityHandle::new(0, 0), &mut player, &mut events));
        assert_eq!(player.actor().health(), 100);
    }

    #[test]
    fn attack_on_dead_target_does_not_land() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let mut player = Player::new(Vec2::X, PlayerConfig::default());
        let mut events = EventLog::new();
        player.kill(&mut events);
        events.clear();

        assert!(!enemy.attack(EntityHandle::new(0, 0), &mut player, &mut events));
        assert!(events.is_empty(), "no Attacked event for a hit that did not land");
        assert_eq!(enemy.actor().state(), LifecycleState::Idle);
    }

    #[test]
    fn walls_and_obstacles_only_block() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let mut events = EventLog::new();
        let chase = WorldContext::with_player(player_view(Vec2::new(80.0, 0.0), LifecycleState::Idle));
        enemy.update_ai(0.0, &chase, &mut events);
        events.clear();
        let before = enemy.clone();

        for (index, kind) in [(7, EntityKind::Wall), (8, EntityKind::Obstacle)] {
            let view = EntityView {
                handle: EntityHandle::new(index, 0),
                kind,
                position: Vec2::new(1.0, 0.0),
                lifecycle: LifecycleState::Idle,
            };
            enemy.handle_collision(&view, &mut events);
        }

        assert!(events.is_empty());
        assert_eq!(enemy, before);
        assert_eq!(enemy.ai_state(), AiState::Chasing);
        assert_eq!(enemy.actor().health(), 50);
        assert_eq!(enemy.actor().velocity(), Vec2::new(DEFAULT_CHASE_SPEED, 0.0));
    }

    #[test]
    fn contact_with_player_deals_no_damage() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        let mut events = EventLog::new();
        let touching = WorldContext::with_player(player_view(Vec2::X, LifecycleState::Idle));
        enemy.update_ai(0.0, &touching, &mut events);
        events.clear();
        enemy.handle_collision(&player_view(Vec2::X, LifecycleState::Idle), &mut events);
        let coin = EntityView {
            handle: EntityHandle::new(5, 0),
            kind: EntityKind::Other("coin".to_owned()),
            position: Vec2::ZERO,
            lifecycle: LifecycleState::Idle,
        };
        enemy.handle_collision(&coin, &mut events);
        assert!(events.is_empty());
        assert_eq!(enemy.ai_state(), AiState::Attacking);
    }

    #[test]
    fn speed_stacks_scale_chase() {
        let mut enemy = EnemyAgent::new(Vec2::ZERO, &EnemyConfig::default());
        enemy.set_speed_stacks(2);
        assert_eq!(enemy.chase_speed(), 75.0);
        enemy.set_speed_stacks(0);
        assert_eq!(enemy.chase_speed(), DEFAULT_CHASE_SPEED);
    }
}
