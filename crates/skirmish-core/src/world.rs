//! The [`World`] owns every entity and resolves handles to them.
//!
//! Entities live in a slot vector indexed by [`EntityHandle::index`]; the
//! [`HandleAllocator`] decides whether a handle is still live. Iteration is in
//! slot order, which keeps frames deterministic for a given spawn sequence.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Damageable, EntityView, Prop, SimEntity};
use crate::enemy::{EnemyAgent, WorldContext};
use crate::events::EventLog;
use crate::handle::{EntityHandle, HandleAllocator};
use crate::kind::EntityKind;
use crate::player::Player;
use crate::CoreError;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// The concrete entity variants the world can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Player(Player),
    Enemy(EnemyAgent),
    Prop(Prop),
}

impl Entity {
    /// The variant behind the shared entity trait.
    pub fn as_sim(&self) -> &dyn SimEntity {
        match self {
            Entity::Player(p) => p,
            Entity::Enemy(e) => e,
            Entity::Prop(p) => p,
        }
    }

    /// Mutable [`Entity::as_sim`].
    pub fn as_sim_mut(&mut self) -> &mut dyn SimEntity {
        match self {
            Entity::Player(p) => p,
            Entity::Enemy(e) => e,
            Entity::Prop(p) => p,
        }
    }

    /// The damage capability, if this variant has one.
    pub fn as_damageable_mut(&mut self) -> Option<&mut dyn Damageable> {
        match self {
            Entity::Player(p) => Some(p),
            Entity::Enemy(e) => Some(e),
            Entity::Prop(_) => None,
        }
    }

    /// The shared base record of any variant.
    pub fn actor(&self) -> &Actor {
        self.as_sim().actor()
    }

    /// `Some` for enemies only.
    pub fn as_enemy(&self) -> Option<&EnemyAgent> {
        match self {
            Entity::Enemy(e) => Some(e),
            _ => None,
        }
    }

    /// Mutable [`Entity::as_enemy`].
    pub fn as_enemy_mut(&mut self) -> Option<&mut EnemyAgent> {
        match self {
            Entity::Enemy(e) => Some(e),
            _ => None,
        }
    }

    /// `Some` for players only.
    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable [`Entity::as_player`].
    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Player> for Entity {
    fn from(p: Player) -> Self {
        Entity::Player(p)
    }
}

impl From<EnemyAgent> for Entity {
    fn from(e: EnemyAgent) -> Self {
        Entity::Enemy(e)
    }
}

impl From<Prop> for Entity {
    fn from(p: Prop) -> Self {
        Entity::Prop(p)
    }
}

// ---------------------------------------------------------------------------
// WorldSnapshot
// ---------------------------------------------------------------------------

/// Serializable view of the live entity set, in slot order.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot<'a> {
    pub entities: Vec<(EntityHandle, &'a Entity)>,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Registry of every spawned entity, addressed by generational handle.
#[derive(Debug, Default)]
pub struct World {
    handles: HandleAllocator,
    slots: Vec<Option<Entity>>,
}

impl World {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity and bind its handle.
    pub fn spawn(&mut self, entity: impl Into<Entity>) -> EntityHandle {
        let mut entity = entity.into();
        let handle = self.handles.allocate();
        entity.as_sim_mut().actor_mut().bind(handle);

        let idx = handle.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        tracing::debug!(entity = %handle, kind = %entity.actor().kind(), "spawned");
        self.slots[idx] = Some(entity);
        handle
    }

    /// Remove an entity. Every outstanding copy of `handle` becomes stale.
    pub fn despawn(&mut self, handle: EntityHandle) -> Result<Entity, CoreError> {
        if !self.handles.release(handle) {
            return Err(CoreError::StaleEntity { entity: handle });
        }
        let entity = self.slots[handle.index() as usize]
            .take()
            .ok_or(CoreError::StaleEntity { entity: handle })?;
        tracing::debug!(entity = %handle, kind = %entity.actor().kind(), "despawned");
        Ok(entity)
    }

    /// Whether `handle` still names a spawned entity. Dead but not despawned
    /// entities count as alive here.
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.handles.is_live(handle)
    }

    /// Resolve a handle. `None` once the entity is despawned.
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        if !self.handles.is_live(handle) {
            return None;
        }
        self.slots.get(handle.index() as usize)?.as_ref()
    }

    /// Mutable [`World::get`].
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        if !self.handles.is_live(handle) {
            return None;
        }
        self.slots.get_mut(handle.index() as usize)?.as_mut()
    }

    /// Like [`World::get_mut`] but reports a stale handle as an error.
    pub fn entity_mut(&mut self, handle: EntityHandle) -> Result<&mut Entity, CoreError> {
        self.get_mut(handle)
            .ok_or(CoreError::StaleEntity { entity: handle })
    }

    /// Mutable access to two distinct entities at once.
    pub fn pair_mut(
        &mut self,
        a: EntityHandle,
        b: EntityHandle,
    ) -> Result<(&mut Entity, &mut Entity), CoreError> {
        for h in [a, b] {
            if !self.handles.is_live(h) {
                return Err(CoreError::StaleEntity { entity: h });
            }
        }
        if a.index() == b.index() {
            return Err(CoreError::SelfInteraction { entity: a });
        }

        let (ia, ib) = (a.index() as usize, b.index() as usize);
        let (first, second) = if ia < ib {
            let (left, right) = self.slots.split_at_mut(ib);
            (&mut left[ia], &mut right[0])
        } else {
            let (left, right) = self.slots.split_at_mut(ia);
            (&mut right[0], &mut left[ib])
        };
        match (first.as_mut(), second.as_mut()) {
            (Some(x), Some(y)) => Ok((x, y)),
            (None, _) => Err(CoreError::StaleEntity { entity: a }),
            (_, None) => Err(CoreError::StaleEntity { entity: b }),
        }
    }

    /// Read-only copy of what other entities may see.
    pub fn view(&self, handle: EntityHandle) -> Option<EntityView> {
        self.get(handle).map(|e| e.actor().view())
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref())
            .map(|e| (e.actor().handle(), e))
    }

    /// Handles of live entities, in slot order.
    pub fn handles(&self) -> Vec<EntityHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Every enemy, in slot order.
    pub fn enemies(&self) -> Vec<EntityHandle> {
        self.iter()
            .filter(|(_, e)| matches!(e, Entity::Enemy(_)))
            .map(|(h, _)| h)
            .collect()
    }

    /// The first player in slot order, dead or alive.
    pub fn player(&self) -> Option<EntityHandle> {
        self.iter()
            .find(|(_, e)| matches!(e, Entity::Player(_)))
            .map(|(h, _)| h)
    }

    /// What enemies get to see this frame.
    pub fn context(&self) -> WorldContext {
        WorldContext {
            player: self.player().and_then(|h| self.view(h)),
        }
    }

    /// Spawned entities, dead ones included.
    pub fn len(&self) -> usize {
        self.handles.live_count()
    }

    /// Whether nothing is spawned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entities of `kind` within `radius` of `point`, nearest first.
    pub fn within(&self, point: Vec2, radius: f32, kind: &EntityKind) -> Vec<EntityHandle> {
        let mut hits: Vec<(f32, EntityHandle)> = self
            .iter()
            .filter(|(_, e)| e.actor().kind() == kind)
            .map(|(h, e)| (e.actor().distance_to(point), h))
            .filter(|(d, _)| *d <= radius)
            .collect();
        hits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        hits.into_iter().map(|(_, h)| h).collect()
    }

    /// Base physics step for every entity except enemies, whose step runs
    /// inside their AI update.
    pub fn step_bodies(&mut self, dt: f32, events: &mut EventLog) {
        for entity in self.slots.iter_mut().flatten() {
            if !matches!(entity, Entity::Enemy(_)) {
                entity.as_sim_mut().update(dt, events);
            }
        }
    }

    /// Serializable view of every entity in slot order, for hashing.
    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            entities: self.iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
