//! Per-entity bookkeeping of active effects and their stack counts.
//!
//! One [`EffectManager`] serves one target. It owns the active set; the target
//! itself is owned elsewhere and lent to every call that needs to touch its
//! attributes, so the manager never outlives or pins the entity.
//!
//! # Stacking
//!
//! | situation                          | result                                  |
//! |------------------------------------|-----------------------------------------|
//! | new kind                           | `stacks = 1`, apply level 1             |
//! | known kind, below `max_stacks`     | `stacks += 1`, apply the new level      |
//! | known kind, `max_stacks == 1`      | no-op                                   |
//! | known kind, at `max_stacks`        | no-op                                   |
//!
//! Built-in handlers receive the absolute level, never a delta. Kinds with no
//! handler fall back to the effect's own [`StackableEffect::apply`] on the
//! first stack only, and every application reports the missing handler.

use std::collections::HashMap;
use std::fmt;

use skirmish_core::events::{EventLog, SimEvent};
use skirmish_core::handle::EntityHandle;

use crate::effect::{EffectError, EffectTarget, StackableEffect, HEALTH_INCREASE, SPEED_BOOST};

/// Attribute setter invoked with the absolute stack count (`0` = reset).
pub type AttributeHandler = fn(&mut dyn EffectTarget, u32) -> Result<(), EffectError>;

#[derive(Debug)]
struct ActiveEffect {
    effect: Box<dyn StackableEffect>,
    stacks: u32,
}

/// Active power-ups of one entity, keyed by kind.
///
/// Each kind maps to an [`AttributeHandler`] that is called with the absolute
/// stack count after every pickup and with `0` on removal. Kinds without a
/// handler are still counted so a later registration can pick them up.
pub struct EffectManager {
    owner: EntityHandle,
    active: HashMap<String, ActiveEffect>,
    handlers: HashMap<String, AttributeHandler>,
}

impl fmt::Debug for EffectManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        handlers.sort_unstable();
        f.debug_struct("EffectManager")
            .field("owner", &self.owner)
            .field("active", &self.active)
            .field("handlers", &handlers)
            .finish()
    }
}

impl EffectManager {
    /// A manager with the built-in `speed_boost` and `health_increase` handlers.
    pub fn new(owner: EntityHandle) -> Self {
        let mut manager = Self {
            owner,
            active: HashMap::new(),
            handlers: HashMap::new(),
        };
        manager.register_handler(SPEED_BOOST, |target, stacks| target.update_speed(stacks));
        manager.register_handler(HEALTH_INCREASE, |target, stacks| {
            target.update_max_health(stacks)
        });
        manager
    }

    /// The entity whose attributes this manager changes.
    pub fn owner(&self) -> EntityHandle {
        self.owner
    }

    /// Map an effect kind to an attribute setter, replacing any previous one.
    pub fn register_handler(&mut self, kind: impl Into<String>, handler: AttributeHandler) {
        self.handlers.insert(kind.into(), handler);
    }

    /// Activate or stack `effect` on `target`. Returns the resulting count.
    pub fn add_effect(
        &mut self,
        effect: Box<dyn StackableEffect>,
        target: &mut dyn EffectTarget,
        events: &mut EventLog,
    ) -> u32 {
        let kind = effect.kind().to_owned();
        let stacks = match self.active.get_mut(&kind) {
            None => {
                self.active.insert(kind.clone(), ActiveEffect { effect, stacks: 1 });
                1
            }
            Some(entry) => {
                let cap = entry.effect.max_stacks().max(1);
                if entry.stacks >= cap {
                    tracing::debug!(
                        owner = %self.owner,
                        kind = %kind,
                        stacks = entry.stacks,
                        "effect capped"
                    );
                    events.push(SimEvent::EffectCapped {
                        owner: self.owner,
                        kind,
                        stacks: entry.stacks,
                    });
                    return entry.stacks;
                }
                entry.stacks += 1;
                entry.stacks
            }
        };

        self.apply_level(&kind, stacks, target, events);
        events.push(SimEvent::EffectApplied {
            owner: self.owner,
            kind,
            stacks,
        });
        stacks
    }

    /// Reset and drop `kind`. Returns `false` if it was not active.
    pub fn remove_effect(
        &mut self,
        kind: &str,
        target: &mut dyn EffectTarget,
        events: &mut EventLog,
    ) -> bool {
        let Some(entry) = self.active.remove(kind) else {
            return false;
        };
        self.reset_entry(kind, &entry, target, events);
        events.push(SimEvent::EffectRemoved {
            owner: self.owner,
            kind: kind.to_owned(),
        });
        true
    }

    /// Whether `kind` has at least one stack.
    pub fn is_active(&self, kind: &str) -> bool {
        self.active.contains_key(kind)
    }

    /// Current stack count of `kind`, `None` when inactive.
    pub fn stacks(&self, kind: &str) -> Option<u32> {
        self.active.get(kind).map(|e| e.stacks)
    }

    /// Active kinds, sorted.
    pub fn active_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.active.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of active kinds.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no effect is active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Reset every active effect, then clear the set. Call before the target
    /// leaves the simulation.
    pub fn destroy(&mut self, target: &mut dyn EffectTarget, events: &mut EventLog) {
        let kinds: Vec<String> = self.active_kinds().into_iter().map(str::to_owned).collect();
        for kind in kinds {
            self.remove_effect(&kind, target, events);
        }
        self.active.clear();
    }

    /// Per-frame hook. Effects are permanent, so there is nothing to advance.
    pub fn update(&mut self, _time: f64, _delta: f64) {}

    fn apply_level(
        &self,
        kind: &str,
        stacks: u32,
        target: &mut dyn EffectTarget,
        events: &mut EventLog,
    ) {
        match self.handlers.get(kind).copied() {
            Some(handler) => {
                if let Err(err) = handler(target, stacks) {
                    self.report_capability(kind, err, events);
                }
            }
            None => {
                tracing::warn!(owner = %self.owner, kind, stacks, "no handler for effect kind");
                events.push(SimEvent::HandlerMissing {
                    owner: self.owner,
                    kind: kind.to_owned(),
                });
                if stacks == 1 {
                    if let Some(entry) = self.active.get(kind) {
                        entry.effect.apply(target);
                    }
                }
            }
        }
    }

    fn reset_entry(
        &self,
        kind: &str,
        entry: &ActiveEffect,
        target: &mut dyn EffectTarget,
        events: &mut EventLog,
    ) {
        match self.handlers.get(kind).copied() {
            Some(handler) => {
                if let Err(err) = handler(target, 0) {
                    self.report_capability(kind, err, events);
                }
            }
            None => entry.effect.reset(target),
        }
    }

    fn report_capability(&self, kind: &str, err: EffectError, events: &mut EventLog) {
        let EffectError::MissingCapability { capability } = err;
        tracing::error!(
            owner = %self.owner,
            kind,
            capability,
            "target lacks capability, skipping"
        );
        events.push(SimEvent::CapabilityMissing {
            owner: self.owner,
            kind: kind.to_owned(),
            capability: capability.to_owned(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
