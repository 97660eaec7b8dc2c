//! Diagnostic event channel.
//!
//! Every observable side effect of the core -- damage, deaths, AI band
//! changes, effect stacking, missing handlers -- is pushed as a [`SimEvent`]
//! into an [`EventLog`] that the caller passes in. Scene code, spawners and
//! telemetry read the log after the frame; tests assert on it directly
//! instead of scraping log output.
//!
//! Each event is also mirrored as a `tracing` debug line so a subscriber sees
//! the same stream without holding on to the log.
//!
//! # Example
//!
//! ```
//! use skirmish_core::events::{EventLog, SimEvent};
//! use skirmish_core::handle::EntityHandle;
//!
//! let mut log = EventLog::new();
//! let e = EntityHandle::new(0, 0);
//! log.push(SimEvent::Died { entity: e });
//!
//! assert_eq!(log.deaths().count(), 1);
//! let drained = log.drain();
//! assert_eq!(drained.len(), 1);
//! assert!(log.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::handle::EntityHandle;
use crate::kind::{AiState, EntityKind};

// ---------------------------------------------------------------------------
// SimEvent
// ---------------------------------------------------------------------------

/// Something that happened during a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Health went down. `remaining` is the post-clamp value.
    Damaged {
        entity: EntityHandle,
        amount: u32,
        remaining: u32,
    },
    /// The entity's death hook ran. Emitted exactly once per entity.
    Died { entity: EntityHandle },
    /// An enemy moved to a different behaviour band.
    AiStateChanged {
        entity: EntityHandle,
        from: AiState,
        to: AiState,
    },
    /// An explicit attack landed.
    Attacked {
        attacker: EntityHandle,
        target: EntityHandle,
        amount: u32,
    },
    /// A collision was delivered to `entity`.
    Collided {
        entity: EntityHandle,
        other: EntityHandle,
        other_kind: EntityKind,
    },
    /// An effect was activated or stacked; `stacks` is the new absolute count.
    EffectApplied {
        owner: EntityHandle,
        kind: String,
        stacks: u32,
    },
    /// An effect was reset and dropped from the active set.
    EffectRemoved { owner: EntityHandle, kind: String },
    /// An add was ignored because the effect is unstackable or capped.
    EffectCapped {
        owner: EntityHandle,
        kind: String,
        stacks: u32,
    },
    /// No built-in handler exists for an effect kind.
    HandlerMissing { owner: EntityHandle, kind: String },
    /// The target lacks the attribute setter a handler needed.
    CapabilityMissing {
        owner: EntityHandle,
        kind: String,
        capability: String,
    },
}

impl SimEvent {
    /// The entity the event is primarily about.
    pub fn subject(&self) -> EntityHandle {
        match self {
            SimEvent::Damaged { entity, .. }
            | SimEvent::Died { entity }
            | SimEvent::AiStateChanged { entity, .. }
            | SimEvent::Collided { entity, .. } => *entity,
            SimEvent::Attacked { attacker, .. } => *attacker,
            SimEvent::EffectApplied { owner, .. }
            | SimEvent::EffectRemoved { owner, .. }
            | SimEvent::EffectCapped { owner, .. }
            | SimEvent::HandlerMissing { owner, .. }
            | SimEvent::CapabilityMissing { owner, .. } => *owner,
        }
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Append-only event buffer, drained by whoever drives the frame.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event (FIFO).
    pub fn push(&mut self, event: SimEvent) {
        tracing::debug!(subject = %event.subject(), event = ?event, "sim event");
        self.events.push(event);
    }

    /// Events recorded since the last drain.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in the order they were pushed.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    /// Events whose subject is `entity`.
    pub fn for_entity(&self, entity: EntityHandle) -> impl Iterator<Item = &SimEvent> {
        self.events.iter().filter(move |e| e.subject() == entity)
    }

    /// Handles of every entity that died while this log was collecting.
    pub fn deaths(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.events.iter().filter_map(|e| match e {
            SimEvent::Died { entity } => Some(*entity),
            _ => None,
        })
    }

    /// Take every buffered event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Discard pending events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_entity_filters_by_subject() {
        let a = EntityHandle::new(0, 0);
        let b = EntityHandle::new(1, 0);
        let mut log = EventLog::new();
        log.push(SimEvent::Damaged {
            entity: a,
            amount: 5,
            remaining: 10,
        });
        log.push(SimEvent::Attacked {
            attacker: b,
            target: a,
            amount: 5,
        });
        log.push(SimEvent::Died { entity: a });

        assert_eq!(log.for_entity(a).count(), 2);
        assert_eq!(log.for_entity(b).count(), 1);
        assert_eq!(log.deaths().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn drain_preserves_order() {
        let e = EntityHandle::new(2, 1);
        let mut log = EventLog::new();
        log.push(SimEvent::EffectApplied {
            owner: e,
            kind: "speed_boost".to_owned(),
            stacks: 1,
        });
        log.push(SimEvent::EffectRemoved {
            owner: e,
            kind: "speed_boost".to_owned(),
        });
        let events = log.drain();
        assert!(matches!(events[0], SimEvent::EffectApplied { .. }));
        assert!(matches!(events[1], SimEvent::EffectRemoved { .. }));
        assert!(log.is_empty());
    }
}
