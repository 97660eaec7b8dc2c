//! Weak entity references.
//!
//! Nothing in the simulation holds an entity by pointer. An AI target or an
//! effect owner is an [`EntityHandle`]: a slot number plus the slot's
//! generation at the time of the spawn. Despawning advances the generation,
//! so a handle that outlives its entity fails [`HandleAllocator::is_live`]
//! even after the slot has been handed to somebody else.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityHandle
// ---------------------------------------------------------------------------

/// Slot number and generation of a spawned entity.
///
/// Ordering is by slot first, which is the order the world iterates in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    /// Carried by actors that have not been spawned yet. The allocator never
    /// reaches this slot number.
    pub const UNBOUND: EntityHandle = EntityHandle::new(u32::MAX, u32::MAX);

    /// Handle for `generation` of slot `index`.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot number in the world's entity table.
    pub fn index(self) -> u32 {
        self.index
    }

    /// How many times the slot had been freed when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Whether this is the [`EntityHandle::UNBOUND`] placeholder.
    pub fn is_unbound(self) -> bool {
        self == Self::UNBOUND
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbound() {
            return f.write_str("EntityHandle(unbound)");
        }
        write!(f, "EntityHandle({self})")
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// ---------------------------------------------------------------------------
// HandleAllocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize)]
struct SlotState {
    generation: u32,
    occupied: bool,
}

/// Issues handles and answers liveness queries for them.
#[derive(Debug, Default, Clone, Serialize)]
pub struct HandleAllocator {
    slots: Vec<SlotState>,
    /// Unoccupied slots, most recently freed last.
    vacant: Vec<u32>,
}

impl HandleAllocator {
    /// An allocator with no slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupy a slot, preferring the most recently vacated one.
    pub fn allocate(&mut self) -> EntityHandle {
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.slots.push(SlotState::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.occupied = true;
        EntityHandle::new(index, slot.generation)
    }

    /// Vacate the slot `handle` points at. `false` when the handle was
    /// already stale, in which case nothing changes.
    pub fn release(&mut self, handle: EntityHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let slot = &mut self.slots[handle.index() as usize];
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(handle.index());
        true
    }

    /// Whether `handle` still names the entity it was issued for.
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.slots
            .get(handle.index() as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == handle.generation())
    }

    /// Number of occupied slots.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    /// Slots ever created, occupied or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slots_are_distinct() {
        let mut alloc = HandleAllocator::new();
        let handles: Vec<EntityHandle> = (0..16).map(|_| alloc.allocate()).collect();
        let indices: Vec<u32> = handles.iter().map(|h| h.index()).collect();
        assert_eq!(indices, (0..16).collect::<Vec<u32>>());
        assert!(handles.iter().all(|&h| alloc.is_live(h)));
        assert_eq!(alloc.live_count(), 16);
    }

    #[test]
    fn reused_slot_invalidates_old_handle() {
        let mut alloc = HandleAllocator::new();
        let target = alloc.allocate();
        alloc.allocate();
        assert!(alloc.release(target));

        let newcomer = alloc.allocate();
        assert_eq!(newcomer.index(), target.index());
        assert_eq!(newcomer.generation(), 1);
        assert!(!alloc.is_live(target));
        assert!(alloc.is_live(newcomer));
    }

    #[test]
    fn stale_release_changes_nothing() {
        let mut alloc = HandleAllocator::new();
        let h = alloc.allocate();
        assert!(alloc.release(h));
        assert!(!alloc.release(h));
        assert_eq!(alloc.live_count(), 0);
        assert_eq!(alloc.capacity(), 1);
        assert_eq!(alloc.allocate().generation(), 1);
    }

    #[test]
    fn unbound_is_never_live() {
        let mut alloc = HandleAllocator::new();
        alloc.allocate();
        assert!(!alloc.is_live(EntityHandle::UNBOUND));
        assert!(!alloc.is_live(EntityHandle::new(3, 0)));
        assert_eq!(format!("{:?}", EntityHandle::UNBOUND), "EntityHandle(unbound)");
    }

    #[test]
    fn display_is_index_and_generation() {
        let h = EntityHandle::new(42, 7);
        assert_eq!(h.to_string(), "42v7");
        assert_eq!(format!("{h:?}"), "EntityHandle(42v7)");
    }
}
