//! Entity handles and their generational allocator.
//!
//! An [`EntityId`] packs a *generation* counter in the high 32 bits and a slot
//! *index* in the low 32 bits. Destroying an entity bumps the generation of
//! its slot, so a handle kept past destruction can never alias the next
//! entity placed in the same slot.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity handle with no data of its own.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`EntityId`]s with generational tracking.
///
/// Free indices are kept in a FIFO queue so a freshly freed slot is the last
/// one to be handed out again.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation for each index slot.
    generations: Vec<u32>,
    /// Whether the slot is currently alive.
    alive: Vec<bool>,
    /// Recyclable indices, oldest first.
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`].
    ///
    /// A recycled index is reused with the generation bumped at its last
    /// deallocation; otherwise a brand-new index is created.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Release an entity, incrementing the generation of its slot so that
    /// outstanding handles become stale.
    ///
    /// Returns `false` if the handle was already dead or stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        true
    }

    /// Returns `true` if `id` refers to a live entity of the current
    /// generation for its slot.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        match (self.alive.get(idx), self.generations.get(idx)) {
            (Some(&alive), Some(&generation)) => alive && generation == id.generation(),
            _ => false,
        }
    }

    /// Total number of currently alive entities.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    /// Handles of every live entity, in ascending slot order.
    pub fn alive_ids(&self) -> Vec<EntityId> {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(|(idx, _)| EntityId::new(idx as u32, self.generations[idx]))
            .collect()
    }

    /// The live handle occupying slot `index`, if any.
    pub fn id_at(&self, index: u32) -> Option<EntityId> {
        let idx = index as usize;
        match self.alive.get(idx) {
            Some(true) => Some(EntityId::new(index, self.generations[idx])),
            _ => None,
        }
    }

    /// Number of slots ever handed out (live or free).
    pub fn slot_count(&self) -> usize {
        self.generations.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
