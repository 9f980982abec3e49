//! Fixed-capacity multi-select

use super::world::EntityId;

/// The player's current selection
///
/// Slots are unordered; `None` marks a free slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    slots: Vec<Option<EntityId>>,
}

impl Selection {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains(&Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Put `id` in the first free slot; false if full or already selected
    pub fn add(&mut self, id: EntityId) -> bool {
        if self.contains(id) {
            return false;
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(id);
                true
            }
            None => false,
        }
    }

    /// Free the slot holding `id`; false if it was not selected
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.slots.iter_mut().find(|slot| **slot == Some(id)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Remove `id` if selected, otherwise add it (ignored when full)
    pub fn toggle(&mut self, id: EntityId) {
        if !self.remove(id) {
            self.add(id);
        }
    }

    /// Replace the selection with just `id`
    pub fn select_only(&mut self, id: EntityId) {
        self.clear();
        self.add(id);
    }
}
