//! Entity store
//!
//! Entities live in a slot map keyed by generation-checked [`EntityId`]s, so
//! a handle to a despawned entity resolves to `None` instead of aliasing a
//! newer one. Iteration follows slot order.

use glam::{Mat4, Vec2};
use slotmap::SlotMap;

use super::collision::pick_closest;
use super::entity::{Entity, EntitySpawn};
use super::selection::Selection;
use super::state::Order;
use crate::camera::rts::project_to_screen;
use crate::geom::{Ray, Rect};
use crate::terrain::TerrainMap;

slotmap::new_key_type! {
    /// Stable handle to an entity
    pub struct EntityId;
}

pub struct World {
    entities: SlotMap<EntityId, Entity>,
    selection: Selection,
    last_picked: Option<EntityId>,
    /// Entities awaiting transform/bbox recompute, in the order they moved
    dirty: Vec<EntityId>,
    /// Simulation ticks run so far
    pub time_ticks: u64,
}

impl World {
    pub fn new(max_selected: usize) -> Self {
        Self {
            entities: SlotMap::with_key(),
            selection: Selection::new(max_selected),
            last_picked: None,
            dirty: Vec::new(),
            time_ticks: 0,
        }
    }

    /// Add an entity; it is settled on the terrain at the next flush
    pub fn spawn(&mut self, spawn: &EntitySpawn) -> EntityId {
        let id = self.entities.insert(Entity::new(spawn));
        self.dirty.push(id);
        log::info!(
            "Spawned {:?} {:?} at ({:.1}, {:.1})",
            spawn.team,
            spawn.kind,
            spawn.position.x,
            spawn.position.y
        );
        id
    }

    /// Remove an entity and forget every reference the world holds to it
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.selection.remove(id);
        self.dirty.retain(|&d| d != id);
        if self.last_picked == Some(id) {
            self.last_picked = None;
        }
        log::debug!("Despawned {:?}", id);
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Entity under the most recent pick ray, if it hit one
    pub fn last_picked(&self) -> Option<EntityId> {
        self.last_picked
    }

    /// Closest actor whose bounding box `ray` passes through
    pub fn pick(&mut self, ray: &Ray) -> Option<EntityId> {
        let picked = pick_closest(
            ray,
            self.entities
                .iter()
                .filter(|(_, e)| e.is_actor())
                .map(|(id, e)| (id, e.bbox)),
        );
        self.last_picked = picked;
        picked
    }

    /// Send every selected entity towards `point`; returns how many accepted
    pub fn order_move(&mut self, point: Vec2) -> usize {
        self.order_selected(Order::Move(point), |_| true)
    }

    /// Send every selected entity after `target`; returns how many accepted
    ///
    /// Nothing is ordered when the target is unknown or already dying. The
    /// target itself is skipped if it happens to be selected.
    pub fn order_attack(&mut self, target: EntityId) -> usize {
        match self.entities.get(target) {
            Some(t) if t.is_actor() && !t.state.is_dead() => {}
            _ => return 0,
        }
        self.order_selected(Order::Attack(target), |id| id != target)
    }

    fn order_selected(&mut self, order: Order, allow: impl Fn(EntityId) -> bool) -> usize {
        let mut accepted = 0;
        for id in self.selection.iter().filter(|&id| allow(id)) {
            if let Some(entity) = self.entities.get_mut(id) {
                if entity.is_actor() && entity.command(order) {
                    accepted += 1;
                }
            }
        }
        log::debug!("{:?} accepted by {} entities", order, accepted);
        accepted
    }

    /// Select every actor whose position projects inside `rect`
    ///
    /// Replaces the selection unless `add` is set. Stops once the selection
    /// is full.
    pub fn box_select(&mut self, rect: Rect, add: bool, view_projection: &Mat4, viewport: Vec2) -> usize {
        if !add {
            self.selection.clear();
        }
        let mut added = 0;
        for (id, entity) in &self.entities {
            if self.selection.is_full() {
                break;
            }
            if !entity.is_actor() {
                continue;
            }
            let inside = project_to_screen(view_projection, viewport, entity.position)
                .is_some_and(|screen| rect.contains(screen));
            if inside && self.selection.add(id) {
                added += 1;
            }
        }
        added
    }

    /// Queue `id` for transform/bbox recompute
    ///
    /// The queue is the source of truth; the entity flag only mirrors it.
    pub fn mark_dirty(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.dirty = true;
            if !self.dirty.contains(&id) {
                self.dirty.push(id);
            }
        }
    }

    /// Settle every queued entity on the terrain
    pub fn flush_dirty(&mut self, terrain: &TerrainMap) {
        for id in self.dirty.drain(..) {
            if let Some(entity) = self.entities.get_mut(id) {
                let ground = terrain.height_at(entity.position);
                entity.settle(ground);
            }
        }
    }

    /// Entities still waiting for a flush
    pub fn pending_dirty(&self) -> usize {
        self.dirty.len()
    }
}
