//! Entity data: transform, bounds, combat stats and animation playback

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::state::{EntityState, Order};
use crate::geom::{Aabb, Rect};
use crate::{ground, lift};

/// Which side an entity fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Team {
    #[default]
    Player,
    Ai,
}

/// Actors take part in the simulation; empty entities are inert markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EntityKind {
    Empty,
    #[default]
    Actor,
}

/// One animation clip of a model: its index in the model's clip list and
/// its length in frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimClip {
    pub index: usize,
    pub frames: u32,
}

impl AnimClip {
    pub const fn new(index: usize, frames: u32) -> Self {
        Self { index, frames }
    }

    /// Frame count, never zero
    #[inline]
    fn len(&self) -> u32 {
        self.frames.max(1)
    }
}

/// Clips an actor needs, supplied by the asset layer at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSet {
    pub idle: AnimClip,
    pub moving: AnimClip,
    pub attack: AnimClip,
    pub death: AnimClip,
}

impl Default for AnimationSet {
    /// Clip layout of the stock robot model
    fn default() -> Self {
        Self {
            death: AnimClip::new(1, 48),
            idle: AnimClip::new(2, 60),
            attack: AnimClip::new(5, 30),
            moving: AnimClip::new(10, 40),
        }
    }
}

/// Current clip and frame
///
/// A freshly started clip shows frame 0 for the tick it was started in and
/// only begins advancing on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub clip: AnimClip,
    pub frame: u32,
    hold: bool,
}

impl AnimationState {
    pub fn new(clip: AnimClip) -> Self {
        Self {
            clip,
            frame: 0,
            hold: true,
        }
    }

    /// Restart from frame 0 with `clip`
    pub fn play(&mut self, clip: AnimClip) {
        *self = Self::new(clip);
    }

    /// Start `clip` unless it is already playing
    pub fn ensure(&mut self, clip: AnimClip) {
        if self.clip != clip {
            self.play(clip);
        }
    }

    /// Looping playback
    pub fn advance_loop(&mut self) {
        if std::mem::take(&mut self.hold) {
            return;
        }
        self.frame = (self.frame + 1) % self.clip.len();
    }

    /// One-shot playback; true once the final frame has been played out.
    /// The frame then rests on the last frame of the clip.
    pub fn advance_once(&mut self) -> bool {
        if std::mem::take(&mut self.hold) {
            return false;
        }
        self.frame += 1;
        if self.frame >= self.clip.len() {
            self.frame = self.clip.len() - 1;
            return true;
        }
        false
    }
}

/// Everything needed to place a new entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpawn {
    pub kind: EntityKind,
    pub team: Team,
    /// Ground-plane position (x, z)
    pub position: Vec2,
    /// Euler angles in radians (x, y = yaw, z)
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Bounding box size and its offset from the entity origin
    pub dimensions: Vec3,
    pub dimensions_offset: Vec3,
    /// Height above the terrain surface
    pub offset_y: f32,
    /// World units per second
    pub move_speed: f32,
    pub attack_radius: f32,
    pub attack_damage: f32,
    pub attack_cooldown: f32,
    pub hit_points: f32,
    pub animations: AnimationSet,
}

/// A simulated entity
#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    pub team: Team,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub dimensions: Vec3,
    pub dimensions_offset: Vec3,
    pub offset_y: f32,
    /// World-space bounds; kept equal to `Aabb::around(position, ..)` by
    /// translating with each recompute
    pub bbox: Aabb,
    pub world_matrix: Mat4,

    pub move_speed: f32,
    pub hit_points: f32,
    pub attack_damage: f32,
    pub attack_radius: f32,
    pub attack_cooldown_max: f32,
    /// Seconds until the next attack may start
    pub attack_cooldown: f32,

    pub state: EntityState,
    /// Order received mid-swing, applied when the swing resolves
    pub pending_order: Option<Order>,
    pub animations: AnimationSet,
    pub anim: AnimationState,

    /// Awaiting transform/bbox recompute
    pub(crate) dirty: bool,
    /// Position at the last recompute; the bbox is translated from here
    pub(crate) settled_position: Vec3,
}

impl Entity {
    pub fn new(spawn: &EntitySpawn) -> Self {
        let position = lift(spawn.position, spawn.offset_y);
        let bbox = Aabb::around(position, spawn.dimensions, spawn.dimensions_offset);
        Self {
            kind: spawn.kind,
            team: spawn.team,
            position,
            rotation: spawn.rotation,
            scale: spawn.scale,
            dimensions: spawn.dimensions,
            dimensions_offset: spawn.dimensions_offset,
            offset_y: spawn.offset_y,
            bbox,
            world_matrix: Mat4::IDENTITY,
            move_speed: spawn.move_speed,
            hit_points: spawn.hit_points,
            attack_damage: spawn.attack_damage,
            attack_radius: spawn.attack_radius,
            attack_cooldown_max: spawn.attack_cooldown,
            attack_cooldown: 0.0,
            state: EntityState::Idle,
            pending_order: None,
            animations: spawn.animations,
            anim: AnimationState::new(spawn.animations.idle),
            dirty: true,
            settled_position: position,
        }
    }

    /// Whether the transform and bbox lag behind the position
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_actor(&self) -> bool {
        self.kind == EntityKind::Actor
    }

    /// Position on the ground plane (x, z)
    pub fn ground_position(&self) -> Vec2 {
        ground(self.position)
    }

    /// Ground-plane collision rectangle at the current position
    pub fn footprint(&self) -> Rect {
        Aabb::around(self.position, self.dimensions, self.dimensions_offset).ground_rect()
    }

    /// Whether `point` lies within attack range (inclusive circle test)
    pub fn in_attack_range(&self, point: Vec2) -> bool {
        self.ground_position().distance(point) <= self.attack_radius
    }

    /// Snap to terrain height, rebuild the world matrix and move the bbox by
    /// the distance travelled since the last recompute
    pub fn settle(&mut self, ground_height: f32) {
        self.position.y = ground_height + self.offset_y;
        let rotation = Quat::from_euler(
            glam::EulerRot::ZYX,
            self.rotation.z,
            self.rotation.y,
            self.rotation.x,
        );
        self.world_matrix = Mat4::from_scale_rotation_translation(self.scale, rotation, self.position);
        self.bbox.translate(self.position - self.settled_position);
        self.settled_position = self.position;
        self.dirty = false;
    }
}
