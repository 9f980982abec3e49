//! Deterministic simulation module
//!
//! All unit logic lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - No randomness
//! - Stable iteration order (entity slot order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod selection;
pub mod state;
pub mod tick;
pub mod world;

pub use collision::{CollisionResult, pick_closest, rect_push_out, resolve_overlaps};
pub use entity::{AnimClip, AnimationSet, AnimationState, Entity, EntityKind, EntitySpawn, Team};
pub use selection::Selection;
pub use state::{AttackPhase, EntityState, Order};
pub use tick::{TickInput, tick};
pub use world::{EntityId, World};
