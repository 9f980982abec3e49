//! Ground-plane push-apart and pick-ray hit testing
//!
//! Units only ever push themselves out of each other's footprints; there is
//! no velocity response. Overlaps are resolved one pair at a time in the
//! order given, so a pile-up can keep a little residual overlap until the
//! next tick.

use glam::Vec2;

use super::world::EntityId;
use crate::geom::{Aabb, Ray, Rect};

/// Result of a footprint overlap check
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResult {
    /// Whether the rectangles overlapped
    pub hit: bool,
    /// Displacement that separates the mover (zero on a miss)
    pub push: Vec2,
    /// Overlap extent along the push axis
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            push: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Push `mover` out of `other` along the axis of smaller overlap
///
/// The push direction follows where `mover_pos` sits relative to the centre
/// of `other`; dead centre pushes towards +x / +z.
pub fn rect_push_out(mover: &Rect, mover_pos: Vec2, other: &Rect) -> CollisionResult {
    let Some(overlap) = mover.intersection(other) else {
        return CollisionResult::miss();
    };

    let center = other.center();
    let (width, depth) = (overlap.width(), overlap.height());
    let side = |own: f32, theirs: f32| if own < theirs { -1.0 } else { 1.0 };

    let (push, penetration) = if width < depth {
        (Vec2::new(side(mover_pos.x, center.x) * width, 0.0), width)
    } else {
        (Vec2::new(0.0, side(mover_pos.y, center.y) * depth), depth)
    };

    CollisionResult {
        hit: true,
        push,
        penetration,
    }
}

/// Resolve `mover` against each of `others` in turn
///
/// The mover's rectangle follows each push before the next pair is tested.
/// Returns the total displacement to apply to the mover.
pub fn resolve_overlaps(
    mut mover: Rect,
    mover_pos: Vec2,
    others: impl IntoIterator<Item = Rect>,
) -> Vec2 {
    let mut total = Vec2::ZERO;
    for other in others {
        let result = rect_push_out(&mover, mover_pos + total, &other);
        if result.hit {
            mover.translate(result.push);
            total += result.push;
        }
    }
    total
}

/// Closest box along `ray`
///
/// Ties keep the first candidate seen.
pub fn pick_closest(ray: &Ray, candidates: impl IntoIterator<Item = (EntityId, Aabb)>) -> Option<EntityId> {
    let mut best: Option<(EntityId, f32)> = None;
    for (id, bbox) in candidates {
        if let Some(distance) = bbox.ray_distance(ray) {
            if best.is_none_or(|(_, closest)| distance < closest) {
                best = Some((id, distance));
            }
        }
    }
    best.map(|(id, _)| id)
}
