//! Shared geometry: rays, boxes and ground-plane rectangles

use glam::{Vec2, Vec3};

/// A ray with a unit-length direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray, normalizing `direction` (zero stays zero)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of size `dimensions` centred on `position + offset`
    pub fn around(position: Vec3, dimensions: Vec3, offset: Vec3) -> Self {
        let center = position + offset;
        let half = dimensions / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Shift both corners by `delta`
    pub fn translate(&mut self, delta: Vec3) {
        self.min += delta;
        self.max += delta;
    }

    /// Footprint of the box on the ground plane
    pub fn ground_rect(&self) -> Rect {
        Rect::new(Vec2::new(self.min.x, self.min.z), Vec2::new(self.max.x, self.max.z))
    }

    /// Distance along `ray` to the first intersection (slab test)
    ///
    /// A ray starting inside the box hits at distance 0.
    pub fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if dir.abs() < f32::EPSILON {
                // Parallel to this slab: must already be between the planes
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        if t_far < 0.0 {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

/// Rectangle on the ground plane (x, z)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle spanning two arbitrary corners
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap: touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Rect {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.min += delta;
        self.max += delta;
    }
}

/// Barycentric weights (u, v, w) of `p` with respect to triangle (a, b, c)
///
/// `p = u*a + v*b + w*c`. Degenerate triangles return (1, 0, 0).
pub fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Vec3 {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f32::EPSILON {
        return Vec3::X;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Vec3::new(1.0 - v - w, v, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_box_in_front() {
        let bbox = Aabb::around(Vec3::new(0.0, 0.0, 10.0), Vec3::ONE * 2.0, Vec3::ZERO);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let t = bbox.ray_distance(&ray).unwrap();
        assert!((t - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_box_behind_and_beside() {
        let bbox = Aabb::around(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE, Vec3::ZERO);
        assert!(bbox.ray_distance(&Ray::new(Vec3::ZERO, Vec3::Z)).is_none());

        let bbox = Aabb::around(Vec3::new(5.0, 0.0, 10.0), Vec3::ONE, Vec3::ZERO);
        assert!(bbox.ray_distance(&Ray::new(Vec3::ZERO, Vec3::Z)).is_none());
    }

    #[test]
    fn test_ray_from_inside_box() {
        let bbox = Aabb::around(Vec3::ZERO, Vec3::ONE * 4.0, Vec3::ZERO);
        assert_eq!(bbox.ray_distance(&Ray::new(Vec3::ZERO, Vec3::X)), Some(0.0));
    }

    #[test]
    fn test_aabb_offset_and_translate() {
        let mut bbox = Aabb::around(Vec3::ZERO, Vec3::new(1.0, 4.0, 1.0), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(bbox.min, Vec3::new(-0.5, 0.0, -0.5));
        assert_eq!(bbox.max, Vec3::new(0.5, 4.0, 0.5));

        bbox.translate(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(bbox, Aabb::around(Vec3::ONE, Vec3::new(1.0, 4.0, 1.0), Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_rect_overlap_is_strict() {
        let a = Rect::new(Vec2::ZERO, Vec2::ONE);
        let touching = Rect::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        assert!(!a.overlaps(&touching));

        let b = Rect::new(Vec2::new(0.75, 0.5), Vec2::new(1.75, 1.5));
        let overlap = a.intersection(&b).unwrap();
        assert!((overlap.width() - 0.25).abs() < 1e-6);
        assert!((overlap.height() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_barycentric_corners() {
        let (a, b, c) = (Vec2::ZERO, Vec2::X, Vec2::Y);
        assert_eq!(barycentric(a, a, b, c), Vec3::X);
        assert_eq!(barycentric(b, a, b, c), Vec3::Y);
        assert_eq!(barycentric(c, a, b, c), Vec3::Z);

        let w = barycentric(Vec2::new(0.25, 0.25), a, b, c);
        assert!((w.x - 0.5).abs() < 1e-6);
        assert!((w.y - 0.25).abs() < 1e-6);
        assert!((w.z - 0.25).abs() < 1e-6);
    }
}
