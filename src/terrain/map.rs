//! Elevation grid, coordinate conversion and ground queries

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::consts::{ELEVATION_SCALE, MARCH_COARSE_STEP, MARCH_FINE_STEP};
use crate::geom::{Ray, Rect, barycentric};

/// Errors raised while building a terrain grid
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    #[error("heightmap must be at least 2x2, got {width}x{height}")]
    TooSmall { width: usize, height: usize },
    #[error("heightmap {width}x{height} expects {expected} pixels, got {actual}")]
    PixelCount {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("heightmap {width}x{height} is too large to address")]
    TooLarge { width: usize, height: usize },
}

/// Sample count of a `width` x `height` grid, validated
fn grid_len(width: usize, height: usize) -> Result<usize, TerrainError> {
    if width < 2 || height < 2 {
        return Err(TerrainError::TooSmall { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(TerrainError::TooLarge { width, height })
}

/// Decoded heightmap image handed over by the asset layer (RGBA8, row-major)
#[derive(Debug, Clone)]
pub struct HeightImage {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl HeightImage {
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 4]>) -> Result<Self, TerrainError> {
        let expected = grid_len(width, height)?;
        if pixels.len() != expected {
            return Err(TerrainError::PixelCount {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-channel gray buffer expanded to opaque RGBA
    pub fn from_gray(width: usize, height: usize, gray: &[u8]) -> Result<Self, TerrainError> {
        let pixels = gray.iter().map(|&g| [g, g, g, 255]).collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Channel average of pixel (x, z), alpha ignored
    pub fn intensity(&self, x: usize, z: usize) -> f32 {
        let [r, g, b, _] = self.pixels[z * self.width + x];
        (r as f32 + g as f32 + b as f32) / 3.0
    }
}

/// Step sizes for the coarse-to-fine ground march
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchSteps {
    pub coarse: f32,
    pub fine: f32,
}

impl Default for MarchSteps {
    fn default() -> Self {
        Self {
            coarse: MARCH_COARSE_STEP,
            fine: MARCH_FINE_STEP,
        }
    }
}

/// Elevation grid centred on the world origin
///
/// Sample (x, z) lives at `z * width + x`. Grid space runs from 0 to
/// `width - 1` / `height - 1`; world space is grid space shifted by half the
/// grid size so the terrain is centred on (0, 0). Immutable once built.
#[derive(Debug, Clone)]
pub struct TerrainMap {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl TerrainMap {
    /// Average each pixel's channels and scale to world elevation
    pub fn from_image(image: &HeightImage) -> Result<Self, TerrainError> {
        let mut samples = Vec::with_capacity(image.width * image.height);
        for z in 0..image.height {
            for x in 0..image.width {
                samples.push(image.intensity(x, z) * ELEVATION_SCALE);
            }
        }
        Self::from_samples(image.width, image.height, samples)
    }

    /// Build directly from world elevations (row-major)
    pub fn from_samples(width: usize, height: usize, samples: Vec<f32>) -> Result<Self, TerrainError> {
        let expected = grid_len(width, height)?;
        if samples.len() != expected {
            return Err(TerrainError::PixelCount {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Constant-elevation grid
    pub fn flat(width: usize, height: usize, elevation: f32) -> Result<Self, TerrainError> {
        let len = grid_len(width, height)?;
        Self::from_samples(width, height, vec![elevation; len])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Stored elevation at grid cell (x, z)
    pub fn sample(&self, x: usize, z: usize) -> Option<f32> {
        if x < self.width && z < self.height {
            Some(self.samples[z * self.width + x])
        } else {
            None
        }
    }

    #[inline]
    fn half_extent(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// World (x, z) to grid space; y passes through
    pub fn world_to_grid(&self, world: Vec3) -> Vec3 {
        let half = self.half_extent();
        Vec3::new(world.x + half.x, world.y, world.z + half.y)
    }

    /// Grid space to world (x, z); y passes through
    pub fn grid_to_world(&self, grid: Vec3) -> Vec3 {
        let half = self.half_extent();
        Vec3::new(grid.x - half.x, grid.y, grid.z - half.y)
    }

    /// World-space ground rectangle covered by samples
    pub fn extent(&self) -> Rect {
        let half = self.half_extent();
        Rect::new(
            -half,
            Vec2::new((self.width - 1) as f32, (self.height - 1) as f32) - half,
        )
    }

    /// Whether world (x, z) lies over the grid
    pub fn contains(&self, world: Vec3) -> bool {
        let g = self.world_to_grid(world);
        g.x >= 0.0
            && g.z >= 0.0
            && g.x <= (self.width - 1) as f32
            && g.z <= (self.height - 1) as f32
    }

    /// Interpolated ground height, 0 outside the grid
    pub fn height_at(&self, world: Vec3) -> f32 {
        self.height_at_checked(world).unwrap_or(0.0)
    }

    /// Interpolated ground height, `None` outside the grid
    ///
    /// Each cell is split along its (x, z+1)-(x+1, z) diagonal. Positions with
    /// `fx <= 1 - fz` use the lower-left triangle, the rest the upper-right.
    /// The last row and column are served by their neighbouring cell so every
    /// stored sample is reachable.
    pub fn height_at_checked(&self, world: Vec3) -> Option<f32> {
        if !self.contains(world) {
            return None;
        }
        let g = self.world_to_grid(world);

        let ix = (g.x.floor() as usize).min(self.width - 2);
        let iz = (g.z.floor() as usize).min(self.height - 2);
        let p = Vec2::new(g.x - ix as f32, g.z - iz as f32);

        let h = |dx: usize, dz: usize| self.samples[(iz + dz) * self.width + ix + dx];

        let (corners, heights) = if p.x <= 1.0 - p.y {
            (
                [Vec2::ZERO, Vec2::X, Vec2::Y],
                [h(0, 0), h(1, 0), h(0, 1)],
            )
        } else {
            (
                [Vec2::X, Vec2::ONE, Vec2::Y],
                [h(1, 0), h(1, 1), h(0, 1)],
            )
        };

        let w = barycentric(p, corners[0], corners[1], corners[2]);
        Some(w.x * heights[0] + w.y * heights[1] + w.z * heights[2])
    }

    /// First point where `ray` drops below the ground between `near` and `far`
    pub fn ray_ground_hit(&self, ray: &Ray, near: f32, far: f32) -> Option<Vec3> {
        self.ray_ground_hit_with(ray, near, far, MarchSteps::default())
    }

    /// Sentinel form of [`Self::ray_ground_hit`]: `Vec3::ZERO` on a miss
    pub fn ray_ground_point(&self, ray: &Ray, near: f32, far: f32) -> Vec3 {
        self.ray_ground_hit(ray, near, far).unwrap_or(Vec3::ZERO)
    }

    /// Coarse-to-fine march along `ray`
    ///
    /// Walks in `steps.coarse` increments until the ray is below the surface,
    /// backs up one coarse step and walks forward in `steps.fine` increments
    /// to the first point below the surface. Samples off the grid are skipped.
    pub fn ray_ground_hit_with(
        &self,
        ray: &Ray,
        near: f32,
        far: f32,
        steps: MarchSteps,
    ) -> Option<Vec3> {
        if steps.coarse <= 0.0 || steps.fine <= 0.0 || far < near {
            return None;
        }

        let below = |t: f32| {
            let p = ray.at(t);
            self.height_at_checked(p).filter(|&h| p.y < h).map(|_| p)
        };

        let mut t = near;
        while t <= far {
            if let Some(coarse_hit) = below(t) {
                let mut fine_t = (t - steps.coarse).max(near);
                while fine_t < t {
                    if let Some(hit) = below(fine_t) {
                        return Some(hit);
                    }
                    fine_t += steps.fine;
                }
                return Some(coarse_hit);
            }
            t += steps.coarse;
        }
        None
    }
}
