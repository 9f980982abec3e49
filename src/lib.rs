//! Heightfield RTS - terrain, camera and unit simulation core
//!
//! Core modules:
//! - `terrain`: Heightmap grid, height sampling, ray/ground intersection, ground mesh
//! - `camera`: RTS camera pose, control input, click events and pick rays
//! - `sim`: Deterministic fixed-step unit simulation (orders, movement, combat)
//! - `session`: Owns everything and sequences camera update + sim ticks per frame
//! - `settings`: Data-driven tuning loaded from JSON
//!
//! Window/input plumbing, asset loading and draw calls live with the host
//! application. The host feeds a [`camera::FrameInput`] per frame and reads
//! transforms, animation frames and the selection back out.

pub mod camera;
pub mod geom;
pub mod session;
pub mod settings;
pub mod sim;
pub mod terrain;

pub use session::Session;
pub use settings::Settings;

use glam::{Vec2, Vec3};

/// Simulation and world constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the accumulator will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Heightmap intensity (0-255 gray) to world elevation
    pub const ELEVATION_SCALE: f32 = 32.0 / 256.0;

    /// Ray/ground march step sizes (world units)
    pub const MARCH_COARSE_STEP: f32 = 1.0;
    pub const MARCH_FINE_STEP: f32 = 0.1;

    /// Selection capacity
    pub const MAX_SELECTED: usize = 32;

    /// Delay before another click is accepted (seconds)
    pub const CLICK_REARM_DELAY: f32 = 0.2;
    /// Pending click events kept by the camera
    pub const INPUT_QUEUE_CAPACITY: usize = 8;

    /// Keeps the camera eye above the terrain surface
    pub const GROUND_CLEARANCE: f32 = 0.5;
}

/// Drop the vertical component: world (x, y, z) -> ground (x, z)
#[inline]
pub fn ground(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Lift a ground-plane point back into world space at height `y`
#[inline]
pub fn lift(p: Vec2, y: f32) -> Vec3 {
    Vec3::new(p.x, y, p.y)
}
