//! Tuning and preferences
//!
//! Persisted as JSON next to the executable (or wherever the host points).
//! Every section falls back to its defaults field by field, so partial files
//! are fine.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::{AnimationSet, EntityKind, EntitySpawn, Team};

/// Errors raised while reading or writing a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Camera feel and input handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    /// Units/second along (right, up, front)
    pub move_speed: Vec3,
    /// Radians/second for (yaw, pitch)
    pub rotation_speed: Vec2,
    /// Pitch limits in radians (negative looks down)
    pub min_view_y: f32,
    pub max_view_y: f32,
    /// Starting view angles (yaw, pitch) in radians
    pub view_angles: Vec2,
    /// Distance from the logical anchor back to the eye
    pub pullback: f32,
    pub min_pullback: f32,
    pub max_pullback: f32,
    /// Pullback change per scroll line
    pub zoom_speed: f32,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Minimum eye height above the terrain
    pub ground_clearance: f32,
    /// Seconds before another click is accepted
    pub click_rearm_delay: f32,
    pub input_queue_capacity: usize,
    /// Cursor travel (pixels) that turns a left click into a box drag
    pub drag_threshold: f32,
    /// Window size in pixels
    pub viewport: Vec2,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_speed: Vec3::new(20.0, 10.0, 20.0),
            rotation_speed: Vec2::new(1.5, 1.0),
            min_view_y: -1.5,
            max_view_y: -0.15,
            view_angles: Vec2::new(0.0, -0.9),
            pullback: 30.0,
            min_pullback: 5.0,
            max_pullback: 80.0,
            zoom_speed: 2.0,
            fov_y: 45.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            ground_clearance: GROUND_CLEARANCE,
            click_rearm_delay: CLICK_REARM_DELAY,
            input_queue_capacity: INPUT_QUEUE_CAPACITY,
            drag_threshold: 6.0,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

/// Fixed-step loop parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimSettings {
    /// Seconds per simulation tick
    pub dt: f32,
    /// Tick cap per rendered frame
    pub max_substeps: u32,
    /// Longest frame the accumulator accepts
    pub max_frame_dt: f32,
    pub max_selected: usize,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
            max_frame_dt: MAX_FRAME_DT,
            max_selected: MAX_SELECTED,
        }
    }
}

impl SimSettings {
    /// Reject values the fixed-step loop cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |field: &'static str, reason: &'static str| -> Result<(), SettingsError> {
            Err(SettingsError::Invalid { field, reason })
        };
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return invalid("sim.dt", "must be a positive number of seconds");
        }
        if self.max_substeps == 0 {
            return invalid("sim.max_substeps", "must be at least 1");
        }
        if !self.max_frame_dt.is_finite() || self.max_frame_dt <= 0.0 {
            return invalid("sim.max_frame_dt", "must be a positive number of seconds");
        }
        Ok(())
    }

    /// Longest frame time one call can fully simulate
    ///
    /// Never more than the substep cap covers, so the accumulator cannot
    /// build a backlog across frames.
    pub fn frame_dt_limit(&self) -> f32 {
        self.max_frame_dt.min(self.dt * self.max_substeps as f32)
    }
}

/// Stats and shape shared by spawned actors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnitTemplate {
    /// World units per second
    pub move_speed: f32,
    pub attack_radius: f32,
    pub attack_damage: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    pub hit_points: f32,
    pub scale: Vec3,
    pub dimensions: Vec3,
    pub dimensions_offset: Vec3,
    /// Height above the terrain surface
    pub offset_y: f32,
    pub animations: AnimationSet,
}

impl Default for UnitTemplate {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            attack_radius: 5.0,
            attack_damage: 25.0,
            attack_cooldown: 1.75,
            hit_points: 100.0,
            scale: Vec3::ONE,
            dimensions: Vec3::new(1.0, 4.0, 1.0),
            dimensions_offset: Vec3::new(0.0, 2.0, 0.0),
            offset_y: 0.0,
            animations: AnimationSet::default(),
        }
    }
}

impl UnitTemplate {
    /// Spawn description for an actor of `team` standing at ground point `at`
    pub fn spawn(&self, team: Team, at: Vec2) -> EntitySpawn {
        EntitySpawn {
            kind: EntityKind::Actor,
            team,
            position: at,
            rotation: Vec3::ZERO,
            scale: self.scale,
            dimensions: self.dimensions,
            dimensions_offset: self.dimensions_offset,
            offset_y: self.offset_y,
            move_speed: self.move_speed,
            attack_radius: self.attack_radius,
            attack_damage: self.attack_damage,
            attack_cooldown: self.attack_cooldown,
            hit_points: self.hit_points,
            animations: self.animations,
        }
    }
}

/// All tuning in one document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraSettings,
    pub sim: SimSettings,
    pub unit: UnitTemplate,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.sim.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read settings, falling back to defaults when missing or malformed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
