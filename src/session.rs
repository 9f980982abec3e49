//! Top-level session: owns terrain, camera and world, and runs the
//! fixed-step loop against variable frame times

use glam::{Mat4, Vec2, Vec3};

use crate::camera::{FrameInput, RtsCamera};
use crate::geom::Aabb;
use crate::settings::{Settings, SimSettings};
use crate::sim::{EntityId, EntitySpawn, Team, TickInput, World, tick};
use crate::terrain::{self, HeightImage, TerrainError, TerrainMap, TerrainMesh};

/// Per-entity state the renderer needs for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    pub id: EntityId,
    pub team: Team,
    pub world_matrix: Mat4,
    pub bbox: Aabb,
    /// Index into the model's clip list and the frame to pose
    pub clip: usize,
    pub frame: u32,
    pub selected: bool,
    pub attack_radius: f32,
}

pub struct Session {
    settings: Settings,
    terrain: TerrainMap,
    mesh: TerrainMesh,
    camera: RtsCamera,
    world: World,
    /// Unsimulated time carried between frames
    accumulator: f32,
}

impl Session {
    pub fn new(mut settings: Settings, heightmap: &HeightImage) -> Result<Self, TerrainError> {
        if let Err(e) = settings.sim.validate() {
            log::warn!("{}; using default loop settings", e);
            settings.sim = SimSettings::default();
        }
        let (terrain, mesh) = terrain::build(heightmap)?;
        let camera = RtsCamera::new(&settings.camera, Vec3::ZERO, &terrain);
        let world = World::new(settings.sim.max_selected);
        log::info!(
            "Session ready: sim dt {:.4}s, up to {} substeps per frame",
            settings.sim.dt,
            settings.sim.max_substeps
        );
        Ok(Self {
            settings,
            terrain,
            mesh,
            camera,
            world,
            accumulator: 0.0,
        })
    }

    /// Run one rendered frame; returns how many simulation ticks ran
    ///
    /// The camera updates once per frame. The simulation then advances in
    /// whole ticks out of the accumulated time, at most `max_substeps` of
    /// them; leftover time carries into the next frame. Frame time beyond
    /// what the substep cap can simulate is dropped.
    pub fn frame(&mut self, input: &FrameInput) -> u32 {
        let sim = &self.settings.sim;
        let dt = input.dt.clamp(0.0, sim.frame_dt_limit());
        let input = FrameInput { dt, ..*input };

        self.camera.update(&input, &self.terrain);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= sim.dt && substeps < sim.max_substeps {
            let click = if self.camera.has_focus() {
                self.camera.take_click()
            } else {
                None
            };
            let tick_input = TickInput {
                click,
                near_plane: self.camera.near_plane(),
                far_plane: self.camera.far_plane(),
            };
            tick(&mut self.world, &self.terrain, &tick_input, sim.dt);
            self.accumulator -= sim.dt;
            substeps += 1;
        }
        substeps
    }

    /// Add an entity already standing on the terrain
    pub fn spawn(&mut self, spawn: &EntitySpawn) -> EntityId {
        let id = self.world.spawn(spawn);
        self.world.flush_dirty(&self.terrain);
        id
    }

    /// Spawn an actor from the configured unit template
    pub fn spawn_unit(&mut self, team: Team, at: Vec2) -> EntityId {
        let spawn = self.settings.unit.spawn(team, at);
        self.spawn(&spawn)
    }

    /// Everything the renderer draws this frame, in slot order
    pub fn entity_views(&self) -> impl Iterator<Item = EntityView> + '_ {
        let selection = self.world.selection();
        self.world.entities().map(move |(id, e)| EntityView {
            id,
            team: e.team,
            world_matrix: e.world_matrix,
            bbox: e.bbox,
            clip: e.anim.clip.index,
            frame: e.anim.frame,
            selected: selection.contains(id),
            attack_radius: e.attack_radius,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.terrain
    }

    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn camera(&self) -> &RtsCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut RtsCamera {
        &mut self.camera
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::EntityState;

    fn gray(level: u8) -> HeightImage {
        HeightImage::from_gray(64, 64, &[level; 64 * 64]).unwrap()
    }

    fn frame(dt: f32) -> FrameInput {
        FrameInput {
            dt,
            cursor: Settings::default().camera.viewport / 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_bad_heightmap() {
        let image = HeightImage::from_gray(1, 1, &[0]);
        assert!(image.is_err());
        let image = HeightImage::new(2, 2, vec![[0; 4]; 4]).unwrap();
        assert!(Session::new(Settings::default(), &image).is_ok());
    }

    #[test]
    fn test_accumulator_runs_whole_ticks() {
        let mut settings = Settings::default();
        settings.sim.dt = 0.25;
        settings.sim.max_substeps = 3;
        settings.sim.max_frame_dt = 2.0;
        let mut session = Session::new(settings, &gray(0)).unwrap();

        assert_eq!(session.frame(&frame(0.5)), 2);
        assert_eq!(session.frame(&frame(0.125)), 0);
        assert_eq!(session.accumulator(), 0.125);
        assert_eq!(session.frame(&frame(0.125)), 1);
        assert_eq!(session.accumulator(), 0.0);

        // Long frames are clamped to what three substeps cover
        assert_eq!(session.frame(&frame(2.0)), 3);
        assert_eq!(session.accumulator(), 0.0);
        // A partial tick carries over but never snowballs
        assert_eq!(session.frame(&frame(0.7)), 2);
        assert!((session.accumulator() - 0.2).abs() < 1e-6);
        for _ in 0..4 {
            assert_eq!(session.frame(&frame(5.0)), 3);
            assert!((session.accumulator() - 0.2).abs() < 1e-6);
        }
        assert_eq!(session.world().time_ticks, 20);
    }

    #[test]
    fn test_unrunnable_loop_settings_fall_back() {
        let mut settings = Settings::default();
        settings.sim.dt = 0.0;
        settings.sim.max_substeps = 0;
        let session = Session::new(settings, &gray(0)).unwrap();
        assert_eq!(session.settings().sim, SimSettings::default());
    }

    #[test]
    fn test_default_frame_clamp() {
        let mut session = Session::new(Settings::default(), &gray(0)).unwrap();
        let ticks = session.frame(&frame(10.0));
        assert!(ticks > 0 && ticks <= session.settings().sim.max_substeps);
        assert!(session.accumulator() < session.settings().sim.max_frame_dt);
    }

    #[test]
    fn test_spawn_settles_on_terrain() {
        let mut session = Session::new(Settings::default(), &gray(128)).unwrap();
        let id = session.spawn_unit(Team::Player, Vec2::new(5.0, 5.0));
        let entity = session.world().get(id).unwrap();
        assert_eq!(entity.position, Vec3::new(5.0, 16.0, 5.0));
        assert!(!entity.is_dirty());

        let view = session.entity_views().next().unwrap();
        assert_eq!(view.id, id);
        assert_eq!(view.world_matrix.w_axis.truncate(), entity.position);
        assert!(!view.selected);
    }

    fn right_click(focused: bool) -> FrameInput {
        let mut input = frame(1.0 / 60.0);
        input.mouse.right = true;
        input.focused = focused;
        input
    }

    #[test]
    fn test_right_click_orders_selected_to_ground() {
        let mut session = Session::new(Settings::default(), &gray(0)).unwrap();
        let id = session.spawn_unit(Team::Player, Vec2::new(5.0, 5.0));
        session.world_mut().selection_mut().add(id);

        // Cursor in the middle looks at the camera anchor on the ground
        session.frame(&right_click(true));
        match session.world().get(id).unwrap().state {
            EntityState::Moving { target } => assert!(target.length() < 0.5, "target {target}"),
            other => panic!("expected a move order, got {:?}", other),
        }
    }

    #[test]
    fn test_unfocused_frames_issue_nothing() {
        let mut session = Session::new(Settings::default(), &gray(0)).unwrap();
        let id = session.spawn_unit(Team::Player, Vec2::new(5.0, 5.0));
        session.world_mut().selection_mut().add(id);

        let ticks = session.frame(&right_click(false));
        assert!(ticks > 0);
        assert_eq!(session.camera().pending_clicks(), 0);
        assert_eq!(session.world().get(id).unwrap().state, EntityState::Idle);
    }
}
