//! RTS-style free camera
//!
//! Camera model:
//!   - A logical anchor `position` the player flies around
//!   - View angles (yaw, pitch); pitch is clamped so the view never flips
//!   - The render eye trails the anchor by `pullback` along the view
//!     direction and is pushed up so it never dips below the terrain
//!   - Mouse transitions become queued click events; the simulation takes
//!     one at a time, with a re-arm delay between accepted clicks

use glam::{Mat4, Vec2, Vec3};

use super::input::{ClickEvent, ClickKind, Control, Controls, FrameInput, InputQueue, MouseButtons};
use crate::geom::{Ray, Rect};
use crate::settings::CameraSettings;
use crate::terrain::TerrainMap;

pub struct RtsCamera {
    cfg: CameraSettings,
    /// Logical anchor, independent of terrain height
    position: Vec3,
    /// (yaw, pitch) in radians
    view_angles: Vec2,
    pullback: f32,
    /// Render eye derived from anchor, angles and pullback
    eye: Vec3,
    viewport: Vec2,
    cursor: Vec2,
    controls: Controls,
    mouse: MouseButtons,
    /// Cursor position when the left button went down
    drag_start: Option<Vec2>,
    queue: InputQueue,
    /// Seconds until the next click may be taken
    click_timer: f32,
    focused: bool,
}

impl RtsCamera {
    pub fn new(cfg: &CameraSettings, position: Vec3, terrain: &TerrainMap) -> Self {
        let mut camera = Self {
            cfg: cfg.clone(),
            position,
            view_angles: Vec2::new(
                cfg.view_angles.x,
                cfg.view_angles.y.clamp(cfg.min_view_y, cfg.max_view_y),
            ),
            pullback: cfg.pullback.clamp(cfg.min_pullback, cfg.max_pullback),
            eye: position,
            viewport: cfg.viewport,
            cursor: cfg.viewport / 2.0,
            controls: Controls::default(),
            mouse: MouseButtons::default(),
            drag_start: None,
            queue: InputQueue::new(cfg.input_queue_capacity),
            click_timer: 0.0,
            focused: true,
        };
        camera.refresh_eye(terrain);
        camera
    }

    /// Advance one rendered frame
    pub fn update(&mut self, input: &FrameInput, terrain: &TerrainMap) {
        let dt = input.dt;
        self.click_timer = (self.click_timer - dt).max(0.0);
        self.cursor = input.cursor;
        self.focused = input.focused;

        if !input.focused {
            // Drop anything half-finished; focus loss is not a click
            self.queue.clear();
            self.drag_start = None;
            self.controls = Controls::default();
            self.mouse = input.mouse;
            self.refresh_eye(terrain);
            return;
        }

        let c = input.controls;

        // Rotation
        let yaw_axis = c.axis(Control::RotateLeft, Control::RotateRight);
        let pitch_axis = c.axis(Control::RotateUp, Control::RotateDown);
        self.view_angles.x += yaw_axis * self.cfg.rotation_speed.x * dt;
        self.view_angles.y = (self.view_angles.y + pitch_axis * self.cfg.rotation_speed.y * dt)
            .clamp(self.cfg.min_view_y, self.cfg.max_view_y);

        // Translation on the ground plane relative to yaw, plus vertical
        let speed = self.cfg.move_speed;
        let forward = self.ground_forward();
        let right = self.ground_right();
        self.position += right * c.axis(Control::MoveRight, Control::MoveLeft) * speed.x * dt
            + Vec3::Y * c.axis(Control::MoveUp, Control::MoveDown) * speed.y * dt
            + forward * c.axis(Control::MoveFront, Control::MoveBack) * speed.z * dt;

        // Zoom
        self.pullback = (self.pullback - input.scroll * self.cfg.zoom_speed)
            .clamp(self.cfg.min_pullback, self.cfg.max_pullback);

        self.refresh_eye(terrain);
        self.queue_mouse_events(input.mouse, c);

        self.controls = c;
        self.mouse = input.mouse;
    }

    /// Turn button transitions into click events
    ///
    /// Right fires on press. Left fires on release so a drag can become a
    /// box selection.
    fn queue_mouse_events(&mut self, mouse: MouseButtons, controls: Controls) {
        if mouse.right && !self.mouse.right {
            let kind = if controls.is_down(Control::ModifierAttack) {
                ClickKind::OrderAttack
            } else {
                ClickKind::Order
            };
            self.queue.push(ClickEvent::Pick {
                kind,
                ray: self.view_ray(),
            });
        }

        if mouse.left && !self.mouse.left {
            self.drag_start = Some(self.cursor);
        }

        if !mouse.left && self.mouse.left {
            if let Some(start) = self.drag_start.take() {
                let add = controls.is_down(Control::ModifierAdd);
                let event = if start.distance(self.cursor) > self.cfg.drag_threshold {
                    ClickEvent::Rect {
                        rect: Rect::from_corners(start, self.cursor),
                        add,
                        view_projection: self.view_projection(),
                        viewport: self.viewport,
                    }
                } else {
                    ClickEvent::Pick {
                        kind: if add { ClickKind::SelectAdd } else { ClickKind::Select },
                        ray: self.view_ray(),
                    }
                };
                self.queue.push(event);
            }
        }
    }

    /// Take the next click if the re-arm delay has elapsed
    pub fn take_click(&mut self) -> Option<ClickEvent> {
        if self.click_timer > 0.0 {
            return None;
        }
        let click = self.queue.pop()?;
        self.click_timer = self.cfg.click_rearm_delay;
        Some(click)
    }

    pub fn pending_clicks(&self) -> usize {
        self.queue.len()
    }

    /// Recompute the eye from anchor, angles and pullback, clamped above ground
    fn refresh_eye(&mut self, terrain: &TerrainMap) {
        let mut eye = self.position - self.forward() * self.pullback;
        let floor = terrain.height_at(eye) + self.cfg.ground_clearance;
        eye.y = eye.y.max(floor);
        self.eye = eye;
    }

    /// Unit view direction
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.view_angles.x, self.view_angles.y);
        Vec3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos())
    }

    fn ground_forward(&self) -> Vec3 {
        let yaw = self.view_angles.x;
        Vec3::new(yaw.sin(), 0.0, yaw.cos())
    }

    fn ground_right(&self) -> Vec3 {
        let yaw = self.view_angles.x;
        Vec3::new(-yaw.cos(), 0.0, yaw.sin())
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3, terrain: &TerrainMap) {
        self.position = position;
        self.refresh_eye(terrain);
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn view_angles(&self) -> Vec2 {
        self.view_angles
    }

    pub fn pullback(&self) -> f32 {
        self.pullback
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn near_plane(&self) -> f32 {
        self.cfg.near_plane
    }

    pub fn far_plane(&self) -> f32 {
        self.cfg.far_plane
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.eye, self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        };
        Mat4::perspective_rh(
            self.cfg.fov_y.to_radians(),
            aspect,
            self.cfg.near_plane,
            self.cfg.far_plane,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Pick ray from the eye through the current cursor
    pub fn view_ray(&self) -> Ray {
        self.ray_through(self.cursor)
    }

    /// Pick ray from the eye through a window pixel
    ///
    /// With no usable viewport (e.g. a minimised window) this is the view
    /// axis.
    pub fn ray_through(&self, screen: Vec2) -> Ray {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return Ray::new(self.eye, self.forward());
        }
        let ndc = Vec2::new(
            2.0 * screen.x / self.viewport.x - 1.0,
            1.0 - 2.0 * screen.y / self.viewport.y,
        );
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(self.eye, far - near)
    }

    /// Window pixel of a world point, `None` when behind the eye
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        project_to_screen(&self.view_projection(), self.viewport, world)
    }
}

/// Window pixel of `world` under `view_projection`, `None` when behind the eye
pub fn project_to_screen(view_projection: &Mat4, viewport: Vec2, world: Vec3) -> Option<Vec2> {
    let clip = *view_projection * world.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.x,
        (1.0 - ndc.y) * 0.5 * viewport.y,
    ))
}
