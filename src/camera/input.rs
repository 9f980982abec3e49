//! Per-frame input handed over by the windowing layer, and the click events
//! the camera derives from it

use std::collections::VecDeque;

use glam::{Mat4, Vec2};

use crate::geom::{Ray, Rect};

/// Logical controls the host maps its keys onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    MoveFront,
    MoveBack,
    MoveRight,
    MoveLeft,
    MoveUp,
    MoveDown,
    RotateRight,
    RotateLeft,
    RotateUp,
    RotateDown,
    /// Left click adds to / toggles within the selection
    ModifierAdd,
    /// Right click attacks the picked entity instead of moving
    ModifierAttack,
}

impl Control {
    #[inline]
    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of controls currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls(u16);

impl Controls {
    pub fn press(&mut self, control: Control) {
        self.0 |= control.bit();
    }

    pub fn release(&mut self, control: Control) {
        self.0 &= !control.bit();
    }

    pub fn with(mut self, control: Control) -> Self {
        self.press(control);
        self
    }

    pub fn is_down(&self, control: Control) -> bool {
        self.0 & control.bit() != 0
    }

    /// +1 / -1 / 0 for a pair of opposing controls
    pub fn axis(&self, positive: Control, negative: Control) -> f32 {
        self.is_down(positive) as i32 as f32 - self.is_down(negative) as i32 as f32
    }
}

impl FromIterator<Control> for Controls {
    fn from_iter<I: IntoIterator<Item = Control>>(iter: I) -> Self {
        let mut controls = Controls::default();
        for control in iter {
            controls.press(control);
        }
        controls
    }
}

/// Mouse buttons held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
}

/// Everything the host reports for one rendered frame
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Wall-clock seconds since the previous frame
    pub dt: f32,
    pub controls: Controls,
    pub mouse: MouseButtons,
    /// Cursor in window pixels, origin top-left
    pub cursor: Vec2,
    /// Scroll wheel lines this frame (positive = zoom in)
    pub scroll: f32,
    /// Window has input focus
    pub focused: bool,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            dt: 0.0,
            controls: Controls::default(),
            mouse: MouseButtons::default(),
            cursor: Vec2::ZERO,
            scroll: 0.0,
            focused: true,
        }
    }
}

/// What a point click asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    /// Left click: replace the selection with the picked entity
    Select,
    /// Left click + add modifier: toggle the picked entity
    SelectAdd,
    /// Right click: move selected entities to the ground point
    Order,
    /// Right click + attack modifier: attack the picked entity
    OrderAttack,
}

/// A discrete input event consumed by the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickEvent {
    /// Point click carrying the pick ray through the cursor
    Pick { kind: ClickKind, ray: Ray },
    /// Left drag: select every entity whose projection falls inside `rect`
    Rect {
        rect: Rect,
        add: bool,
        view_projection: Mat4,
        viewport: Vec2,
    },
}

/// Bounded FIFO of pending click events
#[derive(Debug, Clone)]
pub struct InputQueue {
    events: VecDeque<ClickEvent>,
    capacity: usize,
}

impl InputQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Queue an event; returns false (and drops it) when full
    pub fn push(&mut self, event: ClickEvent) -> bool {
        if self.events.len() >= self.capacity {
            log::debug!("Input queue full, dropping {:?}", event);
            return false;
        }
        self.events.push_back(event);
        true
    }

    pub fn pop(&mut self) -> Option<ClickEvent> {
        self.events.pop_front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
