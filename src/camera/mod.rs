//! RTS camera and input handling
//!
//! The camera turns raw per-frame device state into a terrain-clamped eye
//! pose and a short queue of discrete click events for the simulation.

pub mod input;
pub mod rts;

pub use input::{ClickEvent, ClickKind, Control, Controls, FrameInput, InputQueue, MouseButtons};
pub use rts::RtsCamera;
