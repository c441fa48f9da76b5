//! Normalized pointer input for mouse, pen and touch devices.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Identifier of one physical pointer stream.
pub type PointerId = u32;

/// Kind of device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Pressed-button bitmask, using the pointer-events bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    /// Left mouse button, pen tip contact, or touch contact.
    pub const PRIMARY: Buttons = Buttons(1);
    /// Right mouse button or pen barrel button.
    pub const SECONDARY: Buttons = Buttons(2);
    pub const MIDDLE: Buttons = Buttons(4);
    /// Pen eraser end.
    pub const ERASER: Buttons = Buttons(32);

    pub const fn from_bits(bits: u8) -> Self {
        Buttons(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if every button in `other` is pressed.
    pub const fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

/// A pointer event with device quirks already normalized away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub pointer_id: PointerId,
    pub device: DeviceKind,
    pub buttons: Buttons,
    /// Position in device pixels relative to the surface element.
    pub position: Point,
    /// Raw screen position, used for pan deltas.
    pub screen: Point,
}

impl InputEvent {
    /// Create an event whose screen position equals its surface position.
    pub fn new(
        pointer_id: PointerId,
        device: DeviceKind,
        buttons: Buttons,
        position: Point,
    ) -> Self {
        Self {
            pointer_id,
            device,
            buttons,
            position,
            screen: position,
        }
    }

    pub fn mouse(pointer_id: PointerId, buttons: Buttons, position: Point) -> Self {
        Self::new(pointer_id, DeviceKind::Mouse, buttons, position)
    }

    pub fn pen(pointer_id: PointerId, buttons: Buttons, position: Point) -> Self {
        Self::new(pointer_id, DeviceKind::Pen, buttons, position)
    }

    pub fn touch(pointer_id: PointerId, position: Point) -> Self {
        Self::new(pointer_id, DeviceKind::Touch, Buttons::PRIMARY, position)
    }

    /// Override the raw screen position.
    pub fn with_screen(mut self, screen: Point) -> Self {
        self.screen = screen;
        self
    }
}
