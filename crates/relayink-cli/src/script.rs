//! JSON session scripts: a surface description plus a list of host actions.

use kurbo::Point;
use relayink_core::{
    Buttons, DeviceKind, EngineConfig, InputEvent, OnionPlacement, PointerId, Tool,
};
use serde::{Deserialize, Serialize};

fn default_dpr() -> f64 {
    1.0
}

fn primary() -> Buttons {
    Buttons::PRIMARY
}

/// A recorded or hand-written drawing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Logical surface width.
    pub width: u32,
    /// Logical surface height.
    pub height: u32,
    #[serde(default = "default_dpr")]
    pub dpr: f64,
    /// Engine settings; defaults when omitted.
    #[serde(default)]
    pub config: EngineConfig,
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One raw pointer event. Positions are device pixels relative to the surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerStep {
    #[serde(default)]
    pub pointer: PointerId,
    #[serde(default)]
    pub device: DeviceKind,
    #[serde(default = "primary")]
    pub buttons: Buttons,
    pub x: f64,
    pub y: f64,
    /// Raw screen position; defaults to `(x, y)`.
    #[serde(default)]
    pub screen: Option<(f64, f64)>,
}

impl PointerStep {
    pub fn to_event(&self) -> InputEvent {
        let position = Point::new(self.x, self.y);
        let event = InputEvent::new(self.pointer, self.device, self.buttons, position);
        match self.screen {
            Some((sx, sy)) => event.with_screen(Point::new(sx, sy)),
            None => event,
        }
    }
}

/// A single host action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Color { hex: String },
    Preset { id: String },
    Size { size: f64 },
    Tool { tool: Tool },
    Zoom { zoom: f64 },
    /// Resize the container the surface is shown in.
    Resize { width: f64, height: f64 },
    Disable { disabled: bool },
    Down(PointerStep),
    Move(PointerStep),
    Up(PointerStep),
    Leave(PointerStep),
    /// Shorthand for down, moves through every point, then up.
    Stroke {
        #[serde(default)]
        pointer: PointerId,
        #[serde(default)]
        device: DeviceKind,
        points: Vec<(f64, f64)>,
    },
    /// Flood fill at a logical point, bypassing pointer input.
    Fill { x: f64, y: f64 },
    Undo,
    Clear,
    Reference { source: String },
    ClearReference,
    Onion {
        #[serde(default)]
        opacity: Option<f32>,
        #[serde(default)]
        placement: Option<OnionPlacement>,
    },
}
