//! Tool selection and pointer arbitration.

mod arbiter;

pub use arbiter::{
    DownOutcome, MoveOutcome, PointerArbiter, StrokeAction, StrokeSession, UpOutcome,
};

use serde::{Deserialize, Serialize};

/// Tool selected in the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
}

impl Tool {
    /// Display name for this tool.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Fill => "Fill",
        }
    }
}
