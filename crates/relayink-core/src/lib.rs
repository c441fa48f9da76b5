//! RelayInk Core Library
//!
//! Raster drawing engine for frame-by-frame collaborative drawing: pointer
//! arbitration, brush rendering, flood fill, undo and the onion-skin overlay.

pub mod brush;
pub mod color;
pub mod config;
pub mod engine;
pub mod fill;
pub mod history;
pub mod input;
pub mod onion;
pub mod surface;
pub mod tools;
pub mod viewport;

pub use brush::{BrushCatalog, BrushEngine, BrushPreset, BrushRenderer, CatalogError};
pub use color::{ColorError, parse_hex_color};
pub use config::EngineConfig;
pub use engine::{DrawingEngine, EngineError, EngineResult, encode_png};
pub use fill::{FillMask, FloodFill};
pub use history::UndoStack;
pub use input::{Buttons, DeviceKind, InputEvent, PointerId};
pub use onion::{OnionError, OnionOverlay, OnionPlacement};
pub use surface::{PixelBuffer, RasterSurface, Snapshot};
pub use tools::{PointerArbiter, StrokeAction, StrokeSession, Tool};
pub use viewport::Viewport;
