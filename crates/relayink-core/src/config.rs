//! Engine configuration.

use crate::fill::DEFAULT_TOLERANCE;
use crate::history::MAX_UNDO_HISTORY;
use crate::viewport::{DEFAULT_MARGIN, MAX_ZOOM, MIN_ZOOM};
use serde::{Deserialize, Serialize};

/// Default brush size in logical units.
pub const DEFAULT_BRUSH_SIZE: f64 = 8.0;

/// Largest device-pixel width or height accepted for a surface.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// Largest RGBA buffer accepted for a surface (256 MiB).
pub const MAX_SURFACE_BYTES: u64 = 256 * 1024 * 1024;

/// Tunables for a [`DrawingEngine`](crate::engine::DrawingEngine).
///
/// Every field has a default, so a partial JSON object deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Undo snapshots kept before the oldest is evicted.
    pub undo_capacity: usize,
    /// Per-channel flood fill tolerance.
    pub fill_tolerance: u8,
    /// Space reserved around the surface when fitting it to the viewport.
    pub viewport_margin: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub default_brush_size: f64,
    /// Device-pixel limit per surface side.
    pub max_surface_side: u32,
    /// Byte limit for one surface buffer. Undo snapshots are the same size.
    pub max_surface_bytes: u64,
    /// Fixed seed for spray and jitter randomness.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_capacity: MAX_UNDO_HISTORY,
            fill_tolerance: DEFAULT_TOLERANCE,
            viewport_margin: DEFAULT_MARGIN,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            default_brush_size: DEFAULT_BRUSH_SIZE,
            max_surface_side: MAX_SURFACE_SIDE,
            max_surface_bytes: MAX_SURFACE_BYTES,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}
