//! The drawing engine facade tying input, brushes, fill and history together.

use crate::brush::{BrushCatalog, BrushPreset, BrushRenderer, erase_segment};
use crate::color::{ColorError, WHITE, parse_hex_color, to_hex};
use crate::config::EngineConfig;
use crate::fill::FloodFill;
use crate::history::UndoStack;
use crate::input::InputEvent;
use crate::onion::{OnionError, OnionOverlay, OnionPlacement};
use crate::surface::{PixelBuffer, RasterSurface};
use crate::tools::{DownOutcome, MoveOutcome, PointerArbiter, StrokeAction, Tool, UpOutcome};
use crate::viewport::Viewport;
use kurbo::{Point, Size};
use peniko::Color;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Drawing surface is not initialized")]
    NotInitialized,
    #[error("Surface {width}x{height} at {device_pixel_ratio}x exceeds the configured limit")]
    SurfaceTooLarge {
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
    },
    #[error("Unknown brush preset: {0}")]
    UnknownPreset(String),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Onion(#[from] OnionError),
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Interactive raster drawing engine.
///
/// Owns the surface, the viewport, pointer arbitration, undo history and
/// the onion overlay. Pointer handlers never fail: while the engine is
/// disabled or has no surface they do nothing.
#[derive(Debug)]
pub struct DrawingEngine {
    config: EngineConfig,
    catalog: BrushCatalog,
    surface: Option<PixelBuffer>,
    viewport: Option<Viewport>,
    arbiter: PointerArbiter,
    history: UndoStack,
    onion: OnionOverlay,
    rng: StdRng,
    tool: Tool,
    color: Color,
    brush_size: f64,
    preset_id: String,
    disabled: bool,
}

impl Default for DrawingEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DrawingEngine {
    /// Create an engine using the built-in brush catalog.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_catalog(config, BrushCatalog::builtin().clone())
    }

    /// Create an engine with a custom brush catalog.
    pub fn with_catalog(config: EngineConfig, catalog: BrushCatalog) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let preset_id = catalog.default_preset().id.clone();

        Self {
            history: UndoStack::with_capacity(config.undo_capacity),
            brush_size: config.default_brush_size,
            catalog,
            surface: None,
            viewport: None,
            arbiter: PointerArbiter::new(),
            onion: OnionOverlay::new(),
            rng,
            tool: Tool::default(),
            color: Color::BLACK,
            preset_id,
            disabled: false,
            config,
        }
    }

    /// Create a white surface of the given logical size.
    ///
    /// Undo history and live pointer sessions are discarded. A container size
    /// set earlier with [`resize_viewport`](Self::resize_viewport) is kept.
    /// A size over the configured surface limits is rejected and the current
    /// surface stays in place.
    pub fn initialize_surface(
        &mut self,
        logical_width: u32,
        logical_height: u32,
        device_pixel_ratio: f64,
    ) -> EngineResult<()> {
        let Some(surface) = PixelBuffer::try_new(
            logical_width,
            logical_height,
            device_pixel_ratio,
            self.config.max_surface_side,
            self.config.max_surface_bytes,
        ) else {
            log::warn!(
                "Rejected {}x{} surface at {}x",
                logical_width,
                logical_height,
                device_pixel_ratio
            );
            return Err(EngineError::SurfaceTooLarge {
                width: logical_width,
                height: logical_height,
                device_pixel_ratio,
            });
        };

        let mut viewport = Viewport::new(surface.logical_size(), surface.device_pixel_ratio());
        viewport.margin = self.config.viewport_margin;
        viewport.min_zoom = self.config.min_zoom;
        viewport.max_zoom = self.config.max_zoom;
        if let Some(previous) = &self.viewport {
            viewport.resize(previous.viewport_size);
        }

        log::info!(
            "Initialized {}x{} surface at {}x ({}x{} px)",
            logical_width,
            logical_height,
            surface.device_pixel_ratio(),
            surface.width(),
            surface.height()
        );

        self.surface = Some(surface);
        self.viewport = Some(viewport);
        self.history.clear();
        self.arbiter.cancel_all();
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &BrushCatalog {
        &self.catalog
    }

    /// The drawing surface, once initialized.
    pub fn surface(&self) -> Option<&PixelBuffer> {
        self.surface.as_ref()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn arbiter(&self) -> &PointerArbiter {
        &self.arbiter
    }

    // --- Host controls ---

    /// Enable or disable input. Disabling cancels any live stroke or pan.
    pub fn set_disabled(&mut self, disabled: bool) {
        if disabled && !self.disabled {
            self.arbiter.cancel_all();
            log::debug!("Engine disabled");
        }
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            log::debug!("Tool changed: {} -> {}", self.tool.name(), tool.name());
        }
        self.tool = tool;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Set the active color from `#RGB` or `#RRGGBB`.
    ///
    /// Malformed input is rejected and the previous color stays active.
    pub fn set_color_hex(&mut self, hex: &str) -> EngineResult<()> {
        match parse_hex_color(hex) {
            Ok(color) => {
                self.color = color;
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected color {:?}, keeping {}", hex, to_hex(self.color));
                Err(e.into())
            }
        }
    }

    pub fn brush_size(&self) -> f64 {
        self.brush_size
    }

    /// Set the brush size in logical units. Non-positive sizes are ignored.
    pub fn set_brush_size(&mut self, size: f64) {
        if size.is_finite() && size > 0.0 {
            self.brush_size = size.max(0.5);
        } else {
            log::warn!("Ignoring brush size {size}");
        }
    }

    /// The selected preset.
    pub fn preset(&self) -> &BrushPreset {
        lookup_preset(&self.catalog, &self.preset_id)
    }

    /// Select a preset by id; the brush size resets to the preset's size.
    pub fn select_preset(&mut self, id: &str) -> EngineResult<()> {
        let preset = self
            .catalog
            .get(id)
            .ok_or_else(|| EngineError::UnknownPreset(id.to_string()))?;
        self.brush_size = preset.size;
        self.preset_id = preset.id.clone();
        log::debug!("Selected preset {} ({})", preset.id, preset.engine.name());
        Ok(())
    }

    /// Set the user zoom. Ignored until a surface exists.
    pub fn set_user_zoom(&mut self, zoom: f64) {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.set_user_zoom(zoom);
        }
    }

    /// Set the size of the container the surface is displayed in.
    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.resize(Size::new(width, height));
        }
    }

    // --- Edits ---

    /// Repaint the surface white. Undoable.
    pub fn clear(&mut self) -> EngineResult<()> {
        let surface = self.surface.as_mut().ok_or(EngineError::NotInitialized)?;
        self.history.snapshot(surface);
        surface.fill(WHITE);
        Ok(())
    }

    /// Restore the most recent snapshot. Returns false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.surface.as_mut() {
            Some(surface) => self.history.undo(surface),
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Flood fill at a logical point with the active color and preset.
    ///
    /// Returns false (and records no undo step) when the seed is outside
    /// the surface or nothing would change.
    pub fn flood_fill(&mut self, logical: Point) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        let preset = lookup_preset(&self.catalog, &self.preset_id);
        let fill = FloodFill::new(self.color, self.brush_size, preset)
            .with_tolerance(self.config.fill_tolerance);

        let Some(mask) = fill.mask_at(surface, logical) else {
            log::trace!("Fill at ({:.1}, {:.1}) is a no-op", logical.x, logical.y);
            return false;
        };
        self.history.snapshot(surface);
        fill.blend(surface, &mut self.rng, &mask, logical);
        log::debug!("Filled {} px with {}", mask.len(), preset.engine.name());
        true
    }

    // --- Pointer input ---

    pub fn pointer_down(&mut self, event: &InputEvent) {
        if self.disabled {
            log::trace!("Ignoring pointer {} down: engine disabled", event.pointer_id);
            return;
        }
        let (Some(surface), Some(viewport)) = (self.surface.as_mut(), self.viewport.as_ref()) else {
            log::trace!("Ignoring pointer {} down: no surface", event.pointer_id);
            return;
        };

        let logical = viewport.to_logical(event.position);
        match self.arbiter.pointer_down(event, logical, self.tool) {
            DownOutcome::Stroke { action, point } => {
                // One snapshot per stroke, before the first pixel changes
                self.history.snapshot(surface);
                if action == StrokeAction::Erase {
                    erase_segment(surface, point, point, self.brush_size);
                } else {
                    let preset = lookup_preset(&self.catalog, &self.preset_id);
                    BrushRenderer::new(self.color, self.brush_size, preset).render(
                        surface,
                        &mut self.rng,
                        point,
                        point,
                        0.0,
                    );
                }
            }
            DownOutcome::Fill { point } => {
                self.flood_fill(point);
            }
            DownOutcome::Pan | DownOutcome::Ignored => {}
        }
    }

    pub fn pointer_move(&mut self, event: &InputEvent) {
        if self.disabled {
            return;
        }
        let (Some(surface), Some(viewport)) = (self.surface.as_mut(), self.viewport.as_mut()) else {
            return;
        };

        let logical = viewport.to_logical(event.position);
        match self.arbiter.pointer_move(event, logical) {
            MoveOutcome::Pan { delta } => viewport.pan_by(delta),
            MoveOutcome::Segment { from, to, progress, erase } => {
                if erase {
                    erase_segment(surface, from, to, self.brush_size);
                } else {
                    let preset = lookup_preset(&self.catalog, &self.preset_id);
                    BrushRenderer::new(self.color, self.brush_size, preset).render(
                        surface,
                        &mut self.rng,
                        from,
                        to,
                        progress,
                    );
                }
            }
            MoveOutcome::Ignored => {}
        }
    }

    pub fn pointer_up(&mut self, event: &InputEvent) {
        if self.disabled || self.surface.is_none() {
            return;
        }
        if let UpOutcome::Ended(action) = self.arbiter.pointer_up(event) {
            log::trace!("Pointer {} released after {:?}", event.pointer_id, action);
        }
    }

    /// Pointer left the surface; handled like pointer-up.
    pub fn pointer_leave(&mut self, event: &InputEvent) {
        self.pointer_up(event);
    }

    // --- Onion skin and output ---

    /// Load a reference image from a `data:` URI or a file path.
    pub fn load_reference_image(&mut self, source: &str) -> EngineResult<()> {
        self.onion.load(source)?;
        Ok(())
    }

    pub fn clear_reference_image(&mut self) {
        self.onion.clear();
    }

    pub fn set_onion_opacity(&mut self, opacity: f32) {
        self.onion.set_opacity(opacity);
    }

    pub fn set_onion_placement(&mut self, placement: OnionPlacement) {
        self.onion.set_placement(placement);
    }

    pub fn onion(&self) -> &OnionOverlay {
        &self.onion
    }

    /// RGBA frame for display: the surface composited with the reference.
    pub fn compose_frame(&self) -> EngineResult<Vec<u8>> {
        let surface = self.surface.as_ref().ok_or(EngineError::NotInitialized)?;
        Ok(self.onion.compose(surface))
    }

    /// Encode the surface (without the reference overlay) as PNG.
    pub fn export_png(&self) -> EngineResult<Vec<u8>> {
        let surface = self.surface.as_ref().ok_or(EngineError::NotInitialized)?;
        encode_png(surface.width(), surface.height(), surface.as_rgba())
    }
}

fn lookup_preset<'a>(catalog: &'a BrushCatalog, id: &str) -> &'a BrushPreset {
    catalog.get(id).unwrap_or_else(|| catalog.default_preset())
}

/// Encode straight-alpha RGBA8 pixels as a PNG.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> EngineResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba)?;
        writer.finish()?;
    }
    Ok(png_data)
}
