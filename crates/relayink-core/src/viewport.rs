//! Viewport module for zoom, auto-fit and scroll transforms.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Space kept free around the surface when fitting it to the viewport.
pub const DEFAULT_MARGIN: f64 = 32.0;

/// Lower bound for the auto-fit scale on viewports smaller than the margin.
pub const MIN_AUTO_FIT: f64 = 0.05;

/// Default user zoom limits.
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;

/// Viewport maps pointer coordinates to logical drawing coordinates.
///
/// Pointer positions arrive in device pixels relative to the surface element.
/// They are divided by the effective zoom (user zoom times the automatic
/// fit-to-viewport scale) to get logical coordinates, which are in turn
/// multiplied by the device pixel ratio to address buffer pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoom chosen by the user (1.0 = 100%).
    pub user_zoom: f64,
    /// Automatic scale that fits the surface into the viewport, never above 1.
    pub auto_fit_scale: f64,
    /// Scale between logical units and buffer pixels.
    pub device_pixel_ratio: f64,
    /// Scroll position of the surface inside its container.
    pub scroll_offset: Vec2,
    /// Logical size of the drawing surface.
    pub logical_size: Size,
    /// Size of the container the surface is shown in.
    pub viewport_size: Size,
    /// Margin subtracted from the viewport before fitting.
    pub margin: f64,
    /// Minimum allowed user zoom.
    pub min_zoom: f64,
    /// Maximum allowed user zoom.
    pub max_zoom: f64,
}

impl Viewport {
    /// Create a viewport for a surface of the given logical size.
    pub fn new(logical_size: Size, device_pixel_ratio: f64) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };

        Self {
            user_zoom: 1.0,
            auto_fit_scale: 1.0,
            device_pixel_ratio,
            scroll_offset: Vec2::ZERO,
            logical_size,
            viewport_size: logical_size,
            margin: DEFAULT_MARGIN,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }

    /// Combined zoom applied to pointer coordinates.
    pub fn effective_zoom(&self) -> f64 {
        self.user_zoom * self.auto_fit_scale
    }

    /// Transform from logical coordinates to device pixels.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.effective_zoom())
    }

    /// Transform from device pixels to logical coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.effective_zoom())
    }

    /// Convert a device-pixel pointer position to logical coordinates.
    pub fn to_logical(&self, device_point: Point) -> Point {
        self.inverse_transform() * device_point
    }

    /// Convert a logical point to device pixels.
    pub fn to_device(&self, logical_point: Point) -> Point {
        self.transform() * logical_point
    }

    /// Convert a logical point to buffer pixel coordinates.
    pub fn to_buffer(&self, logical_point: Point) -> Point {
        logical_to_buffer(logical_point, self.device_pixel_ratio)
    }

    /// Recompute the auto-fit scale for a new container size.
    pub fn resize(&mut self, viewport_size: Size) {
        self.viewport_size = viewport_size;
        self.auto_fit_scale = fit_scale(self.logical_size, viewport_size, self.margin);
        self.clamp_scroll();
    }

    /// Set the user zoom, clamped to the allowed range.
    pub fn set_user_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        self.user_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.clamp_scroll();
    }

    /// Scroll by a raw screen-space drag delta.
    ///
    /// Dragging right reveals content to the left, so the offset moves
    /// opposite to the delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.scroll_offset -= delta;
        self.clamp_scroll();
    }

    /// Largest scroll offset that still keeps the surface in view.
    pub fn max_scroll(&self) -> Vec2 {
        let zoom = self.effective_zoom();
        Vec2::new(
            (self.logical_size.width * zoom - self.viewport_size.width).max(0.0),
            (self.logical_size.height * zoom - self.viewport_size.height).max(0.0),
        )
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        self.scroll_offset = Vec2::new(
            self.scroll_offset.x.clamp(0.0, max.x),
            self.scroll_offset.y.clamp(0.0, max.y),
        );
    }
}

/// Map a logical point onto a buffer rendered at `device_pixel_ratio`.
pub fn logical_to_buffer(logical_point: Point, device_pixel_ratio: f64) -> Point {
    Affine::scale(device_pixel_ratio) * logical_point
}

/// Scale that fits `logical` into `viewport` minus `margin`, never upscaling.
pub fn fit_scale(logical: Size, viewport: Size, margin: f64) -> f64 {
    if logical.width <= 0.0 || logical.height <= 0.0 {
        return 1.0;
    }
    let scale_x = (viewport.width - margin) / logical.width;
    let scale_y = (viewport.height - margin) / logical.height;
    scale_x.min(scale_y).min(1.0).max(MIN_AUTO_FIT)
}
