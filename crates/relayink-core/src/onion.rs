//! Translucent reference overlay ("onion skin") composited for presentation.
//!
//! The overlay never writes into the drawing surface: [`OnionOverlay::compose`]
//! produces a separate RGBA buffer for display.

use crate::surface::{RasterSurface, source_over};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default opacity of a freshly loaded reference.
pub const DEFAULT_ONION_OPACITY: f32 = 0.35;

/// Errors raised while loading a reference image.
#[derive(Debug, Error)]
pub enum OnionError {
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),
}

/// Whether the reference is drawn over or under the live surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnionPlacement {
    #[default]
    Above,
    Below,
}

/// Optional reference image with opacity and placement.
#[derive(Debug, Clone)]
pub struct OnionOverlay {
    reference: Option<RgbaImage>,
    opacity: f32,
    placement: OnionPlacement,
}

impl Default for OnionOverlay {
    fn default() -> Self {
        Self {
            reference: None,
            opacity: DEFAULT_ONION_OPACITY,
            placement: OnionPlacement::default(),
        }
    }
}

impl OnionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a reference from a `data:` URI or a filesystem path.
    pub fn load(&mut self, source: &str) -> Result<(), OnionError> {
        let bytes = read_source(source)?;
        self.load_bytes(&bytes)
    }

    /// Decode PNG/JPEG/WebP bytes and use them as the reference.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), OnionError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        log::debug!("Loaded reference image {}x{}", decoded.width(), decoded.height());
        self.reference = Some(decoded);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.reference = None;
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the overlay opacity, clamped to [0, 1]. NaN is ignored.
    pub fn set_opacity(&mut self, opacity: f32) {
        if !opacity.is_nan() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn placement(&self) -> OnionPlacement {
        self.placement
    }

    pub fn set_placement(&mut self, placement: OnionPlacement) {
        self.placement = placement;
    }

    /// Composite the reference with the surface into a new RGBA buffer.
    ///
    /// The reference is stretched to the buffer size. Without a reference
    /// (or at zero opacity) this is a copy of the surface pixels.
    pub fn compose(&self, surface: &dyn RasterSurface) -> Vec<u8> {
        let (width, height) = (surface.width(), surface.height());
        let mut out = surface.snapshot().pixels().to_vec();

        let Some(reference) = self.reference.as_ref().filter(|_| self.opacity > 0.0) else {
            return out;
        };
        let stretched;
        let reference = if reference.dimensions() == (width, height) {
            reference
        } else {
            stretched = imageops::resize(reference, width, height, FilterType::Triangle);
            &stretched
        };

        for (px, overlay) in out.chunks_exact_mut(4).zip(reference.pixels()) {
            let live = [px[0], px[1], px[2], px[3]];
            let composed = match self.placement {
                OnionPlacement::Above => source_over(live, overlay.0, self.opacity),
                OnionPlacement::Below => {
                    let under = source_over([0, 0, 0, 0], overlay.0, self.opacity);
                    source_over(under, live, 1.0)
                }
            };
            px.copy_from_slice(&composed);
        }
        out
    }
}

/// Resolve a reference source into raw image bytes.
fn read_source(source: &str) -> Result<Vec<u8>, OnionError> {
    let trimmed = source.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        return decode_data_uri(rest);
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Err(OnionError::UnsupportedSource(trimmed.to_string()));
    }
    Ok(std::fs::read(Path::new(trimmed))?)
}

/// Decode the part of a data URI after `data:`.
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, OnionError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| OnionError::InvalidDataUri("missing ','".to_string()))?;
    if !header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(OnionError::InvalidDataUri(format!(
            "expected base64 payload, got '{header}'"
        )));
    }
    Ok(STANDARD.decode(payload.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::WHITE;
    use crate::surface::PixelBuffer;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_compose_without_reference_copies_surface() {
        let mut surface = PixelBuffer::new(3, 3, 1.0);
        surface.put_pixel(1, 1, [0, 0, 0, 255]);
        let overlay = OnionOverlay::new();
        assert_eq!(overlay.compose(&surface), surface.as_rgba());
    }

    #[test]
    fn test_compose_above_never_mutates_surface() {
        let surface = PixelBuffer::new(4, 4, 1.0);
        let before = surface.snapshot();
        let mut overlay = OnionOverlay::new();
        overlay.load_bytes(&png_bytes(2, 2, [0, 0, 255, 255])).unwrap();
        overlay.set_opacity(0.5);

        let frame = overlay.compose(&surface);
        assert_eq!(surface.snapshot(), before);
        assert_eq!(frame.len(), 4 * 4 * 4);
        // Half blue over white
        assert_eq!(&frame[0..4], &[128, 128, 255, 255]);
    }

    #[test]
    fn test_compose_below_is_hidden_by_opaque_surface() {
        let mut surface = PixelBuffer::new(2, 1, 1.0);
        surface.put_pixel(1, 0, [0, 0, 0, 0]);
        let mut overlay = OnionOverlay::new();
        overlay.load_bytes(&png_bytes(2, 1, [255, 0, 0, 255])).unwrap();
        overlay.set_opacity(1.0);
        overlay.set_placement(OnionPlacement::Below);

        let frame = overlay.compose(&surface);
        assert_eq!(&frame[0..4], &WHITE);
        // Erased pixel shows the reference through
        assert_eq!(&frame[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_reference_is_stretched_to_device_pixels() {
        let surface = PixelBuffer::new(5, 5, 2.0);
        let mut overlay = OnionOverlay::new();
        overlay.load_bytes(&png_bytes(1, 1, [0, 0, 0, 255])).unwrap();
        overlay.set_opacity(1.0);
        let frame = overlay.compose(&surface);
        assert_eq!(frame.len(), 10 * 10 * 4);
        assert!(frame.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_load_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(1, 1, WHITE)));
        let mut overlay = OnionOverlay::new();
        overlay.load(&uri).unwrap();
        assert!(overlay.has_reference());
        overlay.clear();
        assert!(!overlay.has_reference());
    }

    #[test]
    fn test_load_rejects_bad_sources() {
        let mut overlay = OnionOverlay::new();
        assert!(matches!(overlay.load("data:image/png,abc"), Err(OnionError::InvalidDataUri(_))));
        assert!(matches!(
            overlay.load("data:image/png;base64"),
            Err(OnionError::InvalidDataUri(_))
        ));
        assert!(matches!(overlay.load("data:image/png;base64,!!!"), Err(OnionError::Base64(_))));
        assert!(matches!(
            overlay.load(&format!("data:image/png;base64,{}", STANDARD.encode(b"nope"))),
            Err(OnionError::Decode(_))
        ));
        assert!(matches!(
            overlay.load("https://example.com/a.png"),
            Err(OnionError::UnsupportedSource(_))
        ));
        assert!(matches!(overlay.load("/definitely/not/here.png"), Err(OnionError::Io(_))));
        assert!(!overlay.has_reference());
    }

    #[test]
    fn test_opacity_clamped() {
        let mut overlay = OnionOverlay::new();
        overlay.set_opacity(3.0);
        assert!((overlay.opacity() - 1.0).abs() < f32::EPSILON);
        overlay.set_opacity(f32::NAN);
        assert!((overlay.opacity() - 1.0).abs() < f32::EPSILON);
        overlay.set_opacity(-1.0);
        assert!(overlay.opacity().abs() < f32::EPSILON);
    }
}
