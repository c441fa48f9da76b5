//! Raster surface abstraction and the CPU pixel buffer behind it.

use crate::color::WHITE;
use kurbo::Size;

/// A full copy of a surface's pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Snapshot {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Pixel access used by the brush and fill algorithms.
///
/// Coordinates are buffer pixels (logical units times the device pixel
/// ratio). Out-of-bounds writes are ignored and out-of-bounds reads return
/// `None`, so callers never need to pre-clip.
pub trait RasterSurface {
    /// Buffer width in pixels.
    fn width(&self) -> u32;

    /// Buffer height in pixels.
    fn height(&self) -> u32;

    /// Scale between logical units and buffer pixels.
    fn device_pixel_ratio(&self) -> f64;

    /// Logical size the buffer was created for.
    fn logical_size(&self) -> Size;

    /// Read one pixel as straight-alpha RGBA8.
    fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]>;

    /// Overwrite one pixel.
    fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]);

    /// Composite `color` over one pixel (source-over) with extra `alpha`.
    fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 4], alpha: f32) {
        if let Some(dst) = self.get_pixel(x, y) {
            self.put_pixel(x, y, source_over(dst, color, alpha));
        }
    }

    /// Remove `alpha` worth of coverage from one pixel (destination-out).
    fn erase_pixel(&mut self, x: u32, y: u32, alpha: f32) {
        if let Some(dst) = self.get_pixel(x, y) {
            self.put_pixel(x, y, destination_out(dst, alpha));
        }
    }

    /// Overwrite every pixel.
    fn fill(&mut self, rgba: [u8; 4]);

    /// Copy the whole buffer.
    fn snapshot(&self) -> Snapshot;

    /// Restore a snapshot verbatim. Snapshots of another size are ignored.
    fn restore(&mut self, snapshot: Snapshot);

    /// Check if signed pixel coordinates fall inside the buffer.
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }
}

/// Source-over compositing of straight-alpha colors.
pub fn source_over(dst: [u8; 4], src: [u8; 4], alpha: f32) -> [u8; 4] {
    let sa = alpha.clamp(0.0, 1.0) * src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return dst;
    }
    if sa >= 1.0 {
        return [src[0], src[1], src[2], 255];
    }

    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| -> u8 {
        let value = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };

    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

/// Destination-out compositing: scale the destination alpha down.
pub fn destination_out(dst: [u8; 4], alpha: f32) -> [u8; 4] {
    let keep = 1.0 - alpha.clamp(0.0, 1.0);
    let a = (dst[3] as f32 * keep).round() as u8;
    if a == 0 {
        [0, 0, 0, 0]
    } else {
        [dst[0], dst[1], dst[2], a]
    }
}

/// In-memory RGBA8 surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    device_pixel_ratio: f64,
    logical_size: Size,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create an opaque white buffer for a logical size at a pixel ratio.
    ///
    /// Non-finite or non-positive ratios fall back to 1. Sizes come from
    /// trusted callers; use [`PixelBuffer::try_new`] for host input.
    pub fn new(logical_width: u32, logical_height: u32, device_pixel_ratio: f64) -> Self {
        let dpr = sanitize_dpr(device_pixel_ratio);
        let (width, height) = device_size(logical_width, logical_height, dpr);
        Self::allocate(logical_width, logical_height, dpr, width as u32, height as u32)
    }

    /// Like [`PixelBuffer::new`], but `None` when either device side exceeds
    /// `max_side` or the RGBA buffer would exceed `max_bytes`.
    pub fn try_new(
        logical_width: u32,
        logical_height: u32,
        device_pixel_ratio: f64,
        max_side: u32,
        max_bytes: u64,
    ) -> Option<Self> {
        let dpr = sanitize_dpr(device_pixel_ratio);
        let (width, height) = device_size(logical_width, logical_height, dpr);
        if width > max_side as u64 || height > max_side as u64 {
            return None;
        }
        let bytes = width.checked_mul(height)?.checked_mul(4)?;
        if bytes > max_bytes || usize::try_from(bytes).is_err() {
            return None;
        }
        Some(Self::allocate(
            logical_width,
            logical_height,
            dpr,
            width as u32,
            height as u32,
        ))
    }

    fn allocate(
        logical_width: u32,
        logical_height: u32,
        dpr: f64,
        width: u32,
        height: u32,
    ) -> Self {
        let mut buffer = Self {
            width,
            height,
            device_pixel_ratio: dpr,
            logical_size: Size::new(logical_width as f64, logical_height as f64),
            pixels: vec![0; width as usize * height as usize * 4],
        };
        buffer.clear();
        buffer
    }

    /// Repaint the whole buffer opaque white.
    pub fn clear(&mut self) {
        self.fill(WHITE);
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y as usize * self.width as usize + x as usize) * 4)
        } else {
            None
        }
    }
}

fn sanitize_dpr(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    }
}

/// Device pixel size, at least 1x1, saturating at `u32::MAX` per side.
fn device_size(logical_width: u32, logical_height: u32, dpr: f64) -> (u64, u64) {
    let side = |logical: u32| ((logical as f64 * dpr).ceil() as u32).max(1) as u64;
    (side(logical_width), side(logical_height))
}

impl RasterSurface for PixelBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn logical_size(&self) -> Size {
        self.logical_size
    }

    fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.index(x, y)?;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i..i + 4].copy_from_slice(&rgba);
        }
    }

    fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        if snapshot.width != self.width || snapshot.height != self.height {
            log::warn!(
                "Discarding {}x{} snapshot for {}x{} surface",
                snapshot.width,
                snapshot.height,
                self.width,
                self.height
            );
            return;
        }
        self.pixels = snapshot.pixels;
    }
}
