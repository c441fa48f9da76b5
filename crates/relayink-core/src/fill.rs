//! Scanline flood fill with mode-specific blending.
//!
//! Filling happens in two steps: a scanline pass grows the region of pixels
//! matching the seed color into a [`FillMask`], then the mask is blended with
//! the active color according to the preset's engine. The mask is computed
//! from the untouched pixels, so blending never feeds back into region growth.

use crate::brush::{BrushEngine, BrushPreset, draw_particle, particle_radius};
use crate::color::rgba8;
use crate::surface::RasterSurface;
use crate::viewport::logical_to_buffer;
use kurbo::Point;
use peniko::Color;
use rand::Rng;
use std::f64::consts::TAU;

/// Default per-channel tolerance when matching the seed color.
pub const DEFAULT_TOLERANCE: u8 = 16;

/// Angular samples taken on each ring when measuring distance to the edge.
const RING_SAMPLES: usize = 16;

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelRect {
    fn at(x: u32, y: u32) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn diagonal(&self) -> f64 {
        (self.width() as f64).hypot(self.height() as f64)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Boolean region produced by one flood fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
    bounds: Option<PixelRect>,
    count: usize,
}

impl FillMask {
    /// Create an empty mask for a buffer size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
            bounds: None,
            count: 0,
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Add a pixel to the mask.
    pub fn insert(&mut self, x: u32, y: u32) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.bits[i] {
            return;
        }
        self.bits[i] = true;
        self.count += 1;
        match &mut self.bounds {
            Some(bounds) => bounds.include(x, y),
            None => self.bounds = Some(PixelRect::at(x, y)),
        }
    }

    /// Check if a pixel is in the mask. Out-of-bounds pixels never are.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.index(x, y).is_some_and(|i| self.bits[i])
    }

    /// Check signed coordinates.
    pub fn contains_signed(&self, x: i64, y: i64) -> bool {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) => self.contains(x, y),
            _ => false,
        }
    }

    /// Bounding box of the masked pixels.
    pub fn bounds(&self) -> Option<PixelRect> {
        self.bounds
    }

    /// Number of masked pixels.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Iterate masked pixels inside the bounding box.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bounds.into_iter().flat_map(move |b| {
            (b.min_y..=b.max_y).flat_map(move |y| {
                (b.min_x..=b.max_x).filter_map(move |x| self.contains(x, y).then_some((x, y)))
            })
        })
    }
}

/// Check if every channel of `pixel` is within `tolerance` of `target`.
pub fn color_matches(pixel: [u8; 4], target: [u8; 4], tolerance: u8) -> bool {
    pixel
        .iter()
        .zip(target.iter())
        .all(|(&p, &t)| p.abs_diff(t) <= tolerance)
}

/// Scanline region growth over a read-only surface.
struct Scanline<'a> {
    surface: &'a dyn RasterSurface,
    target: [u8; 4],
    tolerance: u8,
    mask: FillMask,
    stack: Vec<(u32, u32)>,
}

impl Scanline<'_> {
    fn fillable(&self, x: u32, y: u32) -> bool {
        !self.mask.contains(x, y)
            && self
                .surface
                .get_pixel(x, y)
                .is_some_and(|px| color_matches(px, self.target, self.tolerance))
    }

    fn run(mut self, seed_x: u32, seed_y: u32) -> FillMask {
        let width = self.surface.width();
        let height = self.surface.height();
        self.stack.push((seed_x, seed_y));

        while let Some((x, y)) = self.stack.pop() {
            // Already covered by a span filled after this seed was queued
            if !self.fillable(x, y) {
                continue;
            }

            let mut left = x;
            while left > 0 && self.fillable(left - 1, y) {
                left -= 1;
            }
            let mut right = x;
            while right + 1 < width && self.fillable(right + 1, y) {
                right += 1;
            }

            for fx in left..=right {
                self.mask.insert(fx, y);
            }

            if y > 0 {
                self.queue_spans(left, right, y - 1);
            }
            if y + 1 < height {
                self.queue_spans(left, right, y + 1);
            }
        }

        self.mask
    }

    /// Queue one seed per contiguous fillable run of `row` under `left..=right`.
    fn queue_spans(&mut self, left: u32, right: u32, row: u32) {
        let mut in_span = false;
        for x in left..=right {
            if self.fillable(x, row) {
                if !in_span {
                    self.stack.push((x, row));
                    in_span = true;
                }
            } else {
                in_span = false;
            }
        }
    }
}

/// Grow the region around a buffer pixel. Out-of-bounds seeds give `None`.
pub fn compute_mask(
    surface: &dyn RasterSurface,
    seed_x: u32,
    seed_y: u32,
    tolerance: u8,
) -> Option<FillMask> {
    let target = surface.get_pixel(seed_x, seed_y)?;
    let scan = Scanline {
        surface,
        target,
        tolerance,
        mask: FillMask::new(surface.width(), surface.height()),
        stack: Vec::with_capacity(256),
    };
    let mask = scan.run(seed_x, seed_y);
    (!mask.is_empty()).then_some(mask)
}

/// Convert a logical point to the buffer pixel under it.
pub fn seed_pixel(surface: &dyn RasterSurface, logical: Point) -> Option<(u32, u32)> {
    let buffer = logical_to_buffer(logical, surface.device_pixel_ratio());
    let (x, y) = (buffer.x.floor(), buffer.y.floor());
    if !x.is_finite() || !y.is_finite() || !surface.contains(x as i64, y as i64) {
        return None;
    }
    Some((x as u32, y as u32))
}

/// Flood fill with the active color, size and preset.
#[derive(Debug, Clone, Copy)]
pub struct FloodFill<'a> {
    color: [u8; 4],
    size: f64,
    preset: &'a BrushPreset,
    tolerance: u8,
}

impl<'a> FloodFill<'a> {
    pub fn new(color: Color, size: f64, preset: &'a BrushPreset) -> Self {
        Self {
            color: rgba8(color),
            size: if size.is_finite() { size.max(0.5) } else { preset.size },
            preset,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Compute the region a fill at `logical` would cover.
    pub fn mask_at(&self, surface: &dyn RasterSurface, logical: Point) -> Option<FillMask> {
        let (x, y) = seed_pixel(surface, logical)?;
        compute_mask(surface, x, y, self.tolerance)
    }

    /// Blend the active color into the masked pixels.
    ///
    /// `seed` is the logical seed point, used by the fade mode.
    pub fn blend<R: Rng + ?Sized>(
        &self,
        surface: &mut dyn RasterSurface,
        rng: &mut R,
        mask: &FillMask,
        seed: Point,
    ) {
        let Some(bounds) = mask.bounds() else {
            return;
        };
        match self.preset.engine {
            BrushEngine::Solid => self.blend_solid(surface, mask),
            BrushEngine::Fade => self.blend_fade(surface, mask, bounds, seed),
            BrushEngine::Soft => self.blend_soft(surface, mask),
            BrushEngine::Spray => self.blend_spray(surface, rng, mask, bounds),
        }
    }

    fn blend_solid(&self, surface: &mut dyn RasterSurface, mask: &FillMask) {
        let opacity = self.preset.opacity;
        let [r, g, b, _] = self.color;
        for (x, y) in mask.pixels() {
            if opacity >= 0.999 {
                surface.put_pixel(x, y, [r, g, b, 255]);
            } else {
                surface.blend_pixel(x, y, self.color, opacity as f32);
            }
        }
    }

    fn blend_fade(
        &self,
        surface: &mut dyn RasterSurface,
        mask: &FillMask,
        bounds: PixelRect,
        seed: Point,
    ) {
        let origin = logical_to_buffer(seed, surface.device_pixel_ratio());
        let max_dist = (bounds.diagonal() * 0.75).max(8.0);
        for (x, y) in mask.pixels() {
            let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let d = (center - origin).hypot();
            let alpha = (1.0 - d / max_dist).clamp(0.05, 1.0) * self.preset.opacity;
            surface.blend_pixel(x, y, self.color, alpha as f32);
        }
    }

    fn blend_soft(&self, surface: &mut dyn RasterSurface, mask: &FillMask) {
        let dpr = surface.device_pixel_ratio();
        let reach = ((self.size * dpr).floor() as i64).max(2);
        let rings = ring_offsets(reach);
        let exponent = 2.0 - 1.5 * self.preset.hardness;

        // Alphas are computed from the mask alone, so writing as we go is safe
        for (x, y) in mask.pixels() {
            let edge = edge_distance(mask, x, y, &rings).unwrap_or(reach);
            let base = (edge as f64 / reach as f64).clamp(0.25, 1.0);
            let alpha = base.powf(exponent) * self.preset.opacity;
            surface.blend_pixel(x, y, self.color, alpha as f32);
        }
    }

    fn blend_spray<R: Rng + ?Sized>(
        &self,
        surface: &mut dyn RasterSurface,
        rng: &mut R,
        mask: &FillMask,
        bounds: PixelRect,
    ) {
        let dpr = surface.device_pixel_ratio();
        let count = spray_fill_count(bounds.area(), self.size, self.preset.density);
        let (x0, y0) = (bounds.min_x as f64, bounds.min_y as f64);
        let (x1, y1) = (bounds.max_x as f64 + 1.0, bounds.max_y as f64 + 1.0);

        for _ in 0..count {
            let px = rng.gen_range(x0..x1);
            let py = rng.gen_range(y0..y1);
            if !mask.contains(px as u32, py as u32) {
                continue;
            }
            let radius = particle_radius(rng, self.size, self.preset.particle_size_range) * dpr;
            let alpha = rng.gen_range(0.15..=0.70) * self.preset.opacity;
            draw_particle(
                surface,
                rng,
                Point::new(px, py),
                radius,
                self.color,
                alpha as f32,
                Some(mask),
                false,
            );
        }
    }
}

/// Number of spray samples scattered over a fill's bounding box.
pub fn spray_fill_count(area: u64, size: f64, density: f64) -> usize {
    let base = (area as f64 / 50.0 * (size / 12.0).max(0.6)).clamp(800.0, 12_000.0);
    (base * density).floor().max(0.0) as usize
}

/// Sample offsets for each ring radius `1..=reach`.
fn ring_offsets(reach: i64) -> Vec<Vec<(i64, i64)>> {
    (1..=reach)
        .map(|r| {
            let mut ring: Vec<(i64, i64)> = (0..RING_SAMPLES)
                .map(|k| {
                    let angle = k as f64 * TAU / RING_SAMPLES as f64;
                    let (sin, cos) = angle.sin_cos();
                    ((r as f64 * cos).round() as i64, (r as f64 * sin).round() as i64)
                })
                .collect();
            ring.dedup();
            ring
        })
        .collect()
}

/// Radius of the first ring that reaches outside the mask, if any.
fn edge_distance(mask: &FillMask, x: u32, y: u32, rings: &[Vec<(i64, i64)>]) -> Option<i64> {
    let (x, y) = (x as i64, y as i64);
    rings.iter().enumerate().find_map(|(i, ring)| {
        ring.iter()
            .any(|&(dx, dy)| !mask.contains_signed(x + dx, y + dy))
            .then_some(i as i64 + 1)
    })
}
