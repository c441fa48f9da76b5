//! Brush stroke rendering.
//!
//! A stroke is rendered one segment at a time as the owning pointer moves.
//! Geometry arrives in logical units and is scaled to buffer pixels by the
//! surface's device pixel ratio before rasterization.

mod preset;
pub mod raster;

pub use preset::{BrushCatalog, BrushEngine, BrushPreset, CatalogError};

use crate::color::rgba8;
use crate::fill::FillMask;
use crate::surface::RasterSurface;
use crate::viewport::logical_to_buffer;
use kurbo::{Point, Vec2};
use peniko::Color;
use rand::Rng;
use raster::Ink;
use std::f64::consts::TAU;

/// Share of spray particles that leave a drip trail.
pub const DRIP_CHANCE: f64 = 0.06;

/// Stroke length over which the fade engine reaches its minimum alpha.
const FADE_LENGTH: f64 = 800.0;

/// Minimum alpha of a fading stroke.
const FADE_FLOOR: f64 = 0.05;

/// Renders stroke segments for one color, size and preset.
#[derive(Debug, Clone, Copy)]
pub struct BrushRenderer<'a> {
    color: [u8; 4],
    size: f64,
    preset: &'a BrushPreset,
}

impl<'a> BrushRenderer<'a> {
    /// Create a renderer; `size` is the active brush size in logical units.
    pub fn new(color: Color, size: f64, preset: &'a BrushPreset) -> Self {
        Self {
            color: rgba8(color),
            size: if size.is_finite() { size.max(0.5) } else { preset.size },
            preset,
        }
    }

    /// Render the segment `from`-`to` (logical units).
    ///
    /// `progress` is the stroke length covered before this segment.
    pub fn render<R: Rng + ?Sized>(
        &self,
        surface: &mut dyn RasterSurface,
        rng: &mut R,
        from: Point,
        to: Point,
        progress: f64,
    ) {
        match self.preset.engine {
            BrushEngine::Solid => {
                self.render_tapered(surface, rng, from, to, progress, self.preset.opacity)
            }
            BrushEngine::Fade => {
                let alpha = fade_alpha(progress, self.preset.opacity);
                self.render_tapered(surface, rng, from, to, progress, alpha)
            }
            BrushEngine::Soft => self.render_soft(surface, from, to),
            BrushEngine::Spray => self.render_spray(surface, rng, from, to),
        }
    }

    fn render_tapered<R: Rng + ?Sized>(
        &self,
        surface: &mut dyn RasterSurface,
        rng: &mut R,
        from: Point,
        to: Point,
        progress: f64,
        alpha: f64,
    ) {
        let dpr = surface.device_pixel_ratio();
        let jitter = self.size * self.preset.jitter;
        let a = jitter_point(rng, from, jitter);
        let b = jitter_point(rng, to, jitter);
        let width = (self.size * taper_factor(self.preset.taper, self.size, progress)).max(0.5);

        raster::stroke_segment(
            surface,
            logical_to_buffer(a, dpr),
            logical_to_buffer(b, dpr),
            width * dpr,
            Ink::Paint(self.color),
            alpha as f32,
        );
    }

    fn render_soft(&self, surface: &mut dyn RasterSurface, from: Point, to: Point) {
        let dpr = surface.device_pixel_ratio();
        let radius = self.size / 2.0 * dpr;
        let center_alpha = (0.9 * self.preset.opacity) as f32;
        let inner = self.preset.hardness.clamp(0.0, 0.95);
        let stops = [
            (0.0, center_alpha),
            (inner, center_alpha * 0.85),
            (1.0, 0.0),
        ];

        for point in sample_points(from, to, self.size * 0.4) {
            let center = logical_to_buffer(point, dpr);
            raster::gradient_disc(surface, center, radius, self.color, &stops);
        }
    }

    fn render_spray<R: Rng + ?Sized>(
        &self,
        surface: &mut dyn RasterSurface,
        rng: &mut R,
        from: Point,
        to: Point,
    ) {
        let dpr = surface.device_pixel_ratio();
        let per_step = spray_particle_count(self.size, self.preset.density);
        let spread = self.size / 2.0;

        for point in sample_points(from, to, (self.size * 0.4).max(1.0)) {
            for _ in 0..per_step {
                let center = jitter_point(rng, point, spread);
                let radius = particle_radius(rng, self.size, self.preset.particle_size_range);
                let alpha = rng.gen_range(0.15..=0.70) * self.preset.opacity;
                draw_particle(
                    surface,
                    rng,
                    logical_to_buffer(center, dpr),
                    radius * dpr,
                    self.color,
                    alpha as f32,
                    None,
                    self.preset.drip,
                );
            }
        }
    }
}

/// Erase a round-capped segment of width `size` (destination-out).
pub fn erase_segment(surface: &mut dyn RasterSurface, from: Point, to: Point, size: f64) {
    let dpr = surface.device_pixel_ratio();
    raster::stroke_segment(
        surface,
        logical_to_buffer(from, dpr),
        logical_to_buffer(to, dpr),
        size.max(0.5) * dpr,
        Ink::Erase,
        1.0,
    );
}

/// Width multiplier for a stroke that has covered `progress` units.
pub fn taper_factor(taper: f64, size: f64, progress: f64) -> f64 {
    1.0 - taper * (progress / (200.0 + size * 20.0)).min(1.0)
}

/// Alpha of a fade-engine segment starting at `progress`.
pub fn fade_alpha(progress: f64, opacity: f64) -> f64 {
    (1.0 - progress / FADE_LENGTH).max(FADE_FLOOR) * opacity
}

/// Particles scattered per spray sample.
pub fn spray_particle_count(size: f64, density: f64) -> usize {
    let base = (size * 2.0).floor().max(6.0).min(60.0);
    (base * density).floor().max(1.0) as usize
}

/// Random particle radius in logical units.
pub fn particle_radius<R: Rng + ?Sized>(rng: &mut R, size: f64, range: Option<(f64, f64)>) -> f64 {
    let (min, max) = range.unwrap_or((0.8, size * 0.08 + size * 0.12));
    if max > min { rng.gen_range(min..max) } else { min }
}

/// Points every `spacing` units from `from` to `to`, both ends included.
pub fn sample_points(from: Point, to: Point, spacing: f64) -> Vec<Point> {
    let distance = (to - from).hypot();
    let spacing = spacing.max(0.1);
    let steps = (distance / spacing).floor() as usize;
    if steps == 0 {
        return vec![from];
    }
    (0..=steps)
        .map(|i| from.lerp(to, i as f64 / steps as f64))
        .collect()
}

/// Uniform random point inside a disc of `radius` around `point`.
pub fn jitter_point<R: Rng + ?Sized>(rng: &mut R, point: Point, radius: f64) -> Point {
    if radius <= 0.0 {
        return point;
    }
    let r = radius * rng.r#gen::<f64>().sqrt();
    let theta = rng.r#gen::<f64>() * TAU;
    point + Vec2::from_angle(theta) * r
}

/// Draw one spray particle in buffer pixels, optionally with a drip trail.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_particle<R: Rng + ?Sized>(
    surface: &mut dyn RasterSurface,
    rng: &mut R,
    center: Point,
    radius: f64,
    color: [u8; 4],
    alpha: f32,
    clip: Option<&FillMask>,
    drip: bool,
) {
    raster::fill_disc(surface, center, radius, Ink::Paint(color), alpha, clip);
    if drip && rng.gen_bool(DRIP_CHANCE) {
        drip_trail(surface, rng, center, radius, color, alpha);
    }
}

/// Downward trail of shrinking, fading segments.
fn drip_trail<R: Rng + ?Sized>(
    surface: &mut dyn RasterSurface,
    rng: &mut R,
    start: Point,
    radius: f64,
    color: [u8; 4],
    alpha: f32,
) {
    let segments = rng.gen_range(3..=6);
    let mut point = start;
    let mut r = radius;
    let mut a = alpha;
    for _ in 0..segments {
        let length = rng.gen_range(1.5..4.0) * radius.max(0.5);
        let next = point + Vec2::new(rng.gen_range(-0.3..=0.3) * r, length);
        raster::stroke_segment(surface, point, next, 2.0 * r, Ink::Paint(color), a);
        point = next;
        r *= 0.82;
        a *= 0.75;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{WHITE, parse_hex_color};
    use crate::surface::PixelBuffer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn red() -> Color {
        parse_hex_color("#ff0000").unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_solid_horizontal_line_is_exact() {
        let preset = BrushPreset::new("solid", BrushEngine::Solid)
            .with_taper(0.0)
            .with_jitter(0.0)
            .with_opacity(1.0);
        let mut surface = PixelBuffer::new(120, 20, 1.0);
        BrushRenderer::new(red(), 10.0, &preset).render(
            &mut surface,
            &mut rng(),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            0.0,
        );

        for x in 0..100 {
            for y in 0..5 {
                assert_eq!(surface.get_pixel(x, y), Some([255, 0, 0, 255]), "({x}, {y})");
            }
            assert_eq!(surface.get_pixel(x, 5), Some(WHITE), "({x}, 5)");
        }
        assert_eq!(surface.get_pixel(110, 0), Some(WHITE));
    }

    #[test]
    fn test_solid_line_at_double_dpr() {
        let preset = BrushPreset::new("solid", BrushEngine::Solid);
        let mut surface = PixelBuffer::new(60, 20, 2.0);
        BrushRenderer::new(red(), 10.0, &preset).render(
            &mut surface,
            &mut rng(),
            Point::new(0.0, 10.0),
            Point::new(50.0, 10.0),
            0.0,
        );
        // Width 10 logical = 20 buffer pixels, centered on row 20
        assert_eq!(surface.get_pixel(50, 10), Some([255, 0, 0, 255]));
        assert_eq!(surface.get_pixel(50, 29), Some([255, 0, 0, 255]));
        assert_eq!(surface.get_pixel(50, 31), Some(WHITE));
    }

    #[test]
    fn test_taper_factor() {
        assert!((taper_factor(0.0, 10.0, 10_000.0) - 1.0).abs() < f64::EPSILON);
        // 200 + 10 * 20 = 400
        assert!((taper_factor(0.5, 10.0, 200.0) - 0.75).abs() < 1e-12);
        assert!((taper_factor(1.0, 10.0, 5_000.0)).abs() < 1e-12);
    }

    #[test]
    fn test_tapered_width_has_minimum() {
        let preset = BrushPreset::new("ink", BrushEngine::Solid).with_taper(1.0);
        let mut surface = PixelBuffer::new(40, 40, 1.0);
        BrushRenderer::new(red(), 10.0, &preset).render(
            &mut surface,
            &mut rng(),
            Point::new(5.0, 20.5),
            Point::new(35.0, 20.5),
            10_000.0,
        );
        // Width falls to the 0.5 minimum: the center row is only partially covered
        let center = surface.get_pixel(20, 20).unwrap();
        assert!(center[1] < 255 && center[1] > 0);
        assert_eq!(surface.get_pixel(20, 22), Some(WHITE));
    }

    #[test]
    fn test_fade_alpha() {
        assert!((fade_alpha(0.0, 0.8) - 0.8).abs() < 1e-12);
        assert!((fade_alpha(400.0, 1.0) - 0.5).abs() < 1e-12);
        assert!((fade_alpha(10_000.0, 1.0) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_fade_segment_gets_lighter_with_progress() {
        let preset = BrushPreset::new("marker", BrushEngine::Fade);
        let renderer = BrushRenderer::new(red(), 6.0, &preset);
        let mut early = PixelBuffer::new(20, 20, 1.0);
        let mut late = PixelBuffer::new(20, 20, 1.0);
        let (a, b) = (Point::new(2.0, 10.0), Point::new(18.0, 10.0));
        renderer.render(&mut early, &mut rng(), a, b, 0.0);
        renderer.render(&mut late, &mut rng(), a, b, 600.0);

        let early_px = early.get_pixel(10, 10).unwrap();
        let late_px = late.get_pixel(10, 10).unwrap();
        assert_eq!(early_px, [255, 0, 0, 255]);
        assert!(late_px[1] > early_px[1]);
    }

    #[test]
    fn test_jitter_stays_inside_disc() {
        let mut rng = rng();
        let center = Point::new(50.0, 50.0);
        for _ in 0..500 {
            let p = jitter_point(&mut rng, center, 4.0);
            assert!((p - center).hypot() <= 4.0 + 1e-9);
        }
        assert_eq!(jitter_point(&mut rng, center, 0.0), center);
    }

    #[test]
    fn test_sample_points() {
        let points = sample_points(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 4.0);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[2], Point::new(10.0, 0.0));

        let dot = sample_points(Point::new(3.0, 3.0), Point::new(3.0, 3.0), 4.0);
        assert_eq!(dot, vec![Point::new(3.0, 3.0)]);
    }

    #[test]
    fn test_soft_dab_is_densest_in_center() {
        let preset = BrushPreset::new("air", BrushEngine::Soft).with_hardness(0.0);
        let mut surface = PixelBuffer::new(40, 40, 1.0);
        BrushRenderer::new(red(), 20.0, &preset).render(
            &mut surface,
            &mut rng(),
            Point::new(20.0, 20.0),
            Point::new(20.0, 20.0),
            0.0,
        );
        let center = surface.get_pixel(20, 20).unwrap();
        let edge = surface.get_pixel(28, 20).unwrap();
        let outside = surface.get_pixel(35, 20).unwrap();
        // Center alpha is 0.9, never fully opaque
        assert!(center[1] > 0 && center[1] < 100);
        assert!(edge[1] > center[1]);
        assert_eq!(outside, WHITE);
    }

    #[test]
    fn test_spray_particle_count() {
        assert_eq!(spray_particle_count(1.0, 1.0), 6);
        assert_eq!(spray_particle_count(10.0, 1.0), 20);
        assert_eq!(spray_particle_count(100.0, 1.0), 60);
        assert_eq!(spray_particle_count(10.0, 0.1), 2);
        assert_eq!(spray_particle_count(1.0, 0.1), 1);
    }

    #[test]
    fn test_particle_radius_range() {
        let mut rng = rng();
        for _ in 0..200 {
            let r = particle_radius(&mut rng, 20.0, None);
            assert!((0.8..4.0).contains(&r));
            let r = particle_radius(&mut rng, 20.0, Some((1.0, 1.5)));
            assert!((1.0..1.5).contains(&r));
        }
        // Tiny brushes collapse the default range to its minimum
        assert!((particle_radius(&mut rng, 2.0, None) - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spray_stays_near_segment() {
        let preset = BrushPreset::new("spray", BrushEngine::Spray);
        let mut surface = PixelBuffer::new(100, 100, 1.0);
        BrushRenderer::new(red(), 20.0, &preset).render(
            &mut surface,
            &mut rng(),
            Point::new(30.0, 50.0),
            Point::new(70.0, 50.0),
            0.0,
        );

        let mut touched = 0;
        for y in 0..100 {
            for x in 0..100 {
                if surface.get_pixel(x, y) != Some(WHITE) {
                    touched += 1;
                    let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                    let d = raster::distance_to_segment(
                        center,
                        Point::new(30.0, 50.0),
                        Point::new(70.0, 50.0),
                    );
                    // spread 10 + max particle radius 4 + one pixel of AA
                    assert!(d <= 15.5, "({x}, {y}) at {d}");
                }
            }
        }
        assert!(touched > 50);
    }

    fn touched_rows(surface: &PixelBuffer) -> Vec<u32> {
        (0..surface.height())
            .filter(|&y| (0..surface.width()).any(|x| surface.get_pixel(x, y) != Some(WHITE)))
            .collect()
    }

    #[test]
    fn test_spray_drips_run_below_the_dab() {
        let preset = BrushPreset::new("drip", BrushEngine::Spray).with_drip(true);
        let mut surface = PixelBuffer::new(100, 100, 1.0);
        let mut rng = StdRng::seed_from_u64(3);
        let dab = Point::new(50.0, 20.0);
        for _ in 0..8 {
            BrushRenderer::new(red(), 10.0, &preset).render(&mut surface, &mut rng, dab, dab, 0.0);
        }

        // Spread 5 + max particle radius 2 + one pixel of AA
        let reach = 8;
        let rows = touched_rows(&surface);
        let (top, bottom) = (rows[0], rows[rows.len() - 1]);
        assert!(bottom > 20 + reach, "lowest touched row {bottom}");
        assert!(top >= 20 - reach, "highest touched row {top}");
    }

    #[test]
    fn test_spray_without_drip_stays_in_spread() {
        let preset = BrushPreset::new("spray", BrushEngine::Spray);
        let mut surface = PixelBuffer::new(100, 100, 1.0);
        let mut rng = StdRng::seed_from_u64(3);
        let dab = Point::new(50.0, 20.0);
        for _ in 0..8 {
            BrushRenderer::new(red(), 10.0, &preset).render(&mut surface, &mut rng, dab, dab, 0.0);
        }
        let rows = touched_rows(&surface);
        assert!(rows.iter().all(|&y| (12..=28).contains(&y)), "{rows:?}");
    }

    #[test]
    fn test_drip_trail_only_runs_down() {
        let mut surface = PixelBuffer::new(40, 60, 1.0);
        let start = Point::new(20.0, 10.0);
        drip_trail(&mut surface, &mut rng(), start, 2.0, [255, 0, 0, 255], 1.0);

        let rows = touched_rows(&surface);
        // At least three segments of 1.5 x radius each
        assert!(rows[rows.len() - 1] >= 18, "{rows:?}");
        // Only the round cap of width 2 x radius reaches above the start
        assert!(rows[0] >= 7, "{rows:?}");
        // Sideways drift is bounded by 0.3 x radius per segment
        for y in rows {
            for x in (0..12).chain(29..40) {
                assert_eq!(surface.get_pixel(x, y), Some(WHITE), "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_erase_segment_clears_to_transparent() {
        let mut surface = PixelBuffer::new(30, 30, 1.0);
        erase_segment(&mut surface, Point::new(5.0, 15.0), Point::new(25.0, 15.0), 6.0);
        assert_eq!(surface.get_pixel(15, 15), Some([0, 0, 0, 0]));
        assert_eq!(surface.get_pixel(15, 25), Some(WHITE));
    }
}
