//! Coverage rasterization of segments and discs in buffer pixels.
//!
//! Every primitive here is composited once per call: a pixel touched by a
//! segment gets a single coverage value, so overlapping geometry inside one
//! call never darkens twice.

use crate::fill::FillMask;
use crate::surface::RasterSurface;
use kurbo::Point;

/// How covered pixels are modified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ink {
    /// Source-over with a straight-alpha color.
    Paint([u8; 4]),
    /// Destination-out.
    Erase,
}

/// Gradient stop: position in [0, 1] from center to rim, and alpha.
pub type Stop = (f64, f32);

/// Pixel coverage for a shape edge `distance` away from the pixel center.
///
/// Pixels whose center lies inside the shape get full coverage; the edge is
/// anti-aliased over one pixel.
fn coverage(half_width: f64, distance: f64) -> f32 {
    (half_width + 0.5 - distance).clamp(0.0, 1.0) as f32
}

fn apply(surface: &mut dyn RasterSurface, x: u32, y: u32, ink: Ink, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    match ink {
        Ink::Paint(color) => surface.blend_pixel(x, y, color, alpha),
        Ink::Erase => surface.erase_pixel(x, y, alpha),
    }
}

/// Pixel rows/columns touched by a box, clipped to the surface.
fn pixel_span(surface: &dyn RasterSurface, min: Point, max: Point) -> Option<(u32, u32, u32, u32)> {
    let x0 = min.x.floor().max(0.0);
    let y0 = min.y.floor().max(0.0);
    let x1 = max.x.ceil().min(surface.width() as f64 - 1.0);
    let y1 = max.y.ceil().min(surface.height() as f64 - 1.0);
    if !(x0 <= x1 && y0 <= y1) {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq <= f64::EPSILON {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Stroke a straight segment with round caps.
pub fn stroke_segment(
    surface: &mut dyn RasterSurface,
    a: Point,
    b: Point,
    width: f64,
    ink: Ink,
    alpha: f32,
) {
    if alpha <= 0.0 || width <= 0.0 {
        return;
    }
    let half = width / 2.0;
    let pad = half + 1.0;
    let min = Point::new(a.x.min(b.x) - pad, a.y.min(b.y) - pad);
    let max = Point::new(a.x.max(b.x) + pad, a.y.max(b.y) + pad);
    let Some((x0, y0, x1, y1)) = pixel_span(surface, min, max) else {
        return;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let cov = coverage(half, distance_to_segment(center, a, b));
            if cov > 0.0 {
                apply(surface, x, y, ink, alpha * cov);
            }
        }
    }
}

/// Fill a disc, optionally restricted to the pixels of a fill mask.
pub fn fill_disc(
    surface: &mut dyn RasterSurface,
    center: Point,
    radius: f64,
    ink: Ink,
    alpha: f32,
    clip: Option<&FillMask>,
) {
    if alpha <= 0.0 || radius <= 0.0 {
        return;
    }
    let pad = radius + 1.0;
    let min = Point::new(center.x - pad, center.y - pad);
    let max = Point::new(center.x + pad, center.y + pad);
    let Some((x0, y0, x1, y1)) = pixel_span(surface, min, max) else {
        return;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            if clip.is_some_and(|mask| !mask.contains(x, y)) {
                continue;
            }
            let d = (Point::new(x as f64 + 0.5, y as f64 + 0.5) - center).hypot();
            let cov = coverage(radius, d);
            if cov > 0.0 {
                apply(surface, x, y, ink, alpha * cov);
            }
        }
    }
}

/// Paint a disc whose alpha follows piecewise-linear radial stops.
pub fn gradient_disc(
    surface: &mut dyn RasterSurface,
    center: Point,
    radius: f64,
    color: [u8; 4],
    stops: &[Stop],
) {
    if radius <= 0.0 || stops.is_empty() {
        return;
    }
    let min = Point::new(center.x - radius, center.y - radius);
    let max = Point::new(center.x + radius, center.y + radius);
    let Some((x0, y0, x1, y1)) = pixel_span(surface, min, max) else {
        return;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = (Point::new(x as f64 + 0.5, y as f64 + 0.5) - center).hypot();
            if d >= radius {
                continue;
            }
            let alpha = sample_stops(stops, d / radius);
            apply(surface, x, y, Ink::Paint(color), alpha);
        }
    }
}

/// Linearly interpolate alpha between gradient stops.
pub fn sample_stops(stops: &[Stop], t: f64) -> f32 {
    let Some(&(first_pos, first_alpha)) = stops.first() else {
        return 0.0;
    };
    if t <= first_pos {
        return first_alpha;
    }
    for pair in stops.windows(2) {
        let (p0, a0) = pair[0];
        let (p1, a1) = pair[1];
        if t <= p1 {
            let span = p1 - p0;
            if span <= f64::EPSILON {
                return a1;
            }
            let k = ((t - p0) / span) as f32;
            return a0 + (a1 - a0) * k;
        }
    }
    stops.last().map_or(0.0, |&(_, alpha)| alpha)
}
