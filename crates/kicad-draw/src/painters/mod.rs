//! Painters: typed document items in, ordered primitive draw calls out.
//!
//! Painting is a two-phase pass. Phase 1 files every document item onto
//! the view layers its painter reports (an item may land on several, e.g.
//! a pad across copper, mask, paste, and hole layers). Phase 2 walks the
//! layers in display order, brackets each item in bbox tracking for
//! hit-testing, and dispatches on the item's variant. A variant with no
//! painter is a logged warning and a skipped item, never a failure.

pub mod board;
pub mod schematic;

pub use board::BoardPainter;
pub use schematic::SchematicPainter;

use kicad_parse::common;

use crate::geom::Vec2;
use crate::render::Renderer;
use crate::text::RenderedText;
use crate::theme::Color;

/// Emit laid-out text strokes as line calls.
pub(crate) fn emit_text(renderer: &mut dyn Renderer, rendered: &RenderedText, color: Color) {
    for stroke in &rendered.strokes {
        renderer.line(stroke, rendered.thickness, color);
    }
}

/// File colors are 0-255 channels with a 0-1 alpha.
pub(crate) fn convert_color(c: common::Color) -> Color {
    Color {
        r: c.r / 255.0,
        g: c.g / 255.0,
        b: c.b / 255.0,
        a: c.a,
    }
}

/// Keep text upright: angles reading downward are flipped 180° and the
/// horizontal alignment swapped so the anchor stays put.
pub(crate) fn readable_angle(degrees: f64, h_align: common::HAlign) -> (f64, common::HAlign) {
    let mut a = degrees % 360.0;
    if a < 0.0 {
        a += 360.0;
    }
    if a > 90.0 && a <= 270.0 {
        let flipped = match h_align {
            common::HAlign::Left => common::HAlign::Right,
            common::HAlign::Right => common::HAlign::Left,
            common::HAlign::Center => common::HAlign::Center,
        };
        return ((a + 180.0) % 360.0, flipped);
    }
    (a, h_align)
}

/// Sample a cubic bezier through its control points. Fewer than four
/// points degrade to the polyline through them.
pub(crate) fn bezier_points(pts: &[[f64; 2]], steps: usize) -> Vec<Vec2> {
    if pts.len() < 4 {
        return pts.iter().map(|p| Vec2::from(*p)).collect();
    }
    let (p0, p1, p2, p3) = (
        Vec2::from(pts[0]),
        Vec2::from(pts[1]),
        Vec2::from(pts[2]),
        Vec2::from(pts[3]),
    );
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let u = 1.0 - t;
            p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
        })
        .collect()
}

/// Closed rectangle outline centered at the origin.
pub(crate) fn rect_points(width: f64, height: f64) -> Vec<Vec2> {
    let (w, h) = (width / 2.0, height / 2.0);
    vec![
        Vec2::new(-w, -h),
        Vec2::new(w, -h),
        Vec2::new(w, h),
        Vec2::new(-w, h),
    ]
}

/// Rectangle with rounded corners, sampled as a polygon. `radius` is
/// clamped to half the short side; oval shapes fall out of that clamp.
pub(crate) fn rounded_rect_points(width: f64, height: f64, radius: f64) -> Vec<Vec2> {
    const SEGMENTS: usize = 8;
    let r = radius.min(width.min(height) / 2.0);
    if r <= 0.0 {
        return rect_points(width, height);
    }
    let (w, h) = (width / 2.0, height / 2.0);
    // corner centers, counterclockwise from top-right, with the angle the
    // corner arc starts at
    let corners = [
        (Vec2::new(w - r, -h + r), -90.0),
        (Vec2::new(w - r, h - r), 0.0),
        (Vec2::new(-w + r, h - r), 90.0),
        (Vec2::new(-w + r, -h + r), 180.0),
    ];
    let mut points = Vec::with_capacity(4 * (SEGMENTS + 1));
    for (center, start) in corners {
        for i in 0..=SEGMENTS {
            let angle = (start + 90.0 * i as f64 / SEGMENTS as f64).to_radians();
            points.push(center + Vec2::new(angle.cos(), angle.sin()) * r);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kicad_parse::common::HAlign;

    #[test]
    fn test_readable_angle_flips_upside_down_text() {
        let (a, h) = readable_angle(180.0, HAlign::Left);
        assert_relative_eq!(a, 0.0);
        assert_eq!(h, HAlign::Right);
        let (a, h) = readable_angle(90.0, HAlign::Left);
        assert_relative_eq!(a, 90.0);
        assert_eq!(h, HAlign::Left);
        let (a, _) = readable_angle(270.0, HAlign::Center);
        assert_relative_eq!(a, 90.0);
    }

    #[test]
    fn test_rounded_rect_degenerates_to_rect() {
        assert_eq!(rounded_rect_points(2.0, 1.0, 0.0).len(), 4);
        // oval: radius is half the short side
        let oval = rounded_rect_points(2.0, 1.0, 0.5);
        let max_y = oval.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert_relative_eq!(max_y, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_bezier_endpoints() {
        let pts = bezier_points(&[[0.0, 0.0], [1.0, 0.0], [2.0, 1.0], [3.0, 1.0]], 16);
        assert_relative_eq!(pts[0].x, 0.0);
        assert_relative_eq!(pts.last().unwrap().x, 3.0);
        assert_relative_eq!(pts.last().unwrap().y, 1.0);
    }
}
