//! Stroke glyph decoding.
//!
//! A glyph is a list of polyline strokes in a normalized unit font space:
//! x starts at the left bound, y is zero at the baseline and negative
//! above it. Callers scale by the requested text size before drawing.

use crate::geom::{BBox, Vec2};

/// Raw glyph grid units per em; a capital spans -12..9 on the raw grid.
pub const STROKE_FONT_SCALE: f64 = 1.0 / 21.0;

/// Raw y of the baseline in the encoded grid.
const FONT_BASELINE: i32 = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub strokes: Vec<Vec<Vec2>>,
    pub bbox: BBox,
    /// Cursor advance in normalized units.
    pub advance: f64,
}

/// Decode one char-pair encoded glyph.
pub fn decode(encoded: &str) -> Glyph {
    let vals: Vec<i32> = encoded.chars().map(|c| c as i32 - 'R' as i32).collect();
    let (left, right) = match (vals.first(), vals.get(1)) {
        (Some(l), Some(r)) => (*l, *r),
        _ => (0, 0),
    };
    let mut strokes = Vec::new();
    let mut stroke: Vec<Vec2> = Vec::new();
    let mut bbox = BBox::empty();
    let mut i = 2;
    while i + 1 < vals.len() {
        // " R" pair lifts the pen
        if encoded.as_bytes()[i] == b' ' {
            if !stroke.is_empty() {
                strokes.push(std::mem::take(&mut stroke));
            }
        } else {
            let p = Vec2::new(
                (vals[i] - left) as f64 * STROKE_FONT_SCALE,
                (vals[i + 1] - FONT_BASELINE) as f64 * STROKE_FONT_SCALE,
            );
            bbox.expand_point(p);
            stroke.push(p);
        }
        i += 2;
    }
    if !stroke.is_empty() {
        strokes.push(stroke);
    }
    Glyph {
        strokes,
        bbox,
        advance: (right - left) as f64 * STROKE_FONT_SCALE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decode_space() {
        // "JZ": bounds only, no strokes
        let glyph = decode("JZ");
        assert!(glyph.strokes.is_empty());
        assert_relative_eq!(glyph.advance, 16.0 / 21.0, epsilon = 1e-12);
    }

    #[test]
    fn test_decode_pen_up() {
        // "T": a vertical bar and a separate top bar
        let glyph = decode("JZRFR[ RKFYF");
        assert_eq!(glyph.strokes.len(), 2);
        // vertical stroke runs from the cap line to the baseline
        assert_relative_eq!(glyph.strokes[0][0].y, -21.0 / 21.0, epsilon = 1e-12);
        assert_relative_eq!(glyph.strokes[0][1].y, 0.0, epsilon = 1e-12);
        // x is left-bound relative
        assert_relative_eq!(glyph.strokes[0][0].x, 8.0 / 21.0, epsilon = 1e-12);
    }
}
