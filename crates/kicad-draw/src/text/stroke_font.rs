//! Stroke-font layout and drawing.
//!
//! Turns `(text, size, position, angle, mirror, alignment)` into stroke
//! geometry plus a combined bounding box, and answers the sizing queries
//! (line extents, word widths, line breaking) layout code needs before
//! anything is drawn.

use std::sync::OnceLock;

use kicad_parse::common::{HAlign, VAlign};

use super::font_data::{FIRST_CHAR, GLYPH_DATA};
use super::glyph::{decode, Glyph};
use super::markup::{self, MarkupNode};
use super::TextAttributes;
use crate::geom::{BBox, Vec2};

/// Distance between baselines, in multiples of the text height.
pub const INTERLINE_PITCH_RATIO: f64 = 1.62;

/// Overbar position above the baseline, in multiples of the text height.
pub const OVERBAR_POSITION_FACTOR: f64 = 1.22;

/// Italic glyphs shear right by this fraction of their height.
pub const ITALIC_TILT: f64 = 1.0 / 8.0;

/// Size ratio applied to superscript/subscript runs.
pub const SUPERSUB_SIZE_RATIO: f64 = 0.7;

/// Baseline shift of superscript/subscript runs, in multiples of the
/// surrounding text height (y grows downward).
pub const SUPERSCRIPT_OFFSET_RATIO: f64 = -0.5;
pub const SUBSCRIPT_OFFSET_RATIO: f64 = 0.3;

/// Derived pen width as a fraction of the text width.
const THICKNESS_RATIO_NORMAL: f64 = 1.0 / 8.0;
const THICKNESS_RATIO_BOLD: f64 = 1.0 / 5.0;

/// Pen width ceiling, as a fraction of the text width, past which glyph
/// strokes start to merge into each other.
const MAX_THICKNESS_RATIO_NORMAL: f64 = 0.18;
const MAX_THICKNESS_RATIO_BOLD: f64 = 0.25;

/// One line of laid-out glyph strokes, before alignment.
#[derive(Debug, Clone)]
pub struct LineLayout {
    pub strokes: Vec<Vec<Vec2>>,
    pub bbox: BBox,
    /// Final cursor x: the advance width of the whole line.
    pub advance: f64,
}

/// A word yielded by markup-aware word breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub width: f64,
}

/// Fully laid-out text: world-space strokes plus the combined box.
#[derive(Debug, Clone)]
pub struct RenderedText {
    pub strokes: Vec<Vec<Vec2>>,
    pub bbox: BBox,
    pub thickness: f64,
}

pub struct StrokeFont {
    glyphs: Vec<Glyph>,
    replacement: usize,
}

impl StrokeFont {
    /// The built-in font, decoded once per process.
    pub fn get() -> &'static StrokeFont {
        static FONT: OnceLock<StrokeFont> = OnceLock::new();
        FONT.get_or_init(StrokeFont::load)
    }

    fn load() -> Self {
        Self {
            glyphs: GLYPH_DATA.iter().map(|g| decode(g)).collect(),
            replacement: '?' as usize - FIRST_CHAR as usize,
        }
    }

    /// Glyph shape lookup by character; anything outside the table draws
    /// as the replacement glyph.
    pub fn glyph(&self, c: char) -> &Glyph {
        let index = (c as usize)
            .checked_sub(FIRST_CHAR as usize)
            .filter(|i| *i < self.glyphs.len())
            .unwrap_or(self.replacement);
        &self.glyphs[index]
    }

    /// Baseline-to-baseline distance.
    pub fn interline(&self, size_y: f64, line_spacing: f64) -> f64 {
        size_y * INTERLINE_PITCH_RATIO * line_spacing
    }

    /// Effective pen width: an explicit valid thickness wins over the
    /// bold/normal derived width, and either is clamped so glyphs do not
    /// overlap themselves.
    pub fn effective_thickness(&self, thickness: f64, width: f64, bold: bool) -> f64 {
        let (ratio, max_ratio) = if bold {
            (THICKNESS_RATIO_BOLD, MAX_THICKNESS_RATIO_BOLD)
        } else {
            (THICKNESS_RATIO_NORMAL, MAX_THICKNESS_RATIO_NORMAL)
        };
        let pen = if thickness > 0.0 {
            thickness
        } else {
            width * ratio
        };
        pen.min(width * max_ratio)
    }

    // ─── Single-line layout ──────────────────────────────────────────

    /// Lay out one line of markup text with the anchor at the origin and
    /// the baseline at y = 0.
    pub fn get_text_as_glyphs(&self, text: &str, size: Vec2, italic: bool) -> LineLayout {
        let root = markup::parse(text);
        let mut layout = LineLayout {
            strokes: Vec::new(),
            bbox: BBox::empty(),
            advance: 0.0,
        };
        self.render_node(&root, size, italic, 0.0, &mut layout);
        layout
    }

    fn render_node(
        &self,
        node: &MarkupNode,
        size: Vec2,
        italic: bool,
        v_offset: f64,
        out: &mut LineLayout,
    ) {
        let (size, v_offset) = if node.superscript {
            (
                size * SUPERSUB_SIZE_RATIO,
                v_offset + size.y * SUPERSCRIPT_OFFSET_RATIO,
            )
        } else if node.subscript {
            (
                size * SUPERSUB_SIZE_RATIO,
                v_offset + size.y * SUBSCRIPT_OFFSET_RATIO,
            )
        } else {
            (size, v_offset)
        };

        let span_start = out.advance;

        if let Some(text) = &node.text {
            for c in text.chars() {
                let glyph = self.glyph(c);
                for stroke in &glyph.strokes {
                    let mut points = Vec::with_capacity(stroke.len());
                    for p in stroke {
                        let y = v_offset + p.y * size.y;
                        let mut x = out.advance + p.x * size.x;
                        if italic {
                            x -= y * ITALIC_TILT;
                        }
                        let world = Vec2::new(x, y);
                        out.bbox.expand_point(world);
                        points.push(world);
                    }
                    out.strokes.push(points);
                }
                out.advance += glyph.advance * size.x;
            }
        }
        for child in &node.children {
            self.render_node(child, size, italic, v_offset, out);
        }

        if node.overbar {
            let y = v_offset - size.y * OVERBAR_POSITION_FACTOR;
            let bar = vec![Vec2::new(span_start, y), Vec2::new(out.advance, y)];
            out.bbox.expand_point(bar[0]);
            out.bbox.expand_point(bar[1]);
            out.strokes.push(bar);
        }
    }

    /// Width and height one line of text will occupy, pen width included.
    pub fn get_line_extents(
        &self,
        text: &str,
        size: Vec2,
        thickness: f64,
        bold: bool,
        italic: bool,
    ) -> Vec2 {
        let pen = self.effective_thickness(thickness, size.x, bold);
        let layout = self.get_text_as_glyphs(text, size, italic);
        if layout.bbox.is_valid() {
            Vec2::new(layout.bbox.width() + pen, layout.bbox.height() + pen)
        } else {
            Vec2::new(layout.advance, size.y)
        }
    }

    // ─── Word and line breaking ──────────────────────────────────────

    /// Split on spaces, but never inside a markup span: `^{a b}` is one
    /// word. Each word is paired with its measured width.
    pub fn wordbreak_markup(&self, text: &str, size: Vec2, italic: bool) -> Vec<Word> {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let chars: Vec<char> = text.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            match c {
                '{' if i > 0 && matches!(chars[i - 1], '^' | '_' | '~') => {
                    depth += 1;
                    current.push(c);
                }
                '}' if depth > 0 => {
                    depth -= 1;
                    current.push(c);
                }
                ' ' if depth == 0 => {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            words.push(current);
        }
        words
            .into_iter()
            .map(|text| {
                let width = self.get_text_as_glyphs(&text, size, italic).advance;
                Word { text, width }
            })
            .collect()
    }

    /// Repack words into lines no wider than `column_width`, pen width
    /// reserved. A word too wide for an empty line is emitted anyway.
    pub fn break_lines(
        &self,
        text: &str,
        column_width: f64,
        size: Vec2,
        thickness: f64,
        bold: bool,
        italic: bool,
    ) -> Vec<String> {
        let pen = self.effective_thickness(thickness, size.x, bold);
        let space_width = self.glyph(' ').advance * size.x;
        let mut lines = Vec::new();
        for source_line in text.split('\n') {
            let words = self.wordbreak_markup(source_line, size, italic);
            if words.is_empty() {
                lines.push(String::new());
                continue;
            }
            let mut line = String::new();
            let mut running = 0.0;
            for word in words {
                if line.is_empty() {
                    line = word.text;
                    running = word.width;
                } else if running + space_width + word.width < column_width - pen {
                    line.push(' ');
                    line.push_str(&word.text);
                    running += space_width + word.width;
                } else {
                    lines.push(std::mem::replace(&mut line, word.text));
                    running = word.width;
                }
            }
            lines.push(line);
        }
        lines
    }

    // ─── Full drawing ────────────────────────────────────────────────

    /// Lay out possibly multi-line text anchored at `position`. Alignment
    /// and mirroring are resolved around the anchor, then the whole block
    /// is rotated about it.
    pub fn draw(&self, text: &str, position: Vec2, attrs: &TextAttributes) -> RenderedText {
        let size = attrs.size;
        let lines: Vec<&str> = text.split('\n').collect();
        let interline = self.interline(size.y, attrs.line_spacing);
        let block_height = size.y + (lines.len() - 1) as f64 * interline;
        let first_baseline = match attrs.v_align {
            VAlign::Top => size.y,
            VAlign::Center => size.y - block_height / 2.0,
            VAlign::Bottom => size.y - block_height,
        };

        let mut strokes: Vec<Vec<Vec2>> = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let layout = self.get_text_as_glyphs(line, size, attrs.italic);
            let h_offset = match attrs.h_align {
                HAlign::Left => 0.0,
                HAlign::Center => -layout.advance / 2.0,
                HAlign::Right => -layout.advance,
            };
            let baseline = first_baseline + i as f64 * interline;
            for stroke in layout.strokes {
                strokes.push(
                    stroke
                        .into_iter()
                        .map(|p| Vec2::new(p.x + h_offset, p.y + baseline))
                        .collect(),
                );
            }
        }

        let mut bbox = BBox::empty();
        for stroke in &mut strokes {
            for p in stroke.iter_mut() {
                if attrs.mirrored {
                    p.x = -p.x;
                }
                *p = p.rotate(attrs.angle) + position;
                bbox.expand_point(*p);
            }
        }

        RenderedText {
            strokes,
            bbox,
            thickness: self.effective_thickness(attrs.thickness, size.x, attrs.bold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Angle;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn font() -> &'static StrokeFont {
        StrokeFont::get()
    }

    #[test]
    fn test_line_extents_reference_values() {
        // Fixed reference metrics; layout changes must not drift these.
        let extents = font().get_line_extents(
            "hello world",
            Vec2::new(12700.0, 12700.0),
            1588.0,
            false,
            false,
        );
        assert_abs_diff_eq!(extents.x, 87464.190476, epsilon = 0.5);
        assert_abs_diff_eq!(extents.y, 10054.666667, epsilon = 0.5);
    }

    #[test]
    fn test_wordbreak_markup_spans_are_atomic() {
        let size = Vec2::new(12700.0, 12700.0);
        let words = font().wordbreak_markup("hello ^{world} 1 2 3", size, false);
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "^{world}", "1", "2", "3"]);
        assert_abs_diff_eq!(words[0].width, 38704.761905, epsilon = 0.5);
        // the span is measured at the superscript size ratio
        assert_abs_diff_eq!(words[1].width, 28786.666667, epsilon = 0.5);
        assert_abs_diff_eq!(words[2].width, 10885.714286, epsilon = 0.5);
    }

    #[test]
    fn test_break_lines_packing() {
        let size = Vec2::new(12700.0, 12700.0);
        // "hello world" advances to ~89505 plus pen margin
        let wide = font().break_lines("hello world", 100000.0, size, 1588.0, false, false);
        assert_eq!(wide, vec!["hello world".to_string()]);
        let narrow = font().break_lines("hello world", 50000.0, size, 1588.0, false, false);
        assert_eq!(narrow, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn test_interline() {
        assert_relative_eq!(font().interline(12700.0, 1.0), 20574.0, epsilon = 1e-9);
    }

    #[test]
    fn test_effective_thickness_clamps() {
        let f = font();
        // derived from the normal ratio
        assert_relative_eq!(
            f.effective_thickness(0.0, 12700.0, false),
            12700.0 / 8.0,
            epsilon = 1e-9
        );
        // explicit but excessive: clamped to 18% of width
        assert_relative_eq!(
            f.effective_thickness(5000.0, 12700.0, false),
            12700.0 * 0.18,
            epsilon = 1e-9
        );
        // bold ceiling is 25%
        assert_relative_eq!(
            f.effective_thickness(5000.0, 12700.0, true),
            12700.0 * 0.25,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_draw_mirrors_around_anchor() {
        let attrs = TextAttributes {
            size: Vec2::new(1.27, 1.27),
            ..TextAttributes::default()
        };
        let anchor = Vec2::new(10.0, 0.0);
        let plain = font().draw("F", anchor, &attrs);
        let mirrored = font().draw(
            "F",
            anchor,
            &TextAttributes {
                mirrored: true,
                ..attrs
            },
        );
        // the box reflects across x = anchor.x, not across the origin
        assert_relative_eq!(
            plain.bbox.max_x - anchor.x,
            anchor.x - mirrored.bbox.min_x,
            epsilon = 1e-9
        );
        assert_relative_eq!(plain.bbox.min_y, mirrored.bbox.min_y, epsilon = 1e-9);
    }

    #[test]
    fn test_draw_rotation_about_anchor() {
        let attrs = TextAttributes {
            size: Vec2::new(1.27, 1.27),
            ..TextAttributes::default()
        };
        let anchor = Vec2::new(5.0, 5.0);
        let horizontal = font().draw("III", anchor, &attrs);
        let vertical = font().draw(
            "III",
            anchor,
            &TextAttributes {
                angle: Angle::from_degrees(90.0),
                ..attrs
            },
        );
        assert_relative_eq!(
            horizontal.bbox.width(),
            vertical.bbox.height(),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            horizontal.bbox.height(),
            vertical.bbox.width(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_draw_vertical_center_alignment() {
        use kicad_parse::common::VAlign;
        let size = Vec2::new(12700.0, 12700.0);
        let attrs = TextAttributes {
            size,
            v_align: VAlign::Center,
            ..TextAttributes::default()
        };
        let two = font().draw("II\nII", Vec2::default(), &attrs);
        // two lines centered: block top above the anchor, bottom below
        let block = size.y + font().interline(size.y, 1.0);
        assert_abs_diff_eq!(two.bbox.max_y, block / 2.0, epsilon = 0.5);
    }

    #[test]
    fn test_repeated_draw_is_identical() {
        let attrs = TextAttributes::default();
        let a = font().draw("R1 ~{RST}", Vec2::new(1.0, 2.0), &attrs);
        let b = font().draw("R1 ~{RST}", Vec2::new(1.0, 2.0), &attrs);
        assert_eq!(a.strokes, b.strokes);
        assert_eq!(a.bbox, b.bbox);
    }
}
