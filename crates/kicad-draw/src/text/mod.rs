//! Text shaping: markup parsing, stroke glyphs, layout and metrics.

pub mod font_data;
pub mod glyph;
pub mod markup;
pub mod stroke_font;

pub use glyph::Glyph;
pub use stroke_font::{LineLayout, RenderedText, StrokeFont, Word};

use kicad_parse::common::{Effects, HAlign, VAlign};

use crate::geom::{Angle, Vec2};

/// Resolved style for one piece of text, everything the font needs to lay
/// it out. Built from parsed `Effects` plus the owner's placement.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAttributes {
    pub size: Vec2,
    /// Requested pen width; zero means "derive from the size".
    pub thickness: f64,
    pub bold: bool,
    pub italic: bool,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub mirrored: bool,
    pub angle: Angle,
    pub line_spacing: f64,
}

impl Default for TextAttributes {
    fn default() -> Self {
        Self {
            size: Vec2::new(1.27, 1.27),
            thickness: 0.0,
            bold: false,
            italic: false,
            h_align: HAlign::Center,
            v_align: VAlign::Center,
            mirrored: false,
            angle: Angle::default(),
            line_spacing: 1.0,
        }
    }
}

impl TextAttributes {
    pub fn from_effects(effects: &Effects) -> Self {
        Self {
            size: Vec2::new(effects.font.size[0], effects.font.size[1]),
            thickness: effects.font.thickness.unwrap_or(0.0),
            bold: effects.font.bold,
            italic: effects.font.italic,
            h_align: effects.justify.horizontal,
            v_align: effects.justify.vertical,
            mirrored: effects.justify.mirror,
            angle: Angle::default(),
            line_spacing: effects.font.line_spacing.unwrap_or(1.0),
        }
    }
}
