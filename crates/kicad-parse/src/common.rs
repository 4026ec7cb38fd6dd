//! Record types shared between schematic and board documents.

use serde::Serialize;

use crate::error::ParseError;
use crate::schema::{FromSexpr, Reader};
use crate::sexpr::Sexpr;

// ─── Position ────────────────────────────────────────────────────────

/// `(at x y [angle])`. The angle unit depends on the owner: degrees for
/// free-standing items, decidegrees for text owned by a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct At {
    pub pos: [f64; 2],
    pub rotation: f64,
}

impl Default for At {
    fn default() -> Self {
        Self {
            pos: [0.0, 0.0],
            rotation: 0.0,
        }
    }
}

impl FromSexpr for At {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "at")?;
        Ok(Self {
            pos: [
                r.positional_f64().unwrap_or(0.0),
                r.positional_f64().unwrap_or(0.0),
            ],
            rotation: r.positional_f64().unwrap_or(0.0),
        })
    }
}

// ─── Color ───────────────────────────────────────────────────────────

/// `(color r g b a)` with channels 0-255 and alpha 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    /// KiCad writes `(color 0 0 0 0)` for "no explicit color".
    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }
}

impl FromSexpr for Color {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "color")?;
        Ok(Self {
            r: r.positional_f64().unwrap_or(0.0),
            g: r.positional_f64().unwrap_or(0.0),
            b: r.positional_f64().unwrap_or(0.0),
            a: r.positional_f64().unwrap_or(0.0),
        })
    }
}

// ─── Stroke ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeType {
    #[default]
    Default,
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
}

impl StrokeType {
    fn from_token(s: &str) -> Self {
        match s {
            "solid" => Self::Solid,
            "dash" => Self::Dash,
            "dot" => Self::Dot,
            "dash_dot" => Self::DashDot,
            "dash_dot_dot" => Self::DashDotDot,
            _ => Self::Default,
        }
    }
}

/// `(stroke (width w) (type t) (color r g b a))`. A zero width means
/// "use the theme default for whatever layer this lands on".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Stroke {
    pub width: f64,
    #[serde(rename = "type")]
    pub stroke_type: StrokeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl FromSexpr for Stroke {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "stroke")?;
        Ok(Self {
            width: r.pair_f64("width").unwrap_or(0.0),
            stroke_type: r
                .pair_str("type")
                .map(|t| StrokeType::from_token(&t))
                .unwrap_or_default(),
            color: r.item::<Color>("color")?,
        })
    }
}

/// Older records carry a bare `(width w)` instead of a stroke sub-record;
/// accept both, preferring the stroke.
pub(crate) fn stroke_or_width(r: &mut Reader) -> Result<Stroke, ParseError> {
    if let Some(stroke) = r.item::<Stroke>("stroke")? {
        return Ok(stroke);
    }
    Ok(Stroke {
        width: r.pair_f64("width").unwrap_or(0.0),
        ..Stroke::default()
    })
}

// ─── Fill ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillType {
    #[default]
    None,
    Outline,
    Background,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Fill {
    #[serde(rename = "type")]
    pub fill_type: FillType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl FromSexpr for Fill {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "fill")?;
        Ok(Self {
            fill_type: match r.pair_str("type").as_deref() {
                Some("outline") => FillType::Outline,
                Some("background") => FillType::Background,
                Some("color") => FillType::Color,
                _ => FillType::None,
            },
            color: r.item::<Color>("color")?,
        })
    }
}

// ─── Text effects ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Justify {
    pub horizontal: HAlign,
    pub vertical: VAlign,
    pub mirror: bool,
}

impl FromSexpr for Justify {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        Reader::start(expr, "justify")?;
        let mut out = Self::default();
        for token in expr.children().iter().filter_map(|c| c.as_atom()) {
            match token {
                "left" => out.horizontal = HAlign::Left,
                "right" => out.horizontal = HAlign::Right,
                "top" => out.vertical = VAlign::Top,
                "bottom" => out.vertical = VAlign::Bottom,
                "mirror" => out.mirror = true,
                _ => {}
            }
        }
        Ok(out)
    }
}

/// `(font ...)`. The file stores `(size height width)`; `size` here is
/// width-first to match drawing code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    pub size: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
}

/// 1.27 mm text is the KiCad default for both axes.
pub const DEFAULT_TEXT_SIZE: f64 = 1.27;

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            face: None,
            size: [DEFAULT_TEXT_SIZE, DEFAULT_TEXT_SIZE],
            thickness: None,
            bold: false,
            italic: false,
            color: None,
            line_spacing: None,
        }
    }
}

impl FromSexpr for FontStyle {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "font")?;
        let size = r
            .pair_xy("size")
            .map(|[h, w]| [w, h])
            .unwrap_or([DEFAULT_TEXT_SIZE, DEFAULT_TEXT_SIZE]);
        Ok(Self {
            face: r.pair_str("face"),
            size,
            thickness: r.pair_f64("thickness"),
            bold: r.flag("bold"),
            italic: r.flag("italic"),
            color: r.item::<Color>("color")?,
            line_spacing: r.pair_f64("line_spacing"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Effects {
    pub font: FontStyle,
    pub justify: Justify,
    pub hide: bool,
}

impl FromSexpr for Effects {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "effects")?;
        Ok(Self {
            font: r.item::<FontStyle>("font")?.unwrap_or_default(),
            justify: r.item::<Justify>("justify")?.unwrap_or_default(),
            hide: r.flag("hide"),
        })
    }
}

// ─── Paper and title block ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperSettings {
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub portrait: bool,
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            size: "A4".to_string(),
            width: None,
            height: None,
            portrait: false,
        }
    }
}

impl PaperSettings {
    /// Sheet dimensions in mm, landscape unless `portrait` is set.
    pub fn dimensions(&self) -> [f64; 2] {
        let landscape = match self.size.as_str() {
            "User" => [self.width.unwrap_or(297.0), self.height.unwrap_or(210.0)],
            "A5" => [210.0, 148.0],
            "A4" => [297.0, 210.0],
            "A3" => [420.0, 297.0],
            "A2" => [594.0, 420.0],
            "A1" => [841.0, 594.0],
            "A0" => [1189.0, 841.0],
            "A" => [279.4, 215.9],
            "B" => [431.8, 279.4],
            "C" => [558.8, 431.8],
            "D" => [863.6, 558.8],
            "E" => [1117.6, 863.6],
            _ => [297.0, 210.0],
        };
        if self.portrait {
            [landscape[1], landscape[0]]
        } else {
            landscape
        }
    }
}

impl FromSexpr for PaperSettings {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "paper")?;
        Ok(Self {
            size: r.positional_str().unwrap_or_else(|| "A4".to_string()),
            width: r.positional_f64(),
            height: r.positional_f64(),
            portrait: r.flag("portrait"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub number: i64,
    pub text: String,
}

impl FromSexpr for Comment {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "comment")?;
        Ok(Self {
            number: r.positional_int().unwrap_or(0),
            text: r.positional_str().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TitleBlock {
    pub title: String,
    pub date: String,
    pub rev: String,
    pub company: String,
    pub comments: Vec<Comment>,
}

impl FromSexpr for TitleBlock {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "title_block")?;
        Ok(Self {
            title: r.pair_str("title").unwrap_or_default(),
            date: r.pair_str("date").unwrap_or_default(),
            rev: r.pair_str("rev").unwrap_or_default(),
            company: r.pair_str("company").unwrap_or_default(),
            comments: r.collect(&["comment"])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexpr::parse;

    #[test]
    fn test_stroke_defaults() {
        // Omitted optional fields resolve to declared defaults.
        let expr = parse("(stroke (width 0.508))").unwrap();
        let stroke = Stroke::from_sexpr(&expr).unwrap();
        assert_eq!(stroke.width, 0.508);
        assert_eq!(stroke.stroke_type, StrokeType::Default);
        assert_eq!(stroke.color, None);
    }

    #[test]
    fn test_stroke_full() {
        let expr = parse("(stroke (width 0.254) (type dash) (color 128 0 0 1))").unwrap();
        let stroke = Stroke::from_sexpr(&expr).unwrap();
        assert_eq!(stroke.stroke_type, StrokeType::Dash);
        assert!(!stroke.color.unwrap().is_transparent());
    }

    #[test]
    fn test_effects_size_is_width_first() {
        let expr = parse("(effects (font (size 2.54 1.27)) (justify left bottom))").unwrap();
        let effects = Effects::from_sexpr(&expr).unwrap();
        // file order is (size h w)
        assert_eq!(effects.font.size, [1.27, 2.54]);
        assert_eq!(effects.justify.horizontal, HAlign::Left);
        assert_eq!(effects.justify.vertical, VAlign::Bottom);
        assert!(!effects.hide);
    }

    #[test]
    fn test_at_rotation_default() {
        let expr = parse("(at 227.33 96.52)").unwrap();
        let at = At::from_sexpr(&expr).unwrap();
        assert_eq!(at.pos, [227.33, 96.52]);
        assert_eq!(at.rotation, 0.0);
    }

    #[test]
    fn test_paper_user_size() {
        let expr = parse("(paper \"User\" 431.8 279.4)").unwrap();
        let paper = PaperSettings::from_sexpr(&expr).unwrap();
        assert_eq!(paper.dimensions(), [431.8, 279.4]);
    }

    #[test]
    fn test_title_block_comments() {
        let expr =
            parse("(title_block (title \"amp\") (rev \"B\") (comment 1 \"draft\"))").unwrap();
        let tb = TitleBlock::from_sexpr(&expr).unwrap();
        assert_eq!(tb.title, "amp");
        assert_eq!(tb.comments.len(), 1);
        assert_eq!(tb.comments[0].text, "draft");
    }
}
