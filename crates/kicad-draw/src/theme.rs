//! Color themes for schematic and board painting.
//!
//! Themes are plain data, JSON-loadable, with the stock palette as the
//! default for any field a theme file leaves out.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

// ─── Color ───────────────────────────────────────────────────────────

/// RGBA color, channels in 0..=1. Serializes as `#rrggbb` / `#rrggbbaa`
/// and parses those plus `rgb()` / `rgba()` notation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }

    pub fn to_css(&self) -> String {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", c(self.r), c(self.g), c(self.b))
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                c(self.r),
                c(self.g),
                c(self.b),
                c(self.a)
            )
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let v = u32::from_str_radix(hex, 16).ok()?;
            return Some(match hex.len() {
                6 => Self {
                    r: ((v >> 16) & 0xff) as f64 / 255.0,
                    g: ((v >> 8) & 0xff) as f64 / 255.0,
                    b: (v & 0xff) as f64 / 255.0,
                    a: 1.0,
                },
                8 => Self {
                    r: ((v >> 24) & 0xff) as f64 / 255.0,
                    g: ((v >> 16) & 0xff) as f64 / 255.0,
                    b: ((v >> 8) & 0xff) as f64 / 255.0,
                    a: (v & 0xff) as f64 / 255.0,
                },
                _ => return None,
            });
        }
        let body = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<f64> = body
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [r, g, b] => Some(Self {
                r: r / 255.0,
                g: g / 255.0,
                b: b / 255.0,
                a: 1.0,
            }),
            [r, g, b, a] => Some(Self {
                r: r / 255.0,
                g: g / 255.0,
                b: b / 255.0,
                a: *a,
            }),
            _ => None,
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Color::parse(&s).ok_or_else(|| de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Schematic theme ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchematicTheme {
    pub background: Color,
    pub note: Color,
    pub wire: Color,
    pub bus: Color,
    pub junction: Color,
    pub no_connect: Color,
    pub label_local: Color,
    pub label_global: Color,
    pub label_hier: Color,
    pub component_outline: Color,
    pub component_body: Color,
    pub pin: Color,
    pub pin_name: Color,
    pub pin_number: Color,
    pub reference: Color,
    pub value: Color,
    pub fields: Color,
    pub sheet: Color,
    pub sheet_background: Color,
    pub sheet_name: Color,
    pub sheet_filename: Color,
    pub sheet_label: Color,
    pub shadow: Color,
    /// Stroke width used when a record carries none, in mm.
    pub default_line_width: f64,
}

impl Default for SchematicTheme {
    fn default() -> Self {
        Self {
            background: Color::rgb(245, 244, 239),
            note: Color::rgb(0, 0, 194),
            wire: Color::rgb(0, 150, 0),
            bus: Color::rgb(0, 0, 132),
            junction: Color::rgb(0, 150, 0),
            no_connect: Color::rgb(0, 0, 132),
            label_local: Color::rgb(15, 15, 15),
            label_global: Color::rgb(132, 0, 0),
            label_hier: Color::rgb(114, 86, 0),
            component_outline: Color::rgb(132, 0, 0),
            component_body: Color::rgb(255, 255, 194),
            pin: Color::rgb(132, 0, 0),
            pin_name: Color::rgb(0, 100, 100),
            pin_number: Color::rgb(169, 0, 0),
            reference: Color::rgb(0, 100, 100),
            value: Color::rgb(0, 100, 100),
            fields: Color::rgb(0, 100, 100),
            sheet: Color::rgb(132, 0, 0),
            sheet_background: Color::rgb(255, 255, 255),
            sheet_name: Color::rgb(0, 100, 100),
            sheet_filename: Color::rgb(114, 86, 0),
            sheet_label: Color::rgb(0, 100, 100),
            shadow: Color::rgb(102, 179, 255).with_alpha(0.8),
            default_line_width: 0.1524,
        }
    }
}

// ─── Board theme ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardTheme {
    pub background: Color,
    pub f_cu: Color,
    pub b_cu: Color,
    /// Cycled through for inner copper layers.
    pub inner_cu: Vec<Color>,
    pub f_silks: Color,
    pub b_silks: Color,
    pub f_mask: Color,
    pub b_mask: Color,
    pub f_paste: Color,
    pub b_paste: Color,
    pub f_fab: Color,
    pub b_fab: Color,
    pub f_crtyd: Color,
    pub b_crtyd: Color,
    pub edge_cuts: Color,
    pub via: Color,
    pub via_hole: Color,
    pub pad_hole: Color,
    pub user_drawings: Color,
    /// Fill alpha applied to zone copper.
    pub zone_alpha: f64,
}

impl Default for BoardTheme {
    fn default() -> Self {
        Self {
            background: Color::rgb(0, 16, 35),
            f_cu: Color::rgb(200, 52, 52),
            b_cu: Color::rgb(77, 127, 196),
            inner_cu: vec![
                Color::rgb(127, 200, 127),
                Color::rgb(206, 125, 44),
                Color::rgb(79, 203, 203),
                Color::rgb(219, 98, 139),
            ],
            f_silks: Color::rgb(242, 237, 161),
            b_silks: Color::rgb(232, 178, 167),
            f_mask: Color::rgb(216, 100, 255).with_alpha(0.4),
            b_mask: Color::rgb(59, 100, 255).with_alpha(0.4),
            f_paste: Color::rgb(180, 160, 154),
            b_paste: Color::rgb(78, 129, 137),
            f_fab: Color::rgb(175, 175, 175),
            b_fab: Color::rgb(88, 93, 132),
            f_crtyd: Color::rgb(255, 38, 226),
            b_crtyd: Color::rgb(38, 233, 255),
            edge_cuts: Color::rgb(208, 210, 205),
            via: Color::rgb(236, 236, 236),
            via_hole: Color::rgb(12, 12, 12),
            pad_hole: Color::rgb(12, 12, 12),
            user_drawings: Color::rgb(194, 194, 194),
            zone_alpha: 0.6,
        }
    }
}

impl BoardTheme {
    /// Color for a canonical board layer name. Unknown layers get the
    /// user-drawing color so nothing silently disappears.
    pub fn for_layer(&self, name: &str) -> Color {
        match name {
            "F.Cu" => self.f_cu,
            "B.Cu" => self.b_cu,
            "F.SilkS" | "F.Silkscreen" => self.f_silks,
            "B.SilkS" | "B.Silkscreen" => self.b_silks,
            "F.Mask" => self.f_mask,
            "B.Mask" => self.b_mask,
            "F.Paste" => self.f_paste,
            "B.Paste" => self.b_paste,
            "F.Fab" => self.f_fab,
            "B.Fab" => self.b_fab,
            "F.CrtYd" => self.f_crtyd,
            "B.CrtYd" => self.b_crtyd,
            "Edge.Cuts" => self.edge_cuts,
            n if n.ends_with(".Cu") => {
                let index = n
                    .strip_prefix("In")
                    .and_then(|rest| rest.strip_suffix(".Cu"))
                    .and_then(|num| num.parse::<usize>().ok())
                    .unwrap_or(1);
                self.inner_cu[(index - 1) % self.inner_cu.len()]
            }
            _ => self.user_drawings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_roundtrip() {
        let c = Color::parse("#c83434").unwrap();
        assert_eq!(c.to_css(), "#c83434");
        let c = Color::parse("rgba(0, 150, 0, 0.5)").unwrap();
        assert_eq!(c.g, 150.0 / 255.0);
        assert_eq!(c.a, 0.5);
        assert!(Color::parse("bogus").is_none());
    }

    #[test]
    fn test_partial_theme_json_uses_defaults() {
        let theme: SchematicTheme = serde_json::from_str(r##"{"wire": "#ff0000"}"##).unwrap();
        assert_eq!(theme.wire, Color::rgb(255, 0, 0));
        assert_eq!(theme.junction, SchematicTheme::default().junction);
    }

    #[test]
    fn test_inner_copper_ramp() {
        let theme = BoardTheme::default();
        assert_eq!(theme.for_layer("In1.Cu"), theme.inner_cu[0]);
        assert_eq!(theme.for_layer("In2.Cu"), theme.inner_cu[1]);
        assert_eq!(theme.for_layer("In5.Cu"), theme.inner_cu[0]);
        assert_eq!(theme.for_layer("F.Cu"), theme.f_cu);
    }
}
