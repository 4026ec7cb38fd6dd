//! 2D geometry primitives shared by the text engine and painters.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use serde::ser::Serializer;
use serde::Serialize;

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Serialize an f64 rounded to 6 decimal places.
pub fn serialize_f64_rounded<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_f64(*v, 6))
}

// ─── Vec2 ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Angle of the vector from the positive x axis.
    pub fn angle(&self) -> Angle {
        Angle::from_radians(self.y.atan2(self.x))
    }

    pub fn rotate(&self, angle: Angle) -> Self {
        let (sin, cos) = angle.radians().sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Serialize for Vec2 {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        [round_f64(self.x, 6), round_f64(self.y, 6)].serialize(s)
    }
}

// ─── Angle ───────────────────────────────────────────────────────────

/// An angle kept in degrees, the unit the file format uses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Angle {
    pub degrees: f64,
}

impl Angle {
    pub const fn from_degrees(degrees: f64) -> Self {
        Self { degrees }
    }

    pub fn from_radians(radians: f64) -> Self {
        Self {
            degrees: radians * 180.0 / PI,
        }
    }

    pub fn radians(&self) -> f64 {
        self.degrees * PI / 180.0
    }

    /// Normalized into [0, 360).
    pub fn normalized(&self) -> Self {
        let mut d = self.degrees % 360.0;
        if d < 0.0 {
            d += 360.0;
        }
        Self { degrees: d }
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle::from_degrees(self.degrees + rhs.degrees)
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle::from_degrees(-self.degrees)
    }
}

// ─── Matrix3 ─────────────────────────────────────────────────────────

/// 2D affine transform: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix3 {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn translation(x: f64, y: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: x,
            f: y,
        }
    }

    pub fn rotation(angle: Angle) -> Self {
        let (sin, cos) = angle.radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self * rhs`: rhs is applied first, then self.
    pub fn multiply(&self, rhs: &Matrix3) -> Matrix3 {
        Matrix3 {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    pub fn transform(&self, p: Vec2) -> Vec2 {
        Vec2 {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    pub fn translate(&self, x: f64, y: f64) -> Matrix3 {
        self.multiply(&Matrix3::translation(x, y))
    }

    pub fn rotate(&self, angle: Angle) -> Matrix3 {
        self.multiply(&Matrix3::rotation(angle))
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Matrix3 {
        self.multiply(&Matrix3::scaling(sx, sy))
    }
}

// ─── BBox ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub min_x: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub min_y: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub max_x: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub max_y: f64,
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BBox {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// An empty box has seen no points.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    pub fn expand_point(&mut self, p: Vec2) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_point(*p);
        }
        bbox
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.is_valid()
            && p.x >= self.min_x
            && p.x <= self.max_x
            && p.y >= self.min_y
            && p.y <= self.max_y
    }

    pub fn inflate(&self, amount: f64) -> BBox {
        BBox {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }
}

// ─── Arcs ────────────────────────────────────────────────────────────

/// A circular arc in center/angle form, built from the three-point form
/// the file format stores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeom {
    pub center: Vec2,
    pub radius: f64,
    pub start_angle: Angle,
    pub end_angle: Angle,
}

impl ArcGeom {
    /// Circumcenter construction; collinear points yield `None` and the
    /// caller falls back to a straight segment.
    pub fn from_three_points(p1: Vec2, p2: Vec2, p3: Vec2) -> Option<Self> {
        let d = 2.0 * (p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y));
        if d.abs() < 1e-10 {
            return None;
        }
        let s1 = p1.x * p1.x + p1.y * p1.y;
        let s2 = p2.x * p2.x + p2.y * p2.y;
        let s3 = p3.x * p3.x + p3.y * p3.y;
        let ux = (s1 * (p2.y - p3.y) + s2 * (p3.y - p1.y) + s3 * (p1.y - p2.y)) / d;
        let uy = (s1 * (p3.x - p2.x) + s2 * (p1.x - p3.x) + s3 * (p2.x - p1.x)) / d;
        let center = Vec2::new(ux, uy);
        let radius = (p1 - center).length();
        let start = (p1 - center).angle();
        let mid = (p2 - center).angle();
        let end = (p3 - center).angle();
        // Unwind so the sweep passes through the midpoint.
        let mut a0 = start.degrees;
        let mut a1 = end.degrees;
        let am = mid.degrees;
        while a1 < a0 {
            a1 += 360.0;
        }
        let mut m = am;
        while m < a0 {
            m += 360.0;
        }
        if m > a1 {
            // midpoint outside the ccw sweep: the arc runs the other way
            let (s, e) = (a1 - 360.0, a0);
            a0 = s;
            a1 = e;
        }
        Some(Self {
            center,
            radius,
            start_angle: Angle::from_degrees(a0),
            end_angle: Angle::from_degrees(a1),
        })
    }

    /// Conservative bounds: the full circle.
    pub fn bbox(&self) -> BBox {
        BBox {
            min_x: self.center.x - self.radius,
            min_y: self.center.y - self.radius,
            max_x: self.center.x + self.radius,
            max_y: self.center.y + self.radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_compose_order() {
        // translate-then-rotate: the rotation applies to local coordinates
        let m = Matrix3::translation(10.0, 0.0).rotate(Angle::from_degrees(90.0));
        let p = m.transform(Vec2::new(1.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_arc_from_three_points() {
        let arc = ArcGeom::from_three_points(
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(arc.center.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(arc.center.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(arc.radius, 1.0, epsilon = 1e-9);
        let sweep = arc.end_angle.degrees - arc.start_angle.degrees;
        assert_relative_eq!(sweep.abs(), 180.0, epsilon = 1e-6);
    }

    #[test]
    fn test_arc_collinear_points() {
        assert!(ArcGeom::from_three_points(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0)
        )
        .is_none());
    }

    #[test]
    fn test_bbox_contains() {
        let bbox = BBox::from_points(&[Vec2::new(0.0, 0.0), Vec2::new(4.0, 2.0)]);
        assert!(bbox.contains(Vec2::new(2.0, 1.0)));
        assert!(!bbox.contains(Vec2::new(5.0, 1.0)));
        assert!(!BBox::empty().contains(Vec2::new(0.0, 0.0)));
    }
}
