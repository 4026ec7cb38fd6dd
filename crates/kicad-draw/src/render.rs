//! The renderer capability boundary.
//!
//! Painters speak to any backend through [`Renderer`]: layer bracketing,
//! four primitives, a transform state stack, and bounding-box tracking.
//! [`RecordingRenderer`] is the built-in backend that captures world-space
//! primitives per layer; it feeds hit-testing, tests, and the dump tool.

use serde::Serialize;

use crate::geom::{serialize_f64_rounded, Angle, BBox, Matrix3, Vec2};
use crate::theme::Color;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderState {
    pub matrix: Matrix3,
}

/// Draw-call sink. Push/pop discipline is mandatory: every painter that
/// pushes must pop on all exit paths.
pub trait Renderer {
    fn push_state(&mut self);
    fn pop_state(&mut self);
    fn state_mut(&mut self) -> &mut RenderState;

    fn start_layer(&mut self, name: &str);
    fn end_layer(&mut self);

    /// Begin accumulating the extents of everything drawn until the
    /// matching [`Renderer::end_bbox`].
    fn start_bbox(&mut self);
    fn end_bbox(&mut self) -> BBox;

    fn line(&mut self, points: &[Vec2], width: f64, color: Color);
    fn circle(&mut self, center: Vec2, radius: f64, color: Color);
    fn arc(
        &mut self,
        center: Vec2,
        radius: f64,
        start_angle: Angle,
        end_angle: Angle,
        width: f64,
        color: Color,
    );
    fn polygon(&mut self, points: &[Vec2], color: Color);
}

// ─── Recorded primitives ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive {
    Line {
        points: Vec<Vec2>,
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
        color: Color,
    },
    Circle {
        center: Vec2,
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        color: Color,
    },
    Arc {
        center: Vec2,
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        start_angle: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        end_angle: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
        color: Color,
    },
    Polygon {
        points: Vec<Vec2>,
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedLayer {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

/// Captures primitives in world space (the current matrix is applied as
/// calls are recorded). Widths pass through untransformed; painters only
/// use rigid transforms.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    layers: Vec<RecordedLayer>,
    current: Option<usize>,
    stack: Vec<RenderState>,
    bbox_stack: Vec<BBox>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            current: None,
            stack: vec![RenderState::default()],
            bbox_stack: Vec::new(),
        }
    }

    pub fn layers(&self) -> &[RecordedLayer] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<RecordedLayer> {
        self.layers
    }

    /// Union of everything recorded so far.
    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for layer in &self.layers {
            for primitive in &layer.primitives {
                bbox = bbox.union(&primitive_bbox(primitive));
            }
        }
        bbox
    }

    fn matrix(&self) -> Matrix3 {
        self.stack.last().map(|s| s.matrix).unwrap_or_default()
    }

    fn record(&mut self, primitive: Primitive) {
        let bbox = primitive_bbox(&primitive);
        for tracker in &mut self.bbox_stack {
            *tracker = tracker.union(&bbox);
        }
        match self.current {
            Some(index) => self.layers[index].primitives.push(primitive),
            None => log::warn!("draw call outside start_layer/end_layer, dropped"),
        }
    }
}

fn primitive_bbox(primitive: &Primitive) -> BBox {
    match primitive {
        Primitive::Line { points, width, .. } => BBox::from_points(points).inflate(width / 2.0),
        Primitive::Circle { center, radius, .. } => BBox {
            min_x: center.x - radius,
            min_y: center.y - radius,
            max_x: center.x + radius,
            max_y: center.y + radius,
        },
        Primitive::Arc {
            center,
            radius,
            width,
            ..
        } => BBox {
            min_x: center.x - radius,
            min_y: center.y - radius,
            max_x: center.x + radius,
            max_y: center.y + radius,
        }
        .inflate(width / 2.0),
        Primitive::Polygon { points, .. } => BBox::from_points(points),
    }
}

impl Renderer for RecordingRenderer {
    fn push_state(&mut self) {
        let top = *self.stack.last().unwrap_or(&RenderState::default());
        self.stack.push(top);
    }

    fn pop_state(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            log::warn!("state stack underflow");
        }
    }

    fn state_mut(&mut self) -> &mut RenderState {
        if self.stack.is_empty() {
            self.stack.push(RenderState::default());
        }
        self.stack.last_mut().unwrap()
    }

    fn start_layer(&mut self, name: &str) {
        self.layers.push(RecordedLayer {
            name: name.to_string(),
            primitives: Vec::new(),
        });
        self.current = Some(self.layers.len() - 1);
    }

    fn end_layer(&mut self) {
        self.current = None;
    }

    fn start_bbox(&mut self) {
        self.bbox_stack.push(BBox::empty());
    }

    fn end_bbox(&mut self) -> BBox {
        self.bbox_stack.pop().unwrap_or_else(BBox::empty)
    }

    fn line(&mut self, points: &[Vec2], width: f64, color: Color) {
        let m = self.matrix();
        self.record(Primitive::Line {
            points: points.iter().map(|p| m.transform(*p)).collect(),
            width,
            color,
        });
    }

    fn circle(&mut self, center: Vec2, radius: f64, color: Color) {
        let m = self.matrix();
        self.record(Primitive::Circle {
            center: m.transform(center),
            radius,
            color,
        });
    }

    fn arc(
        &mut self,
        center: Vec2,
        radius: f64,
        start_angle: Angle,
        end_angle: Angle,
        width: f64,
        color: Color,
    ) {
        // Rigid transforms only: rotate the sweep angles through the
        // matrix's linear part, and a mirror reverses the sweep.
        let m = self.matrix();
        let rotate = |a: Angle| {
            let (sin, cos) = a.radians().sin_cos();
            Vec2::new(m.a * cos + m.c * sin, m.b * cos + m.d * sin)
                .angle()
                .degrees
        };
        let mut start = rotate(start_angle);
        let mut end = rotate(end_angle);
        if m.a * m.d - m.b * m.c < 0.0 {
            std::mem::swap(&mut start, &mut end);
        }
        self.record(Primitive::Arc {
            center: m.transform(center),
            radius,
            start_angle: start,
            end_angle: end,
            width,
            color,
        });
    }

    fn polygon(&mut self, points: &[Vec2], color: Color) {
        let m = self.matrix();
        self.record(Primitive::Polygon {
            points: points.iter().map(|p| m.transform(*p)).collect(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_applied_at_record_time() {
        let mut r = RecordingRenderer::new();
        r.start_layer("test");
        r.push_state();
        r.state_mut().matrix = Matrix3::translation(10.0, 5.0);
        r.circle(Vec2::new(1.0, 1.0), 2.0, Color::rgb(255, 0, 0));
        r.pop_state();
        r.end_layer();
        let Primitive::Circle { center, .. } = &r.layers()[0].primitives[0] else {
            panic!("expected circle");
        };
        assert_relative_eq!(center.x, 11.0);
        assert_relative_eq!(center.y, 6.0);
    }

    #[test]
    fn test_bbox_tracking_brackets_draw_calls() {
        let mut r = RecordingRenderer::new();
        r.start_layer("test");
        r.start_bbox();
        r.line(
            &[Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0)],
            2.0,
            Color::rgb(0, 0, 0),
        );
        let bbox = r.end_bbox();
        assert_relative_eq!(bbox.min_y, -1.0);
        assert_relative_eq!(bbox.max_x, 5.0);
        // drawing after end_bbox is not tracked
        r.start_bbox();
        let empty = r.end_bbox();
        assert!(!empty.is_valid());
        r.end_layer();
    }

    #[test]
    fn test_pop_keeps_base_state() {
        let mut r = RecordingRenderer::new();
        r.pop_state();
        assert_eq!(r.state_mut().matrix, Matrix3::identity());
    }
}
