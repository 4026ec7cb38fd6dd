pub mod error;
pub mod geom;
pub mod layers;
pub mod painters;
pub mod render;
pub mod text;
pub mod theme;

pub use error::DrawError;
pub use geom::{Angle, BBox, Matrix3, Vec2};
pub use layers::{ViewLayer, ViewLayerSet};
pub use painters::{BoardPainter, SchematicPainter};
pub use render::{RecordingRenderer, Renderer};
pub use theme::{BoardTheme, SchematicTheme};
