//! Declarative shapes and their normalized vector geometry.

pub mod angle;
pub mod build;
pub mod caps;
pub mod shape;

pub use angle::AngleValue;
pub use build::{Geometry, LineEnds, Outline, build_geometry};
pub use caps::{CapGlyph, LineCap, cap_extent, cap_glyph};
pub use shape::{
    ArcSpec, BooleanOp, CornerRadius, DEFAULT_STAR_INNER_RATIO, PathSource, Segment, Shape,
    ShapeKind,
};
