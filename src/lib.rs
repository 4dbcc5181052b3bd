//! Tessera is a chainable image-composition pipeline.
//!
//! An [`Asset`] records a source plus an ordered list of [`Operation`]s: geometric transforms,
//! color adjustments, filters, vector shapes, text and masked overlays. A [`Renderer`] routes
//! each operation to the in-process raster backend, to the ImageMagick batch backend, or to the
//! compositor, and reports any operation that had to be approximated.
//!
//! - Build an [`Asset`] with chained calls or load one from JSON
//! - Render it with [`Asset::render`] or a configured [`Renderer`]
//! - Export PNG/JPEG bytes, a data URI, or a file
#![forbid(unsafe_code)]

pub mod assets;
pub mod backend;
pub mod compose;
pub mod encode;
pub mod foundation;
pub mod geometry;
pub mod layout;
pub mod ops;
pub mod pipeline;
pub mod render;
pub mod style;
pub mod text;

pub use crate::foundation::color::{Color, Gradient, Paint};
pub use crate::foundation::core::{Affine, BezPath, Point, Raster, Rect, Vec2};
pub use crate::foundation::error::{TesseraError, TesseraResult};

pub use crate::assets::{DefaultResolver, SourceRef, SourceResolver};
pub use crate::backend::{BatchBackend, FallbackBackend, FallbackPolicy, RasterBackend};
pub use crate::compose::{Group, Layer, LayerContent, Mask, MaskSource};
pub use crate::encode::ExportFormat;
pub use crate::geometry::{AngleValue, CornerRadius, PathSource, Shape, ShapeKind};
pub use crate::layout::placement::{Anchor, PlacementValue, Position};
pub use crate::ops::{OpTag, Operation, RegionBlur, RegionBlurMode};
pub use crate::pipeline::{
    Asset, AssetSource, Degradation, RenderReport, Rendered, Renderer, RendererOpts,
};
pub use crate::style::{BlendMode, Effect, ShapeStyle, Stroke, StrokePosition};
pub use crate::text::{FontRegistry, Text, TextStyle};
