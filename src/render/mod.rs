//! Pixel kernels and the vector shape rasterizer.

pub mod blur;
pub mod composite;
pub mod distance;
pub mod effects;
pub mod paint;
pub mod raster;
pub mod shape;

pub use composite::{composite_at, dest_in, dest_out, over_in_place};
pub use shape::{geometry_coverage, render_shape};
