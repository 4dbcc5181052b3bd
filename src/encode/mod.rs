//! Encoding rendered rasters and writing them out.

pub mod export;

pub use export::{ExportFormat, encode_raster, ensure_parent_dir, sniff_mime, to_base64, to_file};
