use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};

/// Largest side accepted when rasterizing SVG sources.
const MAX_SVG_DIM: u32 = 16_384;

/// Decode encoded image bytes (any format `image` understands, or SVG) into a premultiplied raster.
pub fn decode_raster(bytes: &[u8]) -> TesseraResult<Raster> {
    if bytes.is_empty() {
        return Err(TesseraError::resource("cannot decode empty image bytes"));
    }
    if looks_like_svg(bytes) {
        return rasterize_svg(bytes);
    }
    let img = image::load_from_memory(bytes)
        .map_err(|e| TesseraError::resource(format!("decode image from memory: {e}")))?;
    Raster::from_rgba_image(img.to_rgba8())
}

/// Rasterize an SVG document at its intrinsic size.
pub fn rasterize_svg(bytes: &[u8]) -> TesseraResult<Raster> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| TesseraError::resource(format!("parse svg tree: {e}")))?;

    let size = tree.size();
    let width = size.width().ceil().max(1.0) as u32;
    let height = size.height().ceil().max(1.0) as u32;
    if width > MAX_SVG_DIM || height > MAX_SVG_DIM {
        return Err(TesseraError::resource(format!(
            "svg size {width}x{height} exceeds {MAX_SVG_DIM}"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| TesseraError::render("allocate svg pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    // tiny-skia stores premultiplied RGBA8 already.
    Raster::from_premul(width, height, pixmap.take())
}

pub(crate) fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    (text.starts_with("<svg") || text.starts_with("<?xml")) && text.contains("<svg")
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
