use std::path::Path;

use base64::Engine as _;
use image::ImageEncoder as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::{mul_div255_u16, unpremultiply_rgba8_in_place};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Output encoding for exported rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "kebab-case")]
pub enum ExportFormat {
    #[default]
    Png,
    /// Opaque output; transparent areas are flattened over white.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn jpeg() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Format implied by a file extension (`png`, `jpg`, `jpeg`).
    pub fn from_path(path: &Path) -> TesseraResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::jpeg()),
            _ => Err(TesseraError::validation(
                "export",
                format!(
                    "cannot infer an output format from '{}' (expected .png, .jpg or .jpeg)",
                    path.display()
                ),
            )),
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Encode a premultiplied raster.
pub fn encode_raster(raster: &Raster, format: ExportFormat) -> TesseraResult<Vec<u8>> {
    use anyhow::Context as _;

    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            let mut straight = raster.data.clone();
            unpremultiply_rgba8_in_place(&mut straight);
            image::codecs::png::PngEncoder::new(&mut out)
                .write_image(
                    &straight,
                    raster.width,
                    raster.height,
                    image::ExtendedColorType::Rgba8,
                )
                .context("PNG encode failed")?;
        }
        ExportFormat::Jpeg { quality } => {
            let rgb = flatten_premul_over_bg_to_rgb8(&raster.data, [255, 255, 255]);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .encode(&rgb, raster.width, raster.height, image::ExtendedColorType::Rgb8)
                .context("JPEG encode failed")?;
        }
    }
    Ok(out)
}

fn flatten_premul_over_bg_to_rgb8(src_premul: &[u8], bg_rgb: [u8; 3]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(src_premul.len() / 4 * 3);
    for s in src_premul.chunks_exact(4) {
        let a = u16::from(s[3]);
        if a == 255 {
            dst.extend_from_slice(&s[..3]);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let v = u16::from(s[c]) + mul_div255_u16(u16::from(bg_rgb[c]), inv);
            dst.push(v.min(255) as u8);
        }
    }
    dst
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> TesseraResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write encoded bytes, creating parent directories as needed.
pub fn to_file(bytes: &[u8], path: &Path) -> TesseraResult<()> {
    use anyhow::Context as _;

    ensure_parent_dir(path)?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "exported");
    Ok(())
}

/// MIME type from PNG, JPEG, GIF or WebP magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// `data:` URI of the bytes; without an explicit MIME the type is sniffed.
pub fn to_base64(bytes: &[u8], mime: Option<&str>) -> String {
    let mime = mime
        .or_else(|| sniff_mime(bytes))
        .unwrap_or("application/octet-stream");
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

#[cfg(test)]
#[path = "../../tests/unit/encode/export.rs"]
mod tests;
