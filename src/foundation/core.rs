use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::{premultiply_rgba8_in_place, rgba_len, unpremultiply_rgba8_in_place};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// A decoded image as premultiplied RGBA8 pixels.
///
/// Every in-process stage of the pipeline (raster backend, rasterizer, compositor, masks)
/// exchanges this type; encoded bytes only appear at backend and export boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl Raster {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> TesseraResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Raster where every pixel is the given premultiplied color.
    pub fn filled(width: u32, height: u32, premul: [u8; 4]) -> TesseraResult<Self> {
        let len = rgba_len(width, height)?;
        let mut data = vec![0u8; len];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> TesseraResult<Self> {
        let len = rgba_len(width, height)?;
        if data.len() != len {
            return Err(TesseraError::render(format!(
                "raster byte length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from straight-alpha RGBA8 bytes.
    pub fn from_straight(width: u32, height: u32, mut data: Vec<u8>) -> TesseraResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul(width, height, data)
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> TesseraResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_straight(width, height, img.into_raw())
    }

    /// Straight-alpha copy for `image` crate processing.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// View the premultiplied bytes as an `image` buffer (no conversion).
    pub(crate) fn premul_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    pub(crate) fn from_premul_image(img: image::RgbaImage) -> TesseraResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_premul(width, height, img.into_raw())
    }

    /// Resample to `width x height` in premultiplied space.
    pub fn resized(
        &self,
        width: u32,
        height: u32,
        filter: image::imageops::FilterType,
    ) -> TesseraResult<Self> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        rgba_len(width, height)?;
        Self::from_premul_image(image::imageops::resize(
            &self.premul_image(),
            width,
            height,
            filter,
        ))
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Alpha channel as a coverage mask.
    pub fn alpha(&self) -> Coverage {
        Coverage {
            width: self.width,
            height: self.height,
            data: self.data.chunks_exact(4).map(|px| px[3]).collect(),
        }
    }

    /// Tight bounds of non-transparent pixels as `(x0, y0, x1, y1)`, exclusive on the max side.
    pub fn opaque_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixel(x, y)[3] == 0 {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x + 1, y + 1),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
                });
            }
        }
        bounds
    }
}

/// Single-channel 8-bit coverage (alpha) mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Coverage {
    pub fn new(width: u32, height: u32) -> TesseraResult<Self> {
        let len = rgba_len(width, height)? / 4;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Pointwise combination with another coverage of the same size.
    pub fn zip_with(&self, other: &Coverage, f: impl Fn(u8, u8) -> u8) -> TesseraResult<Self> {
        if self.width != other.width || self.height != other.height {
            return Err(TesseraError::render("coverage size mismatch"));
        }
        Ok(Self {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }
}
