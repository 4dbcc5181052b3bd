//! Processing capability providers queried per operation tag.

pub mod approx;
pub mod image_ops;
pub mod magick;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Raster;
use crate::foundation::error::TesseraResult;
use crate::ops::{OpTag, Operation};

pub use approx::ApproxBackend;
pub use image_ops::ImageBackend;
pub use magick::{MagickBackend, MagickOpts, magick_args};

/// In-process backend working on decoded rasters, one operation at a time.
pub trait RasterBackend: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self, tag: OpTag) -> bool;
    fn apply(&self, raster: Raster, op: &Operation) -> TesseraResult<Raster>;
}

/// Backend consuming encoded PNG bytes and a whole run of operations per call.
pub trait BatchBackend: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self, tag: OpTag) -> bool;
    /// Health probe; an unavailable backend is treated like a failed call.
    fn is_available(&self) -> bool;
    fn apply_batch(&self, png: &[u8], ops: &[Operation]) -> TesseraResult<Vec<u8>>;
}

/// In-process stand-ins for batch operations.
pub trait FallbackBackend: Send + Sync {
    fn name(&self) -> &str;
    fn approximates(&self, tag: OpTag) -> bool;
    fn apply(&self, raster: Raster, op: &Operation) -> TesseraResult<Raster>;
}

/// What happens when the batch backend is unavailable or a batch call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Substitute approximations where they exist and report each substitution.
    #[default]
    Approximate,
    /// Fail the render.
    Strict,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = crate::foundation::error::TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approximate" => Ok(Self::Approximate),
            "strict" => Ok(Self::Strict),
            other => Err(crate::foundation::error::TesseraError::resolution(format!(
                "unknown fallback policy \"{other}\" (expected approximate|strict)"
            ))),
        }
    }
}

/// Batch backend that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBatch;

impl BatchBackend for NoBatch {
    fn name(&self) -> &str {
        "none"
    }

    fn supports(&self, _tag: OpTag) -> bool {
        false
    }

    fn is_available(&self) -> bool {
        false
    }

    fn apply_batch(&self, _png: &[u8], ops: &[Operation]) -> TesseraResult<Vec<u8>> {
        let tag = ops.first().map(|o| o.tag().as_str()).unwrap_or("batch");
        Err(crate::foundation::error::TesseraError::capability(tag))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/policy.rs"]
mod tests;
