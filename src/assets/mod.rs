pub mod decode;
pub mod source;

pub use decode::{decode_raster, rasterize_svg};
pub use source::{DefaultResolver, SourceRef, SourceResolver, decode_data_uri};

use crate::foundation::core::Raster;
use crate::foundation::error::TesseraResult;

/// Resolves and decodes sources for one render.
#[derive(Clone, Copy)]
pub struct Loader<'a> {
    resolver: &'a dyn SourceResolver,
}

impl<'a> Loader<'a> {
    pub fn new(resolver: &'a dyn SourceResolver) -> Self {
        Self { resolver }
    }

    pub fn bytes(&self, source: &SourceRef) -> TesseraResult<Vec<u8>> {
        self.resolver.resolve(source)
    }

    #[tracing::instrument(skip(self), fields(source = %source.key()))]
    pub fn raster(&self, source: &SourceRef) -> TesseraResult<Raster> {
        let bytes = self.bytes(source)?;
        decode_raster(&bytes)
    }
}
