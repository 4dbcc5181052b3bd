use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assets::{DefaultResolver, Loader, SourceResolver, decode_raster};
use crate::backend::{
    ApproxBackend, BatchBackend, FallbackBackend, FallbackPolicy, ImageBackend, MagickBackend,
    MagickOpts, RasterBackend,
};
use crate::compose::overlay::LayerContext;
use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::pipeline::asset::{Asset, AssetSource, MAX_NESTING_DEPTH, nesting_error};
use crate::pipeline::dispatch::{Dispatcher, ImageBuffer, RenderReport, decoded};
use crate::text::FontRegistry;

/// Renderer configuration. Environment overrides come from [`RendererOpts::from_env`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOpts {
    /// Batch executable; `None` probes `magick` then `convert` on PATH.
    pub magick_binary: Option<PathBuf>,
    pub batch_timeout_ms: u64,
    pub batch_max_output_bytes: u64,
    pub fallback: FallbackPolicy,
    pub max_nesting_depth: usize,
    /// Base directory for relative source paths.
    pub source_root: Option<PathBuf>,
    /// Worker threads for [`Renderer::render_all`]. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl Default for RendererOpts {
    fn default() -> Self {
        let magick = MagickOpts::default();
        Self {
            magick_binary: None,
            batch_timeout_ms: magick.timeout_ms,
            batch_max_output_bytes: magick.max_output_bytes,
            fallback: FallbackPolicy::Approximate,
            max_nesting_depth: MAX_NESTING_DEPTH,
            source_root: None,
            threads: None,
        }
    }
}

impl RendererOpts {
    /// Defaults overridden by `TESSERA_MAGICK_BINARY`, `TESSERA_BATCH_TIMEOUT_MS`,
    /// `TESSERA_BATCH_MAX_OUTPUT_BYTES` and `TESSERA_FALLBACK`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        if let Some(bin) = lookup("TESSERA_MAGICK_BINARY").filter(|v| !v.trim().is_empty()) {
            opts.magick_binary = Some(PathBuf::from(bin));
        }
        if let Some(ms) = lookup("TESSERA_BATCH_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            opts.batch_timeout_ms = ms;
        }
        if let Some(cap) = lookup("TESSERA_BATCH_MAX_OUTPUT_BYTES")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            opts.batch_max_output_bytes = cap;
        }
        if let Some(policy) = lookup("TESSERA_FALLBACK").and_then(|v| v.parse().ok()) {
            opts.fallback = policy;
        }
        opts
    }

    pub fn with_magick_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.magick_binary = Some(path.into());
        self
    }

    pub fn with_batch_timeout_ms(mut self, ms: u64) -> Self {
        self.batch_timeout_ms = ms;
        self
    }

    pub fn with_batch_max_output_bytes(mut self, bytes: u64) -> Self {
        self.batch_max_output_bytes = bytes;
        self
    }

    pub fn with_fallback(mut self, policy: FallbackPolicy) -> Self {
        self.fallback = policy;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    fn magick_opts(&self) -> MagickOpts {
        MagickOpts {
            binary: self.magick_binary.clone(),
            timeout_ms: self.batch_timeout_ms,
            max_output_bytes: self.batch_max_output_bytes,
        }
    }
}

/// Final pixels plus what happened on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub raster: Raster,
    pub report: RenderReport,
}

/// Shared render context: resolver, fonts and backends. `Send + Sync`.
pub struct Renderer {
    opts: RendererOpts,
    resolver: Arc<dyn SourceResolver>,
    fonts: Arc<FontRegistry>,
    raster: Arc<dyn RasterBackend>,
    batch: Arc<dyn BatchBackend>,
    fallback: Arc<dyn FallbackBackend>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RendererOpts::default())
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("opts", &self.opts)
            .field("raster", &self.raster.name())
            .field("batch", &self.batch.name())
            .field("fallback", &self.fallback.name())
            .field("fonts", &self.fonts)
            .finish()
    }
}

impl Renderer {
    /// Default backends: `image` raster kernels, ImageMagick batch, in-process approximations.
    pub fn new(opts: RendererOpts) -> Self {
        let resolver = match &opts.source_root {
            Some(root) => DefaultResolver::with_root(root.clone()),
            None => DefaultResolver::new(),
        };
        Self {
            resolver: Arc::new(resolver),
            fonts: Arc::new(FontRegistry::with_system_fonts()),
            raster: Arc::new(ImageBackend),
            batch: Arc::new(MagickBackend::new(opts.magick_opts())),
            fallback: Arc::new(ApproxBackend),
            opts,
        }
    }

    /// Process-wide renderer with default options, built on first use.
    ///
    /// Backs the convenience calls on [`Asset`] so the system font is read once.
    pub fn shared() -> &'static Renderer {
        static SHARED: OnceLock<Renderer> = OnceLock::new();
        SHARED.get_or_init(Renderer::default)
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_fonts(mut self, fonts: Arc<FontRegistry>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_raster_backend(mut self, backend: Arc<dyn RasterBackend>) -> Self {
        self.raster = backend;
        self
    }

    pub fn with_batch_backend(mut self, backend: Arc<dyn BatchBackend>) -> Self {
        self.batch = backend;
        self
    }

    pub fn with_fallback_backend(mut self, backend: Arc<dyn FallbackBackend>) -> Self {
        self.fallback = backend;
        self
    }

    pub fn opts(&self) -> &RendererOpts {
        &self.opts
    }

    pub fn fonts(&self) -> &Arc<FontRegistry> {
        &self.fonts
    }

    #[tracing::instrument(skip_all, fields(ops = asset.ops.len()))]
    pub fn render(&self, asset: &Asset) -> TesseraResult<Rendered> {
        self.render_at_depth(asset, 0)
    }

    /// Render independent assets in parallel; results keep the input order.
    pub fn render_all(&self, assets: &[Asset]) -> TesseraResult<Vec<TesseraResult<Rendered>>> {
        let pool = build_thread_pool(self.opts.threads)?;
        Ok(pool.install(|| assets.par_iter().map(|a| self.render(a)).collect()))
    }

    fn render_at_depth(&self, asset: &Asset, depth: usize) -> TesseraResult<Rendered> {
        if depth > self.opts.max_nesting_depth {
            return Err(nesting_error(self.opts.max_nesting_depth));
        }
        // nested assets were covered when their parent validated
        if depth == 0 {
            asset.validate()?;
        }

        let input = self.load_source(&asset.source)?;
        let ctx = RenderCtx {
            renderer: self,
            depth,
            nested: RefCell::new(RenderReport::default()),
        };
        let dispatcher = Dispatcher {
            raster: self.raster.as_ref(),
            batch: self.batch.as_ref(),
            fallback: self.fallback.as_ref(),
            policy: self.opts.fallback,
            layers: &ctx,
        };
        let mut report = RenderReport::default();
        let out = dispatcher.run(input, &asset.ops, &mut report)?;
        let raster = decoded(out, &mut report)?;
        report.absorb(ctx.nested.into_inner());
        tracing::debug!(
            width = raster.width,
            height = raster.height,
            conversions = report.codec_conversions,
            degradations = report.degradations.len(),
            "render finished"
        );
        Ok(Rendered { raster, report })
    }

    fn load_source(&self, source: &AssetSource) -> TesseraResult<ImageBuffer> {
        let raster = match source {
            AssetSource::Source { source } => decode_raster(&self.resolver.resolve(source)?)?,
            AssetSource::Blank {
                width,
                height,
                color,
            } => Raster::filled(*width, *height, color.to_premul())?,
            AssetSource::Raster(raster) => raster.clone(),
        };
        Ok(ImageBuffer::Decoded(raster))
    }
}

struct RenderCtx<'a> {
    renderer: &'a Renderer,
    depth: usize,
    nested: RefCell<RenderReport>,
}

impl LayerContext for RenderCtx<'_> {
    fn loader(&self) -> Loader<'_> {
        Loader::new(self.renderer.resolver.as_ref())
    }

    fn fonts(&self) -> &FontRegistry {
        &self.renderer.fonts
    }

    fn render_nested(&self, asset: &Asset) -> TesseraResult<Raster> {
        let rendered = self.renderer.render_at_depth(asset, self.depth + 1)?;
        self.nested.borrow_mut().absorb(rendered.report);
        Ok(rendered.raster)
    }
}

fn build_thread_pool(threads: Option<usize>) -> TesseraResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TesseraError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/renderer.rs"]
mod tests;
