use serde::Serialize;

use crate::assets::decode_raster;
use crate::backend::{BatchBackend, FallbackBackend, FallbackPolicy, RasterBackend};
use crate::compose::overlay::{LayerContext, group, overlay};
use crate::encode::{ExportFormat, encode_raster};
use crate::foundation::core::Raster;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::ops::{OpTag, Operation};

/// Working image between pipeline steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBuffer {
    /// PNG bytes, the form the batch backend consumes.
    Encoded(Vec<u8>),
    Decoded(Raster),
}

/// One batch operation that was replaced by an in-process approximation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub op: OpTag,
    /// Batch backend that should have run the operation.
    pub backend: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub degradations: Vec<Degradation>,
    /// Calls made to the batch backend (successful or not).
    pub batch_invocations: usize,
    /// PNG encodes and decodes performed to hand the image between backends.
    pub codec_conversions: usize,
}

impl RenderReport {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub(crate) fn absorb(&mut self, nested: RenderReport) {
        self.degradations.extend(nested.degradations);
        self.batch_invocations += nested.batch_invocations;
        self.codec_conversions += nested.codec_conversions;
    }
}

/// Routes an operation stream over the compositor and the backends.
pub struct Dispatcher<'a> {
    pub raster: &'a dyn RasterBackend,
    pub batch: &'a dyn BatchBackend,
    pub fallback: &'a dyn FallbackBackend,
    pub policy: FallbackPolicy,
    pub layers: &'a dyn LayerContext,
}

enum BatchFailure {
    Unavailable,
    Failed(TesseraError),
}

impl Dispatcher<'_> {
    /// Apply `ops` in order.
    ///
    /// Raster-backend operations run one at a time on the decoded image. An operation only the
    /// batch backend supports starts a run that extends over every following operation that is
    /// batch-supported, not composite and not raster-supported; the run is submitted as one call.
    pub fn run(
        &self,
        input: ImageBuffer,
        ops: &[Operation],
        report: &mut RenderReport,
    ) -> TesseraResult<ImageBuffer> {
        let mut buf = input;
        let mut i = 0;
        while i < ops.len() {
            let op = &ops[i];
            let tag = op.tag();
            match op {
                Operation::Overlay(layer) => {
                    let mut base = decoded(buf, report)?;
                    overlay(&mut base, layer, self.layers)?;
                    buf = ImageBuffer::Decoded(base);
                    i += 1;
                }
                Operation::Group(g) => {
                    let mut base = decoded(buf, report)?;
                    group(&mut base, g, self.layers)?;
                    buf = ImageBuffer::Decoded(base);
                    i += 1;
                }
                _ if self.raster.supports(tag) => {
                    tracing::debug!(op = %tag, backend = self.raster.name(), "raster op");
                    let raster = decoded(buf, report)?;
                    buf = ImageBuffer::Decoded(self.raster.apply(raster, op)?);
                    i += 1;
                }
                _ if self.batch.supports(tag) => {
                    let end = self.batch_run_end(ops, i);
                    buf = self.run_batch(buf, &ops[i..end], report)?;
                    i = end;
                }
                _ => return Err(TesseraError::capability(tag.as_str())),
            }
        }
        Ok(buf)
    }

    fn batch_run_end(&self, ops: &[Operation], start: usize) -> usize {
        let mut end = start + 1;
        while let Some(op) = ops.get(end) {
            let tag = op.tag();
            if op.is_composite() || self.raster.supports(tag) || !self.batch.supports(tag) {
                break;
            }
            end += 1;
        }
        end
    }

    fn run_batch(
        &self,
        buf: ImageBuffer,
        run: &[Operation],
        report: &mut RenderReport,
    ) -> TesseraResult<ImageBuffer> {
        let name = self.batch.name();
        let (buf, failure) = if self.batch.is_available() {
            let png = encoded(buf, report)?;
            report.batch_invocations += 1;
            tracing::debug!(backend = name, ops = run.len(), "batch run");
            match self.batch.apply_batch(&png, run) {
                Ok(out) => return Ok(ImageBuffer::Encoded(out)),
                Err(e) if e.is_backend_failure() => {
                    (ImageBuffer::Encoded(png), BatchFailure::Failed(e))
                }
                Err(e) => return Err(e),
            }
        } else {
            (buf, BatchFailure::Unavailable)
        };

        let reason = match &failure {
            BatchFailure::Unavailable => format!("batch backend '{name}' is unavailable"),
            BatchFailure::Failed(e) => e.to_string(),
        };
        if self.policy == FallbackPolicy::Strict {
            return Err(match failure {
                BatchFailure::Unavailable => TesseraError::backend(name, "backend is unavailable"),
                BatchFailure::Failed(e) => e,
            });
        }
        if let Some(op) = run.iter().find(|op| !self.fallback.approximates(op.tag())) {
            return Err(TesseraError::backend(
                name,
                format!("{reason}; no in-process approximation for '{}'", op.tag()),
            ));
        }

        let mut raster = decoded(buf, report)?;
        for op in run {
            let tag = op.tag();
            tracing::warn!(
                op = %tag,
                backend = name,
                reason = %reason,
                "approximating batch operation"
            );
            raster = self.fallback.apply(raster, op)?;
            report.degradations.push(Degradation {
                op: tag,
                backend: name.to_owned(),
                reason: reason.clone(),
            });
        }
        Ok(ImageBuffer::Decoded(raster))
    }
}

/// Decoded form of `buf`, counting a conversion when it was encoded.
pub(crate) fn decoded(buf: ImageBuffer, report: &mut RenderReport) -> TesseraResult<Raster> {
    match buf {
        ImageBuffer::Decoded(raster) => Ok(raster),
        ImageBuffer::Encoded(bytes) => {
            report.codec_conversions += 1;
            decode_raster(&bytes)
        }
    }
}

fn encoded(buf: ImageBuffer, report: &mut RenderReport) -> TesseraResult<Vec<u8>> {
    match buf {
        ImageBuffer::Encoded(bytes) => Ok(bytes),
        ImageBuffer::Decoded(raster) => {
            report.codec_conversions += 1;
            encode_raster(&raster, ExportFormat::Png)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/dispatch.rs"]
mod tests;
