use std::sync::Mutex;

use super::*;
use crate::assets::{DefaultResolver, Loader};
use crate::compose::Layer;
use crate::foundation::color::Color;
use crate::ops::{Posterize, Sepia, Solarize, Swirl};
use crate::pipeline::Asset;
use crate::text::FontRegistry;

/// Flip and negate only; negate really inverts so tests can see it ran.
struct Flips;

impl RasterBackend for Flips {
    fn name(&self) -> &str {
        "flips"
    }

    fn supports(&self, tag: OpTag) -> bool {
        matches!(tag, OpTag::Flip | OpTag::Negate)
    }

    fn apply(&self, mut raster: Raster, op: &Operation) -> TesseraResult<Raster> {
        if let Operation::Negate = op {
            for px in raster.data.chunks_exact_mut(4) {
                let a = px[3];
                for c in &mut px[..3] {
                    *c = a - *c;
                }
            }
        }
        Ok(raster)
    }
}

enum Outcome {
    Echo,
    Fail,
    Invalid,
}

struct Recording {
    available: bool,
    outcome: Outcome,
    runs: Mutex<Vec<Vec<OpTag>>>,
}

impl Recording {
    fn new(available: bool, outcome: Outcome) -> Self {
        Self {
            available,
            outcome,
            runs: Mutex::new(Vec::new()),
        }
    }

    fn runs(&self) -> Vec<Vec<OpTag>> {
        self.runs.lock().unwrap().clone()
    }
}

impl BatchBackend for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn supports(&self, tag: OpTag) -> bool {
        tag != OpTag::Crop
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn apply_batch(&self, png: &[u8], ops: &[Operation]) -> TesseraResult<Vec<u8>> {
        self.runs
            .lock()
            .unwrap()
            .push(ops.iter().map(Operation::tag).collect());
        match self.outcome {
            Outcome::Echo => Ok(png.to_vec()),
            Outcome::Fail => Err(TesseraError::backend("recording", "segfault in delegate")),
            Outcome::Invalid => Err(TesseraError::validation("sepia", "rejected")),
        }
    }
}

/// Approximates sepia and posterize by leaving pixels alone.
struct Identity;

impl FallbackBackend for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn approximates(&self, tag: OpTag) -> bool {
        matches!(tag, OpTag::Sepia | OpTag::Posterize | OpTag::Solarize)
    }

    fn apply(&self, raster: Raster, _op: &Operation) -> TesseraResult<Raster> {
        Ok(raster)
    }
}

struct Ctx {
    resolver: DefaultResolver,
    fonts: FontRegistry,
}

impl LayerContext for Ctx {
    fn loader(&self) -> Loader<'_> {
        Loader::new(&self.resolver)
    }

    fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    fn render_nested(&self, _asset: &Asset) -> TesseraResult<Raster> {
        Raster::filled(2, 2, [0, 0, 255, 255])
    }
}

fn ctx() -> Ctx {
    Ctx {
        resolver: DefaultResolver::new(),
        fonts: FontRegistry::new(),
    }
}

fn dispatcher<'a>(
    batch: &'a Recording,
    policy: FallbackPolicy,
    layers: &'a Ctx,
) -> Dispatcher<'a> {
    Dispatcher {
        raster: &Flips,
        batch,
        fallback: &Identity,
        policy,
        layers,
    }
}

fn input() -> ImageBuffer {
    ImageBuffer::Decoded(Raster::filled(4, 4, [200, 100, 50, 255]).unwrap())
}

fn sepia() -> Operation {
    Operation::Sepia(Sepia::default())
}

fn posterize() -> Operation {
    Operation::Posterize(Posterize::default())
}

#[test]
fn raster_ops_never_touch_the_codec() {
    let batch = Recording::new(true, Outcome::Echo);
    let layers = ctx();
    let mut report = RenderReport::default();
    let out = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(input(), &[Operation::Flip, Operation::Negate], &mut report)
        .unwrap();
    let ImageBuffer::Decoded(raster) = out else {
        panic!("raster-only pipeline should stay decoded");
    };
    assert_eq!(raster.pixel(0, 0), [55, 155, 205, 255]);
    assert_eq!(report, RenderReport::default());
    assert!(batch.runs().is_empty());
}

#[test]
fn consecutive_batch_ops_form_maximal_runs() {
    let batch = Recording::new(true, Outcome::Echo);
    let layers = ctx();
    let mut report = RenderReport::default();
    let ops = [
        sepia(),
        posterize(),
        Operation::Flip,
        Operation::Swirl(Swirl::default()),
        Operation::Solarize(Solarize::default()),
    ];
    let out = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(input(), &ops, &mut report)
        .unwrap();

    assert_eq!(
        batch.runs(),
        vec![
            vec![OpTag::Sepia, OpTag::Posterize],
            vec![OpTag::Swirl, OpTag::Solarize],
        ]
    );
    assert_eq!(report.batch_invocations, 2);
    // encode, decode for flip, encode again; the last run's output stays encoded
    assert_eq!(report.codec_conversions, 3);
    assert!(matches!(out, ImageBuffer::Encoded(_)));
    assert!(!report.is_degraded());
}

#[test]
fn composite_ops_split_batch_runs() {
    let batch = Recording::new(true, Outcome::Echo);
    let layers = ctx();
    let mut report = RenderReport::default();
    let ops = [
        sepia(),
        Operation::Overlay(Box::new(Layer::new(Asset::blank(2, 2, Color::WHITE)))),
        posterize(),
    ];
    let out = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(input(), &ops, &mut report)
        .unwrap();
    assert_eq!(batch.runs(), vec![vec![OpTag::Sepia], vec![OpTag::Posterize]]);

    let raster = decoded(out, &mut report).unwrap();
    assert_eq!((raster.width, raster.height), (4, 4));
    assert_eq!(raster.pixel(0, 0), [0, 0, 255, 255]);
    assert_eq!(raster.pixel(3, 3), [200, 100, 50, 255]);
}

#[test]
fn unavailable_backend_degrades_each_op() {
    let batch = Recording::new(false, Outcome::Echo);
    let layers = ctx();
    let mut report = RenderReport::default();
    let out = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(input(), &[sepia(), posterize()], &mut report)
        .unwrap();

    assert!(matches!(out, ImageBuffer::Decoded(_)));
    assert!(batch.runs().is_empty());
    assert_eq!(report.batch_invocations, 0);
    assert_eq!(report.codec_conversions, 0);
    let tags: Vec<OpTag> = report.degradations.iter().map(|d| d.op).collect();
    assert_eq!(tags, vec![OpTag::Sepia, OpTag::Posterize]);
    assert!(report.degradations.iter().all(|d| d.backend == "recording"));
    assert!(report.degradations[0].reason.contains("unavailable"));
}

#[test]
fn failed_call_falls_back_with_the_failure_as_reason() {
    let batch = Recording::new(true, Outcome::Fail);
    let layers = ctx();
    let mut report = RenderReport::default();
    let out = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(input(), &[sepia()], &mut report)
        .unwrap();

    let raster = decoded(out, &mut report).unwrap();
    assert_eq!(raster.pixel(1, 1), [200, 100, 50, 255]);
    assert_eq!(report.batch_invocations, 1);
    // encode for the call, decode of the kept input for the fallback
    assert_eq!(report.codec_conversions, 2);
    assert_eq!(report.degradations.len(), 1);
    assert!(report.degradations[0].reason.contains("segfault in delegate"));
}

#[test]
fn strict_policy_surfaces_backend_failures() {
    let layers = ctx();

    let down = Recording::new(false, Outcome::Echo);
    let err = dispatcher(&down, FallbackPolicy::Strict, &layers)
        .run(input(), &[sepia()], &mut RenderReport::default())
        .unwrap_err();
    assert!(matches!(&err, TesseraError::Backend { backend, .. } if backend == "recording"));

    let failing = Recording::new(true, Outcome::Fail);
    let err = dispatcher(&failing, FallbackPolicy::Strict, &layers)
        .run(input(), &[sepia()], &mut RenderReport::default())
        .unwrap_err();
    assert!(err.to_string().contains("segfault in delegate"));
}

#[test]
fn run_without_approximation_fails_naming_the_op() {
    let batch = Recording::new(false, Outcome::Echo);
    let layers = ctx();
    let mut report = RenderReport::default();
    let err = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(input(), &[sepia(), Operation::Swirl(Swirl::default())], &mut report)
        .unwrap_err();
    assert!(err.is_backend_failure());
    assert!(err.to_string().contains("'swirl'"), "{err}");
    assert!(report.degradations.is_empty());
}

#[test]
fn non_backend_errors_are_not_approximated() {
    let batch = Recording::new(true, Outcome::Invalid);
    let layers = ctx();
    let err = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(input(), &[sepia()], &mut RenderReport::default())
        .unwrap_err();
    assert_eq!(err.op_tag(), Some("sepia"));
}

#[test]
fn unsupported_op_is_a_capability_error() {
    let batch = Recording::new(true, Outcome::Echo);
    let layers = ctx();
    let err = dispatcher(&batch, FallbackPolicy::Approximate, &layers)
        .run(
            input(),
            &[Operation::Crop(crate::ops::Crop::default())],
            &mut RenderReport::default(),
        )
        .unwrap_err();
    assert!(matches!(err, TesseraError::Capability { op: "crop" }));
}

#[test]
fn nested_reports_are_summed() {
    let mut outer = RenderReport {
        batch_invocations: 1,
        codec_conversions: 2,
        ..RenderReport::default()
    };
    outer.absorb(RenderReport {
        degradations: vec![Degradation {
            op: OpTag::Sepia,
            backend: "x".into(),
            reason: "down".into(),
        }],
        batch_invocations: 2,
        codec_conversions: 1,
    });
    assert_eq!(outer.batch_invocations, 3);
    assert_eq!(outer.codec_conversions, 3);
    assert!(outer.is_degraded());
}
